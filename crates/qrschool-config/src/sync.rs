//! Attendance sync tuning.
//!
//! # Environment Variables
//!
//! - `SCHEDULE_MAX_ATTEMPTS`: attempts for the schedule batch (default: 3)
//! - `SCHEDULE_RETRY_DELAY_MS`: fixed pause between attempts (default: 2000)
//! - `NOTIFY_TIMEOUT_MS`: upper bound for a single notification request (default: 2000)
//! - `TOKEN_EXPIRY_LEEWAY_SECS`: access tokens expiring within this window are refreshed (default: 30)
//! - `REALTIME_RECONNECT_ATTEMPTS`: reconnects after the channel closes (default: 0, closure is final)
//! - `REALTIME_RECONNECT_BASE_MS`: first reconnect delay, doubled per attempt (default: 1000)
//! - `REALTIME_RECONNECT_MAX_MS`: reconnect delay cap (default: 30000)

use std::time::Duration;

use crate::env_or;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    pub schedule_max_attempts: u32,
    pub schedule_retry_delay_ms: u64,
    pub notify_timeout_ms: u64,
    pub token_leeway_secs: u64,
    pub reconnect: ReconnectConfig,
}

/// Exponential backoff bounds for the realtime channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Zero keeps a closed channel closed for the rest of the session.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            schedule_max_attempts: 3,
            schedule_retry_delay_ms: 2000,
            notify_timeout_ms: 2000,
            token_leeway_secs: 30,
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}

impl SyncConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            schedule_max_attempts: env_or("SCHEDULE_MAX_ATTEMPTS", 3),
            schedule_retry_delay_ms: env_or("SCHEDULE_RETRY_DELAY_MS", 2000),
            notify_timeout_ms: env_or("NOTIFY_TIMEOUT_MS", 2000),
            token_leeway_secs: env_or("TOKEN_EXPIRY_LEEWAY_SECS", 30),
            reconnect: ReconnectConfig {
                max_attempts: env_or("REALTIME_RECONNECT_ATTEMPTS", 0),
                base_delay_ms: env_or("REALTIME_RECONNECT_BASE_MS", 1000),
                max_delay_ms: env_or("REALTIME_RECONNECT_MAX_MS", 30_000),
            },
        }
    }

    pub fn schedule_retry_delay(&self) -> Duration {
        Duration::from_millis(self.schedule_retry_delay_ms)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_millis(self.notify_timeout_ms)
    }

    pub fn token_leeway(&self) -> Duration {
        Duration::from_secs(self.token_leeway_secs)
    }
}

impl ReconnectConfig {
    pub fn enabled(&self) -> bool {
        self.max_attempts > 0
    }

    /// Delay before reconnect number `attempt` (zero-based): `base * 2^attempt`, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let millis = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(millis)
    }
}
