//! # QRSchool Config
//!
//! Configuration types for the qrschool client, loaded from environment variables:
//!
//! - [`api`]: backend REST and WebSocket endpoints
//! - [`sync`]: retry, reconnect and notification tuning for the attendance sync
//! - [`storage`]: where the session tokens are persisted
//!
//! # Example
//!
//! ```ignore
//! use qrschool_config::{ApiConfig, StorageConfig, SyncConfig};
//!
//! let api = ApiConfig::from_env();
//! let sync = SyncConfig::from_env();
//! let storage = StorageConfig::from_env();
//! ```

pub mod api;
pub mod storage;
pub mod sync;

pub use api::ApiConfig;
pub use storage::StorageConfig;
pub use sync::{ReconnectConfig, SyncConfig};

pub(crate) fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
