//! Backend endpoint configuration.
//!
//! # Environment Variables
//!
//! - `QRSCHOOL_API_URL`: REST base URL (default: `http://localhost:8000`)
//! - `QRSCHOOL_WS_URL`: attendance WebSocket URL (default: `ws://localhost:8000/ws/attendance/`)
//! - `QRSCHOOL_REQUEST_TIMEOUT_SECS`: per-request timeout (default: 15)
//!
//! An Android emulator reaches the host machine through `10.0.2.2`, so a
//! device build would point both URLs there.

use std::env;
use std::time::Duration;

use crate::env_or;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_WS_URL: &str = "ws://localhost:8000/ws/attendance/";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    /// REST base URL, without a trailing path.
    pub base_url: String,

    /// WebSocket endpoint for attendance pushes. The access token is appended
    /// as a `token` query parameter at connect time.
    pub ws_url: String,

    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.into(),
            ws_url: DEFAULT_WS_URL.into(),
            request_timeout_secs: 15,
        }
    }
}

impl ApiConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("QRSCHOOL_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into()),
            ws_url: env::var("QRSCHOOL_WS_URL").unwrap_or_else(|_| DEFAULT_WS_URL.into()),
            request_timeout_secs: env_or("QRSCHOOL_REQUEST_TIMEOUT_SECS", 15),
        }
    }

    /// Point both endpoints at another host, keeping the default paths.
    #[must_use]
    pub fn for_host(host: &str, secure: bool) -> Self {
        let (http, ws) = if secure { ("https", "wss") } else { ("http", "ws") };
        Self {
            base_url: format!("{http}://{host}"),
            ws_url: format!("{ws}://{host}/ws/attendance/"),
            ..Self::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
