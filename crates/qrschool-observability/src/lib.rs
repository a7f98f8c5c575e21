//! QRSchool Observability
//!
//! Logging setup for the qrschool binary. Library crates only emit `tracing`
//! events; this crate decides where they go.
//!
//! # Configuration
//!
//! - `RUST_LOG`: full filter directive, takes precedence when set
//! - `LOG_LEVEL`: level for the qrschool crates (default: "info")
//! - `LOG_FORMAT`: `compact` (default) or `json`
//! - `LOG_DIR`: when set, JSON logs are also written to a daily rolling file there
//!
//! # Examples
//!
//! ```no_run
//! use qrschool_observability::{LogSettings, init_logging};
//!
//! let _guard = init_logging(&LogSettings::from_env()).expect("logging initialised once");
//! tracing::info!("ready");
//! ```

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_PREFIX: &str = "qrschool.json";
const CRATE_PREFIX: &str = "qrschool";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
    pub format: LogFormat,
    pub log_dir: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Compact,
            log_dir: None,
        }
    }
}

impl LogSettings {
    pub fn from_env() -> Self {
        let format = match std::env::var("LOG_FORMAT").as_deref() {
            Ok("json") | Ok("JSON") => LogFormat::Json,
            _ => LogFormat::Compact,
        };
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format,
            log_dir: std::env::var("LOG_DIR")
                .ok()
                .filter(|d| !d.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    /// Default filter: our crates at `level`, noisy transport crates at warn.
    ///
    /// Target directives match by prefix, so `qrschool` covers every
    /// `qrschool_*` crate.
    pub fn default_directive(&self) -> String {
        let level = &self.level;
        format!(
            "{CRATE_PREFIX}={level},\
             reqwest=warn,hyper=warn,hyper_util=warn,tungstenite=warn,tokio_tungstenite=warn"
        )
    }
}

/// Install the global subscriber.
///
/// Hold the returned guard for the lifetime of the process when a log
/// directory is configured; dropping it flushes and stops the file writer.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(settings: &LogSettings) -> Result<Option<WorkerGuard>, TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.default_directive()));

    let json = settings.format == LogFormat::Json;

    let compact_layer = (!json).then(|| {
        fmt::layer()
            .compact()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
    });

    let json_layer = json.then(|| {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr)
    });

    let (file_layer, guard) = match &settings.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(compact_layer)
        .with(json_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}
