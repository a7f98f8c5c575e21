//! Error taxonomy for the attendance client.
//!
//! Every fallible operation in the workspace returns [`SyncError`]. The
//! [`ErrorKind`] of an error decides how the caller reacts: authentication
//! failures end the session, network failures are retried or surfaced as a
//! banner, validation failures are logged and dropped, notification failures
//! are swallowed.

use std::fmt;

/// Coarse classification of a [`SyncError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Auth,
    Network,
    Validation,
    Notification,
    Storage,
    Config,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Auth => "auth",
            Self::Network => "network",
            Self::Validation => "validation",
            Self::Notification => "notification",
            Self::Storage => "storage",
            Self::Config => "config",
            Self::Internal => "internal",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SyncError {
    /// No usable tokens. The user has to sign in again.
    #[error("authentication required: {0}")]
    Auth(String),

    /// Transport failure or non-success HTTP status.
    #[error("{operation} failed{}: {detail}", .status.map(|s| format!(" with status {s}")).unwrap_or_default())]
    Network {
        operation: &'static str,
        status: Option<u16>,
        detail: String,
    },

    /// Payload that does not match the expected shape.
    #[error("invalid payload: {0}")]
    Validation(String),

    #[error("notification failed: {0}")]
    Notification(String),

    /// Token store read/write failure.
    #[error("token storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// A retried operation ran out of attempts.
    #[error("{operation} failed after {attempts} attempts: {last}")]
    Exhausted {
        operation: &'static str,
        attempts: u32,
        #[source]
        last: Box<SyncError>,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl SyncError {
    pub fn network(operation: &'static str, status: Option<u16>, detail: impl Into<String>) -> Self {
        Self::Network {
            operation,
            status,
            detail: detail.into(),
        }
    }

    pub fn auth(detail: impl Into<String>) -> Self {
        Self::Auth(detail.into())
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::Validation(detail.into())
    }

    pub fn storage(detail: impl Into<String>) -> Self {
        Self::Storage(detail.into())
    }

    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config(detail.into())
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal(detail.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(_) => ErrorKind::Auth,
            Self::Network { .. } => ErrorKind::Network,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Notification(_) => ErrorKind::Notification,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Config(_) => ErrorKind::Config,
            Self::Exhausted { last, .. } => last.kind(),
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Only transient transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// HTTP status of the underlying failure, if there was a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Network { status, .. } => *status,
            Self::Exhausted { last, .. } => last.status(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(err.to_string())
    }
}
