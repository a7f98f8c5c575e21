//! # QRSchool Core
//!
//! Core types shared by every qrschool crate.
//!
//! - [`errors`]: the [`SyncError`] taxonomy used across session, REST and realtime code
//! - [`serde`]: deserialisation helpers for identifiers the backend sends as numbers or strings
//!
//! # Example
//!
//! ```ignore
//! use qrschool_core::{ErrorKind, SyncError};
//!
//! let err = SyncError::network("schedule fetch", Some(503), "service unavailable");
//! assert_eq!(err.kind(), ErrorKind::Network);
//! assert!(err.is_retryable());
//! ```

pub mod errors;
pub mod serde;

pub use errors::{ErrorKind, SyncError};
