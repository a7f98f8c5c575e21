//! # QRSchool Auth
//!
//! Session handling for the attendance client.
//!
//! - [`claims`]: read the expiry of an access token without verifying it
//! - [`store`]: the [`TokenStore`] seam with file-backed and in-memory stores
//! - [`session`]: the [`SessionProvider`] that hands out a valid access token,
//!   refreshing it through the [`AuthApi`] seam when needed
//!
//! # Token Lifecycle
//!
//! ```text
//! login ──► store(access, refresh, role)
//!             │
//! get_valid_token ── access present & not expiring ──► access
//!             │
//!             └─ absent/expiring ── refresh token? ── yes ─► POST /api/token/refresh/
//!                                         │                    └─► persist ─► access
//!                                         └─ no / refresh fails ─► SyncError::Auth
//! ```
//!
//! # Example
//!
//! ```ignore
//! use qrschool_auth::{FileTokenStore, SessionProvider};
//!
//! let store = FileTokenStore::new(&storage_config.token_path);
//! let session = SessionProvider::new(store, api.clone(), sync_config.token_leeway());
//! let token = session.get_valid_token().await?;
//! ```

pub mod claims;
pub mod session;
pub mod store;

pub use claims::{AccessClaims, inspect_access_token, is_expiring};
pub use session::{AuthApi, SessionProvider};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
