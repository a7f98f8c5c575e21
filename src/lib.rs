//! # QRSchool
//!
//! Client-side attendance sync for the QRSchool student app. A student signs
//! in, shows their QR code to be scanned, and sees their weekly attendance
//! update live as teachers mark it.
//!
//! ## Overview
//!
//! All business logic lives in the school backend. This crate composes the
//! pieces the student screen depends on:
//!
//! - **Session**: cached access token with refresh, persisted across restarts
//! - **Profile**: the signed-in student and their QR payload
//! - **Schedule**: schedule items joined with the subject and teacher catalogs
//! - **Attendance**: REST snapshot plus realtime WebSocket pushes
//! - **Notifications**: a local notification for every applied push
//!
//! ## Architecture
//!
//! ```text
//! crates/
//! ├── qrschool-core/           # SyncError taxonomy, serde helpers
//! ├── qrschool-config/         # API, sync and storage configuration
//! ├── qrschool-models/         # Wire DTOs, attendance map, event parsing
//! ├── qrschool-auth/           # Token store, JWT expiry, SessionProvider
//! └── qrschool-observability/  # tracing subscriber setup
//! src/
//! ├── cli/                     # `qrschool` commands
//! ├── client/                  # REST client and attendance feed
//! ├── sync/                    # Staged pipeline and live channel loop
//! ├── notify.rs                # Best-effort notification dispatch
//! └── view.rs                  # Weekly attendance view
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! Idle → TokenReady → ProfileLoaded → ScheduleLoaded → Live
//! ```
//!
//! The token is resolved before any protected fetch. The realtime channel
//! opens only after the schedule is assembled, because pushed events are
//! resolved against its slots. Every applied event bumps a version counter
//! and triggers a reconciling snapshot fetch.
//!
//! ## Quick Start
//!
//! ```bash
//! QRSCHOOL_API_URL=http://localhost:8000
//! QRSCHOOL_WS_URL=ws://localhost:8000/ws/attendance/
//!
//! qrschool login --username amina --role student
//! qrschool week
//! qrschool watch
//! ```
//!
//! ## Modules
//!
//! - [`cli`]: Command-line interface
//! - [`client`]: Typed REST client and realtime feed
//! - [`notify`]: Notification text and dispatch
//! - [`sync`]: Attendance sync controller
//! - [`view`]: Weekly view model

pub mod cli;
pub mod client;
pub mod notify;
pub mod sync;
pub mod view;

// Re-export workspace crates for convenience
pub use qrschool_auth;
pub use qrschool_config;
pub use qrschool_core;
pub use qrschool_models;
