//! # QRSchool Models
//!
//! Data structures exchanged with the school backend and held by the
//! attendance sync.
//!
//! # Modules
//!
//! - [`auth`]: login/refresh DTOs and the persisted [`Session`]
//! - [`students`]: the signed-in [`StudentProfile`] and its QR payload
//! - [`schedule`]: raw schedule items, subject/teacher catalogs and the merged [`ScheduleSlot`]
//! - [`attendance`]: the canonical [`AttendanceStatus`] set and the [`AttendanceMap`]
//! - [`events`]: realtime [`AttendanceEvent`] parsing and validation

pub mod attendance;
pub mod auth;
pub mod events;
pub mod schedule;
pub mod students;

pub use attendance::{AttendanceKey, AttendanceMap, AttendanceStatus};
pub use auth::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, Role, Session};
pub use events::{ATTENDANCE_UPDATE, AttendanceEvent, EventRejection};
pub use schedule::{ScheduleItem, ScheduleSlot, Subject, Teacher, UNKNOWN_SUBJECT, UNKNOWN_TEACHER};
pub use students::{QrPayload, StudentProfile};
