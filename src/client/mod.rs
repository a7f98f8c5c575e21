//! Backend access.
//!
//! - [`rest`]: typed JSON client for the student REST endpoints
//! - [`realtime`]: the attendance WebSocket feed
//!
//! The sync pipeline only sees the [`StudentApi`] and [`AttendanceFeed`]
//! traits, so tests can drive it with scripted fakes.

pub mod realtime;
pub mod rest;

use std::collections::HashMap;
use std::future::Future;

use qrschool_core::SyncError;
use qrschool_models::{ScheduleItem, StudentProfile, Subject, Teacher};

pub use realtime::{AttendanceFeed, FeedConnection, WsConnection, WsFeed};
pub use rest::ApiClient;

/// Attendance snapshot as served: `<date>-<slotId>` to backend status code.
pub type RawAttendance = HashMap<String, String>;

/// Protected student endpoints. Every call takes the bearer token.
pub trait StudentApi: Send + Sync + 'static {
    /// `GET /api/student/profile/`
    fn fetch_profile(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<StudentProfile, SyncError>> + Send;

    /// `GET /api/student/attendance/`
    fn fetch_attendance(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<RawAttendance, SyncError>> + Send;

    /// `GET /api/student/schedule/`
    fn fetch_schedule_items(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Vec<ScheduleItem>, SyncError>> + Send;

    /// `GET /api/student/subjects/`
    fn fetch_subjects(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Vec<Subject>, SyncError>> + Send;

    /// `GET /api/student/teachers/`
    fn fetch_teachers(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Vec<Teacher>, SyncError>> + Send;
}
