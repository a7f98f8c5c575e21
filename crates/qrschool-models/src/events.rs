//! Realtime attendance events.
//!
//! The backend pushes
//! `{ "type": "attendance_update", "studentId", "scheduleId", "date", "status" }`
//! to every subscriber of the attendance feed. The feed is shared, so a
//! payload is only accepted when its `studentId` matches the signed-in student.

use qrschool_core::SyncError;
use qrschool_core::serde::deserialize_optional_flexible_id;
use serde::Deserialize;

use crate::attendance::{AttendanceKey, AttendanceStatus};

pub const ATTENDANCE_UPDATE: &str = "attendance_update";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventRejection {
    #[error("malformed event payload: {0}")]
    Malformed(String),

    #[error("unexpected event type {0:?}")]
    WrongType(Option<String>),

    #[error("event is missing {0}")]
    MissingField(&'static str),

    /// Addressed to a different student.
    #[error("event addressed to another student")]
    ForeignStudent,
}

impl From<EventRejection> for SyncError {
    fn from(rejection: EventRejection) -> Self {
        SyncError::Validation(rejection.to_string())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_flexible_id")]
    student_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_flexible_id")]
    schedule_id: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// A validated attendance update for the current student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceEvent {
    pub student_id: String,
    pub schedule_id: String,
    pub date: String,
    /// Normalised status; unrecognised codes are already [`AttendanceStatus::Unset`].
    pub status: AttendanceStatus,
    /// Status exactly as received.
    pub raw_status: Option<String>,
}

impl AttendanceEvent {
    /// Parse and validate one feed message for `current_student_id`.
    pub fn parse(text: &str, current_student_id: &str) -> Result<Self, EventRejection> {
        let raw: RawEvent =
            serde_json::from_str(text).map_err(|e| EventRejection::Malformed(e.to_string()))?;

        if raw.kind.as_deref() != Some(ATTENDANCE_UPDATE) {
            return Err(EventRejection::WrongType(raw.kind));
        }
        let student_id = raw.student_id.ok_or(EventRejection::MissingField("studentId"))?;
        let schedule_id = raw
            .schedule_id
            .ok_or(EventRejection::MissingField("scheduleId"))?;
        let date = raw
            .date
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .ok_or(EventRejection::MissingField("date"))?;

        if student_id != current_student_id.trim() {
            return Err(EventRejection::ForeignStudent);
        }

        Ok(Self {
            status: AttendanceStatus::normalize(raw.status.as_deref()),
            raw_status: raw.status,
            student_id,
            schedule_id,
            date,
        })
    }

    pub fn key(&self) -> AttendanceKey {
        AttendanceKey::new(&self.date, &self.schedule_id)
    }
}
