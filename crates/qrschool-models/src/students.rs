//! Student profile models.

use qrschool_core::serde::deserialize_flexible_id;
use serde::{Deserialize, Serialize};

/// Profile of the signed-in student, from `GET /api/student/profile/`.
///
/// Fetched once per session and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    #[serde(deserialize_with = "deserialize_flexible_id")]
    pub student_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
    /// Reference to a QR image rendered by the backend, when it has one.
    #[serde(default)]
    pub qr_code: Option<String>,
    #[serde(default)]
    pub level: Option<i64>,
}

/// What the QR panel should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrPayload {
    /// Image reference provided by the backend.
    Stored(String),
    /// Text to encode client-side.
    Generated(String),
}

impl StudentProfile {
    pub fn qr_payload(&self) -> QrPayload {
        if let Some(stored) = self.qr_code.as_deref().filter(|s| !s.is_empty()) {
            return QrPayload::Stored(stored.to_string());
        }
        let email = self.email.as_deref().filter(|e| !e.is_empty()).unwrap_or("N/A");
        QrPayload::Generated(format!(
            "Student ID: {}\nName: {}\nEmail: {}",
            self.student_id, self.name, email
        ))
    }
}
