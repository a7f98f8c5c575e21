//! Attendance models.
//!
//! [`AttendanceStatus`] is the closed set the client stores and emits. Backend
//! codes are normalised on the way in by [`AttendanceStatus::normalize`].
//!
//! [`AttendanceMap`] keeps one invariant: a key is present only for a known,
//! non-default status. [`AttendanceStatus::Unset`] is never stored; applying it
//! removes the key.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    /// Scanned but awaiting teacher verification.
    Pending,
    Unset,
}

impl AttendanceStatus {
    /// Map a backend status code onto the canonical set.
    ///
    /// `retard` is the backend's code for late and `att` its code for pending.
    /// Missing or unrecognised codes become [`AttendanceStatus::Unset`].
    pub fn normalize(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Unset;
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "present" => Self::Present,
            "absent" => Self::Absent,
            "retard" | "late" => Self::Late,
            "att" | "pending" => Self::Pending,
            _ => Self::Unset,
        }
    }

    /// Code the backend uses for this status.
    pub fn wire_code(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Late => "retard",
            Self::Pending => "att",
            Self::Unset => "not_set",
        }
    }

    /// Upper-case label used in notification text.
    pub fn notification_label(&self) -> &'static str {
        match self {
            Self::Present => "PRESENT",
            Self::Absent => "ABSENT",
            Self::Late => "LATE",
            Self::Pending => "PENDING",
            Self::Unset => "NOT SET",
        }
    }

    pub fn display_label(&self) -> &'static str {
        match self {
            Self::Present => "Present",
            Self::Absent => "Absent",
            Self::Late => "Late",
            Self::Pending => "Pending verification",
            Self::Unset => "Not set",
        }
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, Self::Unset)
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_label())
    }
}

/// Address of one attendance entry: `<date>-<scheduleSlotId>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttendanceKey(String);

impl AttendanceKey {
    pub fn new(date: &str, slot_id: &str) -> Self {
        Self(format!("{}-{}", date.trim(), slot_id.trim()))
    }

    /// Wrap a key already rendered by the backend.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttendanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AttendanceMap(BTreeMap<AttendanceKey, AttendanceStatus>);

impl AttendanceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalise a snapshot from `GET /api/student/attendance/`.
    ///
    /// Entries that normalise to unset are dropped.
    pub fn from_wire(raw: HashMap<String, String>) -> Self {
        let mut map = Self::new();
        for (key, status) in raw {
            map.apply(
                AttendanceKey::from_raw(key),
                AttendanceStatus::normalize(Some(&status)),
            );
        }
        map
    }

    /// Upsert `status`, or remove the key when `status` is unset.
    ///
    /// Returns whether the map changed.
    pub fn apply(&mut self, key: AttendanceKey, status: AttendanceStatus) -> bool {
        if status.is_set() {
            self.0.insert(key, status) != Some(status)
        } else {
            self.0.remove(&key).is_some()
        }
    }

    /// Status for `key`; absent keys read as unset.
    pub fn status(&self, key: &AttendanceKey) -> AttendanceStatus {
        self.0.get(key).copied().unwrap_or(AttendanceStatus::Unset)
    }

    pub fn get(&self, key: &AttendanceKey) -> Option<AttendanceStatus> {
        self.0.get(key).copied()
    }

    pub fn contains(&self, key: &AttendanceKey) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AttendanceKey, &AttendanceStatus)> {
        self.0.iter()
    }
}
