//! Schedule models.
//!
//! The backend serves the timetable as three independent resources: raw
//! schedule items referencing subjects and teachers by numeric id, a subject
//! catalog and a teacher catalog. [`ScheduleSlot::resolve`] joins them into the
//! display form. A lookup miss never fails the join; the slot carries
//! [`UNKNOWN_SUBJECT`] or [`UNKNOWN_TEACHER`] instead.

use std::collections::HashMap;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

pub const UNKNOWN_SUBJECT: &str = "Unknown Subject";
pub const UNKNOWN_TEACHER: &str = "Unknown Teacher";

/// One row of `GET /api/student/schedule/`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScheduleItem {
    pub id: i64,
    pub day: String,
    pub subject: i64,
    pub start_time: String,
    pub end_time: String,
    #[serde(rename = "Teacher", alias = "teacher")]
    pub teacher: i64,
    #[serde(default)]
    pub classe: Option<i64>,
    #[serde(default)]
    pub level: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Subject {
    pub id: i64,
    #[serde(alias = "nom")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Teacher {
    pub id: i64,
    #[serde(rename = "firstName", alias = "first_name", alias = "prenom", default)]
    pub first_name: String,
    #[serde(rename = "lastName", alias = "last_name", alias = "nom", default)]
    pub last_name: String,
}

impl Teacher {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// A class occurrence ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleSlot {
    pub id: String,
    pub subject_name: String,
    /// Upper-case day code as sent by the backend (`MON` .. `FRI`).
    pub day: String,
    /// `HH:MM`
    pub start_time: String,
    /// `HH:MM`
    pub end_time: String,
    pub teacher_name: String,
    pub class_id: Option<i64>,
}

impl ScheduleSlot {
    /// Join a raw item against the subject and teacher lookups.
    pub fn resolve(
        item: &ScheduleItem,
        subjects: &HashMap<i64, String>,
        teachers: &HashMap<i64, String>,
    ) -> Self {
        let subject_name = subjects
            .get(&item.subject)
            .filter(|name| !name.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| UNKNOWN_SUBJECT.to_string());
        let teacher_name = teachers
            .get(&item.teacher)
            .filter(|name| !name.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| UNKNOWN_TEACHER.to_string());

        Self {
            id: item.id.to_string(),
            subject_name,
            day: item.day.trim().to_uppercase(),
            start_time: clock_minutes(&item.start_time),
            end_time: clock_minutes(&item.end_time),
            teacher_name,
            class_id: item.classe,
        }
    }

    pub fn weekday(&self) -> Option<Weekday> {
        self.day.parse().ok()
    }
}

/// `08:30:00` -> `08:30`
fn clock_minutes(time: &str) -> String {
    time.trim().chars().take(5).collect()
}

pub fn subject_lookup(subjects: &[Subject]) -> HashMap<i64, String> {
    subjects.iter().map(|s| (s.id, s.name.trim().to_string())).collect()
}

pub fn teacher_lookup(teachers: &[Teacher]) -> HashMap<i64, String> {
    teachers.iter().map(|t| (t.id, t.display_name())).collect()
}
