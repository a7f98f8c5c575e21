//! Weekly attendance view.
//!
//! Groups the schedule by weekday for the current school week and resolves
//! each slot's status from the attendance map.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use qrschool_models::{AttendanceKey, AttendanceMap, AttendanceStatus, ScheduleSlot};

const SCHOOL_DAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

/// Monday to Friday of the week containing `today`. Weekends belong to the
/// week that started on the preceding Monday.
pub fn week_dates(today: NaiveDate) -> [NaiveDate; 5] {
    let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    let mut dates = [monday; 5];
    for (offset, date) in dates.iter_mut().enumerate() {
        *date = monday + Duration::days(offset as i64);
    }
    dates
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotView {
    pub slot: ScheduleSlot,
    pub key: AttendanceKey,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayView {
    pub weekday: Weekday,
    pub date: NaiveDate,
    pub slots: Vec<SlotView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekView {
    pub days: Vec<DayView>,
}

impl WeekView {
    /// Slots whose day code is not a school day are left out.
    pub fn build(today: NaiveDate, schedule: &[ScheduleSlot], attendance: &AttendanceMap) -> Self {
        let days = SCHOOL_DAYS
            .iter()
            .zip(week_dates(today))
            .map(|(&weekday, date)| {
                let iso = date.format("%Y-%m-%d").to_string();
                let mut slots: Vec<SlotView> = schedule
                    .iter()
                    .filter(|slot| slot.weekday() == Some(weekday))
                    .map(|slot| {
                        let key = AttendanceKey::new(&iso, &slot.id);
                        SlotView {
                            status: attendance.status(&key),
                            slot: slot.clone(),
                            key,
                        }
                    })
                    .collect();
                slots.sort_by(|a, b| a.slot.start_time.cmp(&b.slot.start_time));
                DayView {
                    weekday,
                    date,
                    slots,
                }
            })
            .collect();
        Self { days }
    }

    pub fn day(&self, weekday: Weekday) -> Option<&DayView> {
        self.days.iter().find(|d| d.weekday == weekday)
    }
}

impl fmt::Display for WeekView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for day in &self.days {
            writeln!(f, "{} {}", day.weekday, day.date.format("%Y-%m-%d"))?;
            if day.slots.is_empty() {
                writeln!(f, "  (no classes)")?;
            }
            for view in &day.slots {
                writeln!(
                    f,
                    "  {}-{}  {:<24} {:<24} {}",
                    view.slot.start_time,
                    view.slot.end_time,
                    view.slot.subject_name,
                    view.slot.teacher_name,
                    view.status.display_label()
                )?;
            }
        }
        Ok(())
    }
}
