//! Schedule Event Model
//!
//! Weekly teaching grid entries, keyed by weekday name.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::RecordValidationError;

static TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[01][0-9]|2[0-3]):[0-5][0-9]$").expect("time pattern is valid"));

/// Weekday name to the events held that day
pub type WeeklySchedule = BTreeMap<String, Vec<ScheduleEvent>>;

/// One slot in the weekly grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEvent {
    pub id: i64,
    pub title: String,
    /// Class code, or `ALL` for office hours
    #[serde(rename = "class")]
    pub class_code: String,
    pub room: String,
    /// `HH:MM`
    pub start_time: String,
    /// `HH:MM`
    pub end_time: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub students: u32,
    #[serde(default)]
    pub color: String,
}

impl ScheduleEvent {
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.title.trim().is_empty() {
            return Err(RecordValidationError::MissingField("title"));
        }

        for time in [&self.start_time, &self.end_time] {
            if !TIME_PATTERN.is_match(time) {
                return Err(RecordValidationError::InvalidTime(time.clone()));
            }
        }

        // zero-padded HH:MM compares correctly as text
        if self.end_time <= self.start_time {
            return Err(RecordValidationError::EndBeforeStart {
                start: self.start_time.clone(),
                end: self.end_time.clone(),
            });
        }

        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn event(
    id: i64,
    title: &str,
    class_code: &str,
    room: &str,
    start_time: &str,
    end_time: &str,
    event_type: &str,
    students: u32,
    color: &str,
) -> ScheduleEvent {
    ScheduleEvent {
        id,
        title: title.to_string(),
        class_code: class_code.to_string(),
        room: room.to_string(),
        start_time: start_time.to_string(),
        end_time: end_time.to_string(),
        event_type: event_type.to_string(),
        students,
        color: color.to_string(),
    }
}

/// Schedule shipped with the dashboard
pub fn default_schedule() -> WeeklySchedule {
    let mut schedule = WeeklySchedule::new();
    schedule.insert(
        "Monday".to_string(),
        vec![
            event(1, "Computer Science 101", "CS101", "Room A-204", "09:00", "10:30", "lecture", 45, "bg-blue-500"),
            event(2, "Data Structures Lab", "DS201", "Lab B-105", "14:00", "16:00", "lab", 30, "bg-green-500"),
        ],
    );
    schedule.insert(
        "Tuesday".to_string(),
        vec![event(3, "Algorithms", "ALG301", "Room C-301", "10:00", "11:30", "lecture", 52, "bg-purple-500")],
    );
    schedule.insert(
        "Wednesday".to_string(),
        vec![
            event(4, "Computer Science 101", "CS101", "Room A-204", "09:00", "10:30", "lecture", 45, "bg-blue-500"),
            event(5, "Office Hours", "ALL", "Office 205", "15:00", "17:00", "office", 0, "bg-gray-500"),
        ],
    );
    schedule.insert(
        "Thursday".to_string(),
        vec![event(6, "Data Structures", "DS201", "Room B-203", "11:00", "12:30", "lecture", 38, "bg-green-500")],
    );
    schedule.insert(
        "Friday".to_string(),
        vec![
            event(7, "Algorithms", "ALG301", "Room C-301", "10:00", "11:30", "lecture", 52, "bg-purple-500"),
            event(8, "Data Structures Lab", "DS201", "Lab B-105", "14:00", "16:00", "lab", 30, "bg-green-500"),
        ],
    );
    schedule
}
