//! Announcement Model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::models::RecordValidationError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

/// A message sent to one class or to all of them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: i64,
    pub title: String,
    pub message: String,
    /// general, assignment, schedule or material
    #[serde(rename = "type")]
    pub kind: String,
    /// Class code or `all`
    pub target_class: String,
    #[serde(default)]
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub status: String,
    pub recipients: u32,
}

impl Announcement {
    /// Title and message are required
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.title.trim().is_empty() {
            return Err(RecordValidationError::MissingField("title"));
        }
        if self.message.trim().is_empty() {
            return Err(RecordValidationError::MissingField("message"));
        }
        Ok(())
    }

    pub fn targets_all(&self) -> bool {
        self.target_class.eq_ignore_ascii_case("all")
    }
}

/// Search and filter criteria for the announcements list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementFilter {
    /// Case-insensitive match on title or message
    #[serde(default)]
    pub search: Option<String>,
    /// Exact announcement type, `all` or absent for any
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Class code; announcements sent to every class always match
    #[serde(default)]
    pub class: Option<String>,
}

impl AnnouncementFilter {
    pub fn matches(&self, announcement: &Announcement) -> bool {
        let matches_search = self.search.as_deref().map_or(true, |term| {
            let term = term.to_lowercase();
            announcement.title.to_lowercase().contains(&term)
                || announcement.message.to_lowercase().contains(&term)
        });

        let matches_kind = match self.kind.as_deref() {
            None | Some("all") => true,
            Some(kind) => kind == announcement.kind,
        };

        let matches_class = match self.class.as_deref() {
            None | Some("all") => true,
            Some(class) => announcement.targets_all() || announcement.target_class == class,
        };

        matches_search && matches_kind && matches_class
    }
}

/// Newest first
pub fn sort_newest_first(announcements: &mut [Announcement]) {
    announcements.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Announcements shipped with the dashboard, dated relative to `now`
pub fn default_announcements(now: DateTime<Utc>) -> Vec<Announcement> {
    vec![
        Announcement {
            id: 1,
            title: "Assignment Due Reminder".to_string(),
            message: "Don't forget that your Data Structures assignment is due tomorrow at 11:59 PM. \
                      Please submit through the course portal."
                .to_string(),
            kind: "assignment".to_string(),
            target_class: "CS101".to_string(),
            priority: Priority::High,
            created_at: now - Duration::hours(2),
            status: "sent".to_string(),
            recipients: 45,
        },
        Announcement {
            id: 2,
            title: "Class Rescheduled".to_string(),
            message: "Tomorrow's Data Structures class has been moved to Friday 2:00 PM in Room B-105. \
                      Please update your schedules accordingly."
                .to_string(),
            kind: "schedule".to_string(),
            target_class: "DS201".to_string(),
            priority: Priority::Normal,
            created_at: now - Duration::hours(24),
            status: "sent".to_string(),
            recipients: 38,
        },
        Announcement {
            id: 3,
            title: "New Study Materials Available".to_string(),
            message: "I've uploaded the Chapter 5 notes and practice problems to the course content section. \
                      These will help you prepare for next week's quiz."
                .to_string(),
            kind: "material".to_string(),
            target_class: "ALG301".to_string(),
            priority: Priority::Normal,
            created_at: now - Duration::days(3),
            status: "sent".to_string(),
            recipients: 52,
        },
    ]
}
