//! Teacher Settings Model
//!
//! Account preferences kept under the `teacherSettings` key.

use serde::{Deserialize, Serialize};

use crate::models::RecordValidationError;

/// Instructor preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeacherSettings {
    // Notifications
    pub email_notifications: bool,
    pub push_notifications: bool,
    pub attendance_reminders: bool,
    pub class_updates: bool,
    pub system_alerts: bool,
    pub weekly_reports: bool,

    // Privacy
    pub profile_visibility: String,
    pub show_email: bool,
    pub show_phone: bool,
    pub allow_student_contact: bool,

    // Appearance
    pub theme: String,
    pub language: String,
    pub timezone: String,
    pub date_format: String,

    // Security
    pub two_factor_auth: bool,
    /// Minutes, stored as text
    pub session_timeout: String,
    pub login_alerts: bool,
}

impl Default for TeacherSettings {
    fn default() -> Self {
        Self {
            email_notifications: true,
            push_notifications: true,
            attendance_reminders: true,
            class_updates: true,
            system_alerts: true,
            weekly_reports: false,
            profile_visibility: "public".to_string(),
            show_email: false,
            show_phone: false,
            allow_student_contact: true,
            theme: "light".to_string(),
            language: "en".to_string(),
            timezone: "America/New_York".to_string(),
            date_format: "MM/DD/YYYY".to_string(),
            two_factor_auth: false,
            session_timeout: "30".to_string(),
            login_alerts: true,
        }
    }
}

impl TeacherSettings {
    /// Session timeout in minutes
    pub fn session_timeout_minutes(&self) -> Result<u32, RecordValidationError> {
        match self.session_timeout.trim().parse::<u32>() {
            Ok(minutes) if minutes > 0 => Ok(minutes),
            _ => Err(RecordValidationError::InvalidNumber(self.session_timeout.clone())),
        }
    }

    pub fn validate(&self) -> Result<(), RecordValidationError> {
        self.session_timeout_minutes()?;
        Ok(())
    }
}
