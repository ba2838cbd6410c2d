//! Models module for EduERP
//!
//! Contains all data models and their validation logic.

pub mod announcement;
pub mod attendance_session;
pub mod class_record;
pub mod content_item;
pub mod schedule_event;
pub mod teacher_settings;

// Re-export commonly used types
pub use attendance_session::{
    AttendanceResult, AttendanceSession, AttendanceSessionError, BroadcastStatus,
    DistributionMode, QrPayload, SessionPhase,
};
pub use class_record::{ClassRecord, ClassStatus};

/// Local validation failures for dashboard records
#[derive(Debug, thiserror::Error)]
pub enum RecordValidationError {
    #[error("Required field '{0}' is missing")]
    MissingField(&'static str),

    #[error("Invalid class id: {0}")]
    InvalidClassId(String),

    #[error("Invalid time '{0}' (expected HH:MM)")]
    InvalidTime(String),

    #[error("End time {end} is not after start time {start}")]
    EndBeforeStart { start: String, end: String },

    #[error("Percentage {0} is out of range")]
    InvalidPercentage(u8),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),
}
