//! Attendance Session Model
//!
//! One timed attendance-collection attempt for a class. The session moves
//! `Idle -> Counting -> Finalized` and never leaves `Finalized`; a fresh
//! attempt is a fresh session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::models::class_record::ClassRecord;

/// Default countdown length in seconds
pub const DEFAULT_DURATION_SECONDS: u32 = 10;

/// Seconds into a broadcast session when student devices are detected
const BROADCAST_CONNECTED_AT: u32 = 2;

/// Seconds into a broadcast session when the QR starts going out
const BROADCAST_SENDING_AT: u32 = 3;

/// Lifecycle phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SessionPhase {
    Idle,
    Counting,
    Finalized,
}

/// How the QR code reaches the students
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DistributionMode {
    /// Shown on a projector for students to scan
    #[default]
    Projector,
    /// Pushed to student devices over the campus network
    Broadcast,
}

/// Progress of a broadcast-mode session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BroadcastStatus {
    Connecting,
    Connected,
    Broadcasting,
}

/// Final tally of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceResult {
    pub session_id: String,
    pub class_id: String,
    pub present: u32,
    pub absent: u32,
    pub total: u32,
    /// `present / total`, 0.0 for an empty roster
    pub rate: f64,
    pub scanned_count: u32,
    pub mode: DistributionMode,
    pub completed_at: DateTime<Utc>,
}

/// Data encoded into the attendance QR code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
    pub session_id: String,
    pub class_id: String,
    pub class_name: String,
    /// Unix milliseconds
    pub timestamp: i64,
    /// Unix milliseconds
    pub expires_at: i64,
    pub mode: DistributionMode,
}

/// A single timed attendance session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSession {
    /// Opaque identifier, `SESSION_<millis>_<suffix>`
    pub session_id: String,

    pub class_id: String,

    pub class_name: String,

    /// Enrollment at the moment the session started
    pub total_enrolled: u32,

    pub started_at: DateTime<Utc>,

    pub duration_seconds: u32,

    pub remaining_seconds: u32,

    /// Mock scans collected so far
    pub scanned_count: u32,

    pub mode: DistributionMode,

    /// Only set for broadcast sessions
    pub broadcast_status: Option<BroadcastStatus>,

    /// Devices detected on the network (broadcast only)
    pub connected_students: u32,

    /// Percentage of the roster detected once a broadcast connects
    pub broadcast_reach_percent: u8,

    pub phase: SessionPhase,

    pub result: Option<AttendanceResult>,
}

impl AttendanceSession {
    /// Build a session id from a start time and a random suffix
    pub fn make_session_id(started_at: DateTime<Utc>, suffix: &str) -> String {
        format!("SESSION_{}_{}", started_at.timestamp_millis(), suffix)
    }

    /// Create an idle session for a class
    pub fn new(
        session_id: String,
        class: &ClassRecord,
        mode: DistributionMode,
        duration_seconds: u32,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id,
            class_id: class.id.clone(),
            class_name: class.subject.clone(),
            total_enrolled: class.students,
            started_at,
            duration_seconds,
            remaining_seconds: duration_seconds,
            scanned_count: 0,
            mode,
            broadcast_status: None,
            connected_students: 0,
            broadcast_reach_percent: 80,
            phase: SessionPhase::Idle,
            result: None,
        }
    }

    /// Set how much of the roster a broadcast reaches
    #[must_use]
    pub fn with_broadcast_reach(mut self, percent: u8) -> Self {
        self.broadcast_reach_percent = percent.min(100);
        self
    }

    /// Begin counting down
    pub fn begin(&mut self) -> Result<(), AttendanceSessionError> {
        if self.phase != SessionPhase::Idle {
            return Err(AttendanceSessionError::AlreadyStarted(self.phase));
        }

        self.remaining_seconds = self.duration_seconds;
        self.scanned_count = 0;
        self.phase = SessionPhase::Counting;
        if self.mode == DistributionMode::Broadcast {
            self.broadcast_status = Some(BroadcastStatus::Connecting);
        }

        Ok(())
    }

    pub fn is_counting(&self) -> bool {
        self.phase == SessionPhase::Counting
    }

    pub fn is_finalized(&self) -> bool {
        self.phase == SessionPhase::Finalized
    }

    /// Seconds elapsed since counting began
    pub fn elapsed_seconds(&self) -> u32 {
        self.duration_seconds.saturating_sub(self.remaining_seconds)
    }

    /// Get progress as a percentage (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.duration_seconds == 0 {
            0.0
        } else {
            f64::from(self.elapsed_seconds()) / f64::from(self.duration_seconds)
        }
    }

    /// Last eight characters of the id, as shown to students
    pub fn short_id(&self) -> &str {
        let start = self
            .session_id
            .char_indices()
            .rev()
            .nth(7)
            .map_or(0, |(index, _)| index);
        &self.session_id[start..]
    }

    /// Advance one second. Returns true when the countdown has just hit zero.
    ///
    /// Does nothing outside `Counting`.
    pub fn advance(&mut self, scan_increment: u32) -> bool {
        if !self.is_counting() {
            return false;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        self.scanned_count = self
            .scanned_count
            .saturating_add(scan_increment)
            .min(self.total_enrolled);

        if self.mode == DistributionMode::Broadcast {
            self.update_broadcast();
        }

        self.remaining_seconds == 0
    }

    fn update_broadcast(&mut self) {
        let elapsed = self.elapsed_seconds();
        if elapsed >= BROADCAST_SENDING_AT {
            self.broadcast_status = Some(BroadcastStatus::Broadcasting);
        } else if elapsed >= BROADCAST_CONNECTED_AT {
            self.broadcast_status = Some(BroadcastStatus::Connected);
        }

        if elapsed >= BROADCAST_CONNECTED_AT && self.connected_students == 0 {
            self.connected_students = self.broadcast_reach();
        }
    }

    /// Students reached by a broadcast, never more than the roster
    fn broadcast_reach(&self) -> u32 {
        let reached = u64::from(self.total_enrolled) * u64::from(self.broadcast_reach_percent) / 100;
        u32::try_from(reached).unwrap_or(self.total_enrolled)
    }

    /// Close the session with a present count and return the tally.
    ///
    /// The first call wins; later calls hand back the stored result.
    pub fn finalize(&mut self, present: u32, completed_at: DateTime<Utc>) -> AttendanceResult {
        if let Some(result) = &self.result {
            return result.clone();
        }

        let total = self.total_enrolled;
        let present = present.min(total);
        let rate = if total == 0 {
            0.0
        } else {
            f64::from(present) / f64::from(total)
        };

        let result = AttendanceResult {
            session_id: self.session_id.clone(),
            class_id: self.class_id.clone(),
            present,
            absent: total - present,
            total,
            rate,
            scanned_count: self.scanned_count,
            mode: self.mode,
            completed_at,
        };

        self.remaining_seconds = 0;
        self.phase = SessionPhase::Finalized;
        self.result = Some(result.clone());
        result
    }

    /// QR data for this session
    pub fn qr_payload(&self) -> QrPayload {
        let timestamp = self.started_at.timestamp_millis();
        QrPayload {
            session_id: self.session_id.clone(),
            class_id: self.class_id.clone(),
            class_name: self.class_name.clone(),
            timestamp,
            expires_at: timestamp + i64::from(self.duration_seconds) * 1000,
            mode: self.mode,
        }
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<(), AttendanceSessionError> {
        if self.duration_seconds == 0 {
            return Err(AttendanceSessionError::InvalidDuration(self.duration_seconds));
        }

        if self.remaining_seconds > self.duration_seconds {
            return Err(AttendanceSessionError::InvalidRemaining(self.remaining_seconds));
        }

        if self.scanned_count > self.total_enrolled {
            return Err(AttendanceSessionError::ScansExceedEnrollment {
                scanned: self.scanned_count,
                enrolled: self.total_enrolled,
            });
        }

        if let Some(result) = &self.result {
            if result.present + result.absent != self.total_enrolled {
                return Err(AttendanceSessionError::UnbalancedTally);
            }
        }

        Ok(())
    }
}

/// Attendance session errors
#[derive(Debug, thiserror::Error)]
pub enum AttendanceSessionError {
    #[error("Session duration {0} is invalid (must be at least 1 second)")]
    InvalidDuration(u32),

    #[error("Remaining time {0} exceeds the session duration")]
    InvalidRemaining(u32),

    #[error("Scanned count {scanned} exceeds enrollment {enrolled}")]
    ScansExceedEnrollment { scanned: u32, enrolled: u32 },

    #[error("Present and absent counts do not add up to the enrollment")]
    UnbalancedTally,

    #[error("Session already started (phase: {0})")]
    AlreadyStarted(SessionPhase),
}
