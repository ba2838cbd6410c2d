//! Class Record Model
//!
//! A class on the instructor's roster, with the embedded default roster used
//! when the store has nothing saved yet.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::models::RecordValidationError;

static CLASS_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").expect("class id pattern is valid"));

/// Whether a class is currently taught
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ClassStatus {
    #[default]
    Active,
    Inactive,
}

/// A class taught by the instructor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    pub id: String,
    pub subject: String,
    pub code: String,
    /// Enrollment size
    pub students: u32,
    #[serde(default)]
    pub status: ClassStatus,
    /// Historical attendance percentage
    #[serde(default)]
    pub attendance_rate: u8,
    #[serde(default)]
    pub last_session: String,
}

impl ClassRecord {
    pub fn is_active(&self) -> bool {
        self.status == ClassStatus::Active
    }

    /// Check that an identifier is usable as a class id
    pub fn validate_id(id: &str) -> Result<(), RecordValidationError> {
        if CLASS_ID_PATTERN.is_match(id) {
            Ok(())
        } else {
            Err(RecordValidationError::InvalidClassId(id.to_string()))
        }
    }

    pub fn validate(&self) -> Result<(), RecordValidationError> {
        Self::validate_id(&self.id)?;

        if self.subject.trim().is_empty() {
            return Err(RecordValidationError::MissingField("subject"));
        }

        if self.code.trim().is_empty() {
            return Err(RecordValidationError::MissingField("code"));
        }

        if self.attendance_rate > 100 {
            return Err(RecordValidationError::InvalidPercentage(self.attendance_rate));
        }

        Ok(())
    }
}

/// Search and filter criteria for the class list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassFilter {
    /// Case-insensitive match on subject or code
    #[serde(default)]
    pub search: Option<String>,
    /// `active`, `inactive`, `all` or absent for any
    #[serde(default)]
    pub status: Option<String>,
}

impl ClassFilter {
    pub fn matches(&self, class: &ClassRecord) -> bool {
        let matches_search = self.search.as_deref().map_or(true, |term| {
            let term = term.to_lowercase();
            class.subject.to_lowercase().contains(&term) || class.code.to_lowercase().contains(&term)
        });

        let matches_status = match self.status.as_deref() {
            None | Some("all") => true,
            Some(status) => status == class.status.to_string(),
        };

        matches_search && matches_status
    }
}

/// Headline numbers for the roster
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    pub total_classes: usize,
    pub active_classes: usize,
    /// Enrollment summed over every class
    pub total_students: u64,
    /// Mean attendance rate of the active classes, rounded; 0 when none are active
    pub average_attendance_rate: u8,
}

impl ClassSummary {
    pub fn from_classes(classes: &[ClassRecord]) -> Self {
        let active: Vec<&ClassRecord> = classes.iter().filter(|class| class.is_active()).collect();
        let rate_sum: u64 = active.iter().map(|class| u64::from(class.attendance_rate)).sum();
        let average_attendance_rate = match u64::try_from(active.len()) {
            Ok(count) if count > 0 => {
                // rates are at most 100, so the rounded mean fits
                u8::try_from((rate_sum + count / 2) / count).unwrap_or(100)
            }
            _ => 0,
        };

        Self {
            total_classes: classes.len(),
            active_classes: active.len(),
            total_students: classes.iter().map(|class| u64::from(class.students)).sum(),
            average_attendance_rate,
        }
    }
}

/// Roster shipped with the dashboard
pub fn default_classes() -> Vec<ClassRecord> {
    vec![
        ClassRecord {
            id: "cs101".to_string(),
            subject: "Introduction to Computer Science".to_string(),
            code: "CS101".to_string(),
            students: 45,
            status: ClassStatus::Active,
            attendance_rate: 92,
            last_session: "2 hours ago".to_string(),
        },
        ClassRecord {
            id: "ds201".to_string(),
            subject: "Data Structures and Algorithms".to_string(),
            code: "DS201".to_string(),
            students: 38,
            status: ClassStatus::Active,
            attendance_rate: 88,
            last_session: "Yesterday".to_string(),
        },
        ClassRecord {
            id: "alg301".to_string(),
            subject: "Advanced Algorithms".to_string(),
            code: "ALG301".to_string(),
            students: 25,
            status: ClassStatus::Active,
            attendance_rate: 96,
            last_session: "3 days ago".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_classes_are_valid() {
        let classes = default_classes();
        assert_eq!(classes.len(), 3);
        for class in &classes {
            assert!(class.validate().is_ok(), "{} should be valid", class.id);
            assert!(class.is_active());
        }
        assert_eq!(classes[0].students, 45);
    }

    #[test]
    fn test_class_id_validation() {
        assert!(ClassRecord::validate_id("cs101").is_ok());
        assert!(ClassRecord::validate_id("ds-201_b").is_ok());
        assert!(ClassRecord::validate_id("CS101").is_err());
        assert!(ClassRecord::validate_id("").is_err());
        assert!(ClassRecord::validate_id("../etc").is_err());
    }

    #[test]
    fn test_missing_subject() {
        let mut class = default_classes().remove(0);
        class.subject = "  ".to_string();
        assert!(matches!(
            class.validate(),
            Err(RecordValidationError::MissingField("subject"))
        ));
    }

    #[test]
    fn test_class_filter() {
        let mut classes = default_classes();
        classes[1].status = ClassStatus::Inactive;

        let filter = ClassFilter {
            search: Some("algorithms".to_string()),
            ..Default::default()
        };
        let ids: Vec<&str> = classes.iter().filter(|c| filter.matches(c)).map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["ds201", "alg301"]);

        let filter = ClassFilter {
            search: Some("alg".to_string()),
            status: Some("active".to_string()),
        };
        let ids: Vec<&str> = classes.iter().filter(|c| filter.matches(c)).map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["alg301"]);

        let filter = ClassFilter {
            search: Some("cs1".to_string()),
            status: Some("all".to_string()),
        };
        assert_eq!(classes.iter().filter(|c| filter.matches(c)).count(), 1);
    }

    #[test]
    fn test_summary() {
        let summary = ClassSummary::from_classes(&default_classes());
        assert_eq!(summary.total_classes, 3);
        assert_eq!(summary.active_classes, 3);
        assert_eq!(summary.total_students, 108);
        assert_eq!(summary.average_attendance_rate, 92);

        let mut classes = default_classes();
        classes[0].status = ClassStatus::Inactive;
        let summary = ClassSummary::from_classes(&classes);
        assert_eq!(summary.active_classes, 2);
        assert_eq!(summary.total_students, 108);
        assert_eq!(summary.average_attendance_rate, 92);

        for class in &mut classes {
            class.status = ClassStatus::Inactive;
        }
        assert_eq!(ClassSummary::from_classes(&classes).average_attendance_rate, 0);
        assert_eq!(ClassSummary::from_classes(&[]), ClassSummary::default());
    }

    #[test]
    fn test_camel_case_layout() {
        let json = serde_json::to_value(&default_classes()[1]).unwrap();
        assert_eq!(json["attendanceRate"], 88);
        assert_eq!(json["lastSession"], "Yesterday");
        assert_eq!(json["status"], "active");

        let parsed: ClassRecord = serde_json::from_str(
            r#"{"id":"x1","subject":"X","code":"X1","students":10}"#,
        )
        .unwrap();
        assert_eq!(parsed.status, ClassStatus::Active);
        assert_eq!(parsed.attendance_rate, 0);
    }
}
