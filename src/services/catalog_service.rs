//! Catalog Service
//!
//! Read access to the dashboard's record collections. Each collection is one
//! JSON blob in the injected store; a missing blob is seeded from the
//! embedded defaults. Stored records that fail validation are logged and
//! left out of every read.

use std::sync::Arc;

use crate::database::{keys, load_json_or_default, KeyValueStore, StoreError};
use crate::logging;
use crate::models::announcement::{
    default_announcements, sort_newest_first, Announcement, AnnouncementFilter,
};
use crate::models::class_record::{default_classes, ClassFilter, ClassRecord, ClassSummary};
use crate::models::content_item::{default_content, ContentFilter, ContentItem};
use crate::models::schedule_event::{default_schedule, WeeklySchedule};
use crate::models::teacher_settings::TeacherSettings;
use crate::models::RecordValidationError;
use crate::services::time_provider::{SystemTimeProvider, TimeProvider};

/// Catalog of classes, schedule, content, announcements and settings
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn KeyValueStore>,
    time_provider: Arc<dyn TimeProvider>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_time_provider(store, Arc::new(SystemTimeProvider))
    }

    /// Use a specific clock for dating the default announcements
    pub fn with_time_provider(store: Arc<dyn KeyValueStore>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self { store, time_provider }
    }

    fn load<T, F>(&self, key: &str, default: F) -> Result<T, CatalogError>
    where
        T: serde::Serialize + serde::de::DeserializeOwned,
        F: FnOnce() -> T,
    {
        let value = load_json_or_default(self.store.as_ref(), key, || {
            logging::log_store_fallback(key);
            default()
        })?;
        Ok(value)
    }

    /// Every valid class
    pub fn classes(&self) -> Result<Vec<ClassRecord>, CatalogError> {
        let classes: Vec<ClassRecord> = self.load(keys::CLASSES, default_classes)?;
        Ok(keep_valid(keys::CLASSES, classes, |class| {
            (class.id.clone(), class.validate())
        }))
    }

    /// Classes matching `filter`
    pub fn classes_matching(&self, filter: &ClassFilter) -> Result<Vec<ClassRecord>, CatalogError> {
        let mut classes = self.classes()?;
        classes.retain(|class| filter.matches(class));
        Ok(classes)
    }

    /// Look up one class by id
    pub fn find_class(&self, class_id: &str) -> Result<ClassRecord, CatalogError> {
        ClassRecord::validate_id(class_id)?;

        self.classes()?
            .into_iter()
            .find(|class| class.id == class_id)
            .ok_or_else(|| CatalogError::ClassNotFound(class_id.to_string()))
    }

    /// Totals across the valid classes
    pub fn class_summary(&self) -> Result<ClassSummary, CatalogError> {
        Ok(ClassSummary::from_classes(&self.classes()?))
    }

    pub fn schedule(&self) -> Result<WeeklySchedule, CatalogError> {
        let schedule: WeeklySchedule = self.load(keys::SCHEDULE, default_schedule)?;
        Ok(schedule
            .into_iter()
            .map(|(day, events)| {
                let events = keep_valid(keys::SCHEDULE, events, |event| {
                    (event.id.to_string(), event.validate())
                });
                (day, events)
            })
            .collect())
    }

    /// Content matching `filter`
    pub fn content(&self, filter: &ContentFilter) -> Result<Vec<ContentItem>, CatalogError> {
        let items: Vec<ContentItem> = self.load(keys::CONTENT, default_content)?;
        Ok(filter.apply(&items).into_iter().cloned().collect())
    }

    /// Announcements matching `filter`, newest first
    pub fn announcements(&self, filter: &AnnouncementFilter) -> Result<Vec<Announcement>, CatalogError> {
        let now = self.time_provider.now_utc();
        let announcements: Vec<Announcement> =
            self.load(keys::ANNOUNCEMENTS, || default_announcements(now))?;

        let mut announcements = keep_valid(keys::ANNOUNCEMENTS, announcements, |announcement| {
            (announcement.id.to_string(), announcement.validate())
        });
        announcements.retain(|announcement| filter.matches(announcement));
        sort_newest_first(&mut announcements);
        Ok(announcements)
    }

    /// Saved settings, or the defaults when the saved ones do not validate
    pub fn settings(&self) -> Result<TeacherSettings, CatalogError> {
        let settings: TeacherSettings = self.load(keys::SETTINGS, TeacherSettings::default)?;
        match settings.validate() {
            Ok(()) => Ok(settings),
            Err(e) => {
                logging::log_invalid_record(keys::SETTINGS, "settings", &e);
                Ok(TeacherSettings::default())
            }
        }
    }
}

fn keep_valid<T, F>(key: &str, records: Vec<T>, check: F) -> Vec<T>
where
    F: Fn(&T) -> (String, Result<(), RecordValidationError>),
{
    records
        .into_iter()
        .filter(|record| match check(record) {
            (_, Ok(())) => true,
            (id, Err(e)) => {
                logging::log_invalid_record(key, &id, &e);
                false
            }
        })
        .collect()
}

/// Catalog errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Class {0} not found")]
    ClassNotFound(String),

    #[error(transparent)]
    Validation(#[from] RecordValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{save_json, MemoryStore};
    use crate::models::class_record::ClassStatus;

    fn catalog() -> (CatalogService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (CatalogService::new(store.clone()), store)
    }

    fn biology() -> ClassRecord {
        ClassRecord {
            id: "bio110".to_string(),
            subject: "Biology".to_string(),
            code: "BIO110".to_string(),
            students: 60,
            status: ClassStatus::Inactive,
            attendance_rate: 70,
            last_session: String::new(),
        }
    }

    #[test]
    fn test_defaults_seeded_on_first_read() {
        let (catalog, store) = catalog();
        assert!(store.get(keys::CLASSES).unwrap().is_none());

        let classes = catalog.classes().unwrap();
        assert_eq!(classes.len(), 3);
        assert!(store.get(keys::CLASSES).unwrap().is_some());
    }

    #[test]
    fn test_saved_classes_replace_defaults() {
        let (catalog, store) = catalog();
        let saved = vec![biology()];
        save_json(store.as_ref(), keys::CLASSES, &saved).unwrap();

        assert_eq!(catalog.classes().unwrap(), saved);
        assert!(matches!(
            catalog.find_class("cs101"),
            Err(CatalogError::ClassNotFound(_))
        ));
    }

    #[test]
    fn test_invalid_stored_classes_are_skipped() {
        let (catalog, store) = catalog();
        let mut bad_id = biology();
        bad_id.id = "Bio 110".to_string();
        let mut bad_rate = biology();
        bad_rate.id = "bio120".to_string();
        bad_rate.attendance_rate = 140;
        save_json(store.as_ref(), keys::CLASSES, &[bad_id, bad_rate, biology()]).unwrap();

        let ids: Vec<String> = catalog.classes().unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["bio110".to_string()]);
        assert!(matches!(
            catalog.find_class("bio120"),
            Err(CatalogError::ClassNotFound(_))
        ));
        assert_eq!(catalog.class_summary().unwrap().total_classes, 1);
    }

    #[test]
    fn test_find_class() {
        let (catalog, _) = catalog();
        assert_eq!(catalog.find_class("ds201").unwrap().students, 38);
        assert!(matches!(
            catalog.find_class("DS 201"),
            Err(CatalogError::Validation(RecordValidationError::InvalidClassId(_)))
        ));
    }

    #[test]
    fn test_class_filter_and_summary() {
        let (catalog, store) = catalog();
        let mut classes = default_classes();
        classes.push(biology());
        save_json(store.as_ref(), keys::CLASSES, &classes).unwrap();

        let inactive = catalog
            .classes_matching(&ClassFilter {
                status: Some("inactive".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(inactive, vec![biology()]);

        let summary = catalog.class_summary().unwrap();
        assert_eq!(summary.total_classes, 4);
        assert_eq!(summary.active_classes, 3);
        assert_eq!(summary.total_students, 168);
        assert_eq!(summary.average_attendance_rate, 92);
    }

    #[test]
    fn test_invalid_schedule_events_are_skipped() {
        let (catalog, store) = catalog();
        let mut schedule = default_schedule();
        if let Some(monday) = schedule.get_mut("Monday") {
            monday[0].end_time = "08:00".to_string();
        }
        save_json(store.as_ref(), keys::SCHEDULE, &schedule).unwrap();

        let loaded = catalog.schedule().unwrap();
        assert_eq!(loaded["Monday"].len(), 1);
        assert_eq!(loaded["Monday"][0].id, 2);
        assert_eq!(loaded["Friday"].len(), 2);
    }

    #[test]
    fn test_announcements_filtered_and_validated() {
        let (catalog, store) = catalog();
        let mut announcements = default_announcements(chrono::Utc::now());
        announcements[1].title = String::new();
        save_json(store.as_ref(), keys::ANNOUNCEMENTS, &announcements).unwrap();

        let all = catalog.announcements(&AnnouncementFilter::default()).unwrap();
        let ids: Vec<i64> = all.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 3]);

        let assignments = catalog
            .announcements(&AnnouncementFilter {
                kind: Some("assignment".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(assignments.len(), 1);
    }

    #[test]
    fn test_invalid_settings_fall_back() {
        let (catalog, store) = catalog();
        store
            .set(keys::SETTINGS, r#"{"theme":"dark","sessionTimeout":"never"}"#.to_string())
            .unwrap();

        assert_eq!(catalog.settings().unwrap(), TeacherSettings::default());

        store
            .set(keys::SETTINGS, r#"{"theme":"dark","sessionTimeout":"45"}"#.to_string())
            .unwrap();
        assert_eq!(catalog.settings().unwrap().theme, "dark");
    }

    #[test]
    fn test_other_collections() {
        let (catalog, _) = catalog();
        assert_eq!(catalog.schedule().unwrap().len(), 5);
        assert_eq!(catalog.announcements(&AnnouncementFilter::default()).unwrap()[0].id, 1);
        assert!(catalog.settings().unwrap().attendance_reminders);

        let videos = catalog
            .content(&ContentFilter {
                content_type: Some("video".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(videos.len(), 1);
    }
}
