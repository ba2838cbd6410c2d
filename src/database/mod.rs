//! Storage layer for EduERP
//!
//! A key-value store holding whole JSON blobs under fixed key names.

pub mod json_file;
pub mod kv_store;

pub use json_file::JsonFileStore;
pub use kv_store::{
    load_json_or_default, save_json, KeyValueStore, MemoryStore, StoreError, StoreResult,
};

/// Fixed key names for the stored blobs
pub mod keys {
    pub const CLASSES: &str = "classes";
    pub const SCHEDULE: &str = "teacherSchedule";
    pub const CONTENT: &str = "courseContent";
    pub const ANNOUNCEMENTS: &str = "announcements";
    pub const SETTINGS: &str = "teacherSettings";
}
