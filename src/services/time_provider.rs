//! Time Provider
//!
//! Wall-clock abstraction so session timestamps can be pinned in tests.
//! Tick pacing is driven by tokio's clock; this only stamps records.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

/// Source of the current time
pub trait TimeProvider: Send + Sync {
    /// Get the current UTC time
    fn now_utc(&self) -> DateTime<Utc>;
}

/// System time provider for production use
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests
#[derive(Debug, Clone)]
pub struct MockTimeProvider {
    current_time: Arc<Mutex<DateTime<Utc>>>,
}

impl MockTimeProvider {
    pub fn new(start_time: DateTime<Utc>) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(start_time)),
        }
    }

    /// Start the clock at a fixed UTC date and time
    pub fn at(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<Self> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .single()
            .map(Self::new)
    }

    pub fn advance_seconds(&self, seconds: i64) {
        if let Ok(mut time) = self.current_time.lock() {
            *time += chrono::Duration::seconds(seconds);
        }
    }
}

impl TimeProvider for MockTimeProvider {
    fn now_utc(&self) -> DateTime<Utc> {
        self.current_time.lock().map_or_else(|_| Utc::now(), |time| *time)
    }
}
