//! Services module for EduERP
//!
//! Contains all business logic and service implementations.

pub mod attendance_service;
pub mod catalog_service;
pub mod scan_simulator;
pub mod time_provider;

// Re-export commonly used services
pub use attendance_service::{AttendanceService, AttendanceServiceError, SessionEvent, SessionState};
pub use catalog_service::{CatalogError, CatalogService};
pub use scan_simulator::{ScanSimulator, ScanSource, SimulatorConfig};
pub use time_provider::{MockTimeProvider, SystemTimeProvider, TimeProvider};
