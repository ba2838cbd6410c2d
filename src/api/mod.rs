//! API module for EduERP
//!
//! Contains all REST API endpoints and routing.

pub mod attendance;
pub mod catalog;

use axum::Router;

use crate::services::{AttendanceService, CatalogService};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub attendance: AttendanceService,
    pub catalog: CatalogService,
}

impl AppState {
    pub fn new(attendance: AttendanceService, catalog: CatalogService) -> Self {
        Self { attendance, catalog }
    }
}

/// Build the full API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(catalog::create_catalog_routes())
        .merge(attendance::create_attendance_routes())
        .with_state(state)
}
