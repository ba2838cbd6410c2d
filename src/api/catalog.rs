//! Catalog API Endpoints
//!
//! Read-only views over classes, schedule, content, announcements and
//! settings.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};

use crate::api::AppState;
use crate::error::AppResult;
use crate::models::announcement::{Announcement, AnnouncementFilter};
use crate::models::class_record::{ClassFilter, ClassRecord, ClassSummary};
use crate::models::content_item::{ContentFilter, ContentItem};
use crate::models::schedule_event::WeeklySchedule;
use crate::models::teacher_settings::TeacherSettings;

/// Create catalog API routes
pub fn create_catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/classes", get(list_classes))
        .route("/api/classes/:class_id", get(get_class))
        .route("/api/schedule", get(get_schedule))
        .route("/api/content", get(list_content))
        .route("/api/announcements", get(list_announcements))
        .route("/api/stats", get(get_class_summary))
        .route("/api/settings", get(get_settings))
}

pub async fn health_check() -> &'static str {
    "OK"
}

/// Classes filtered by `search` and `status` query parameters
pub async fn list_classes(
    State(state): State<AppState>,
    Query(filter): Query<ClassFilter>,
) -> AppResult<Json<Vec<ClassRecord>>> {
    Ok(Json(state.catalog.classes_matching(&filter)?))
}

pub async fn get_class(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> AppResult<Json<ClassRecord>> {
    Ok(Json(state.catalog.find_class(&class_id)?))
}

pub async fn get_schedule(State(state): State<AppState>) -> AppResult<Json<WeeklySchedule>> {
    Ok(Json(state.catalog.schedule()?))
}

/// Content filtered by `search`, `type` and `class` query parameters
pub async fn list_content(
    State(state): State<AppState>,
    Query(filter): Query<ContentFilter>,
) -> AppResult<Json<Vec<ContentItem>>> {
    Ok(Json(state.catalog.content(&filter)?))
}

/// Announcements filtered by `search`, `type` and `class`, newest first
pub async fn list_announcements(
    State(state): State<AppState>,
    Query(filter): Query<AnnouncementFilter>,
) -> AppResult<Json<Vec<Announcement>>> {
    Ok(Json(state.catalog.announcements(&filter)?))
}

/// Roster totals for the dashboard cards
pub async fn get_class_summary(State(state): State<AppState>) -> AppResult<Json<ClassSummary>> {
    Ok(Json(state.catalog.class_summary()?))
}

pub async fn get_settings(State(state): State<AppState>) -> AppResult<Json<TeacherSettings>> {
    Ok(Json(state.catalog.settings()?))
}
