//! Attendance API Endpoints
//!
//! Start, watch and close timed attendance sessions.

use std::str::FromStr;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;

use crate::api::AppState;
use crate::error::{AppError, AppResult};
use crate::models::attendance_session::{AttendanceResult, DistributionMode, QrPayload};
use crate::services::attendance_service::SessionState;

/// Body of a start request; every field is optional
#[derive(Debug, Default, Deserialize)]
pub struct StartAttendanceRequest {
    /// `projector` (default) or `broadcast`
    pub mode: Option<String>,
}

impl StartAttendanceRequest {
    fn parse(body: &[u8]) -> AppResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| AppError::bad_request(&e.to_string()))
    }

    fn mode(&self) -> AppResult<DistributionMode> {
        match self.mode.as_deref() {
            None => Ok(DistributionMode::default()),
            Some(mode) => DistributionMode::from_str(mode)
                .map_err(|_| AppError::bad_request(&format!("Unknown distribution mode: {mode}"))),
        }
    }
}

/// Create attendance API routes
pub fn create_attendance_routes() -> Router<AppState> {
    Router::new()
        .route("/api/attendance", get(list_sessions))
        .route(
            "/api/attendance/:class_id",
            get(get_session).delete(cancel_session),
        )
        .route("/api/attendance/:class_id/start", post(start_session))
        .route("/api/attendance/:class_id/qr", get(get_qr_payload))
        .route("/api/attendance/:class_id/result", get(get_result))
}

/// Sessions still counting down
pub async fn list_sessions(State(state): State<AppState>) -> Json<Vec<SessionState>> {
    Json(state.attendance.active_sessions().await)
}

/// Start a session for a class, replacing any previous one
pub async fn start_session(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
    body: Bytes,
) -> AppResult<Json<SessionState>> {
    let request = StartAttendanceRequest::parse(&body)?;
    let mode = request.mode()?;
    let class = state.catalog.find_class(&class_id)?;

    let session = state.attendance.start(&class, mode).await?;
    Ok(Json(session))
}

/// Current state of a class's session
pub async fn get_session(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> AppResult<Json<SessionState>> {
    state
        .attendance
        .get(&class_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::not_found(&format!("Attendance session for class {class_id}")))
}

/// QR data for a class's session
pub async fn get_qr_payload(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> AppResult<Json<QrPayload>> {
    state
        .attendance
        .qr_payload(&class_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::not_found(&format!("Attendance session for class {class_id}")))
}

/// Final tally; 404 until the countdown has finished
pub async fn get_result(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> AppResult<Json<AttendanceResult>> {
    state
        .attendance
        .result(&class_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::not_found(&format!("Attendance result for class {class_id}")))
}

/// Close a session and stop its timer
pub async fn cancel_session(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> AppResult<StatusCode> {
    state.attendance.cancel(&class_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
