//! Error handling for EduERP
//!
//! Centralized error types and handling for the application.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::database::StoreError;
use crate::logging;
use crate::models::attendance_session::AttendanceSessionError;
use crate::models::RecordValidationError;
use crate::services::attendance_service::AttendanceServiceError;
use crate::services::catalog_service::CatalogError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Attendance session error: {0}")]
    AttendanceSession(#[from] AttendanceSessionError),

    #[error("Validation error: {0}")]
    Validation(#[from] RecordValidationError),

    #[error("Class {0} is not active")]
    ClassInactive(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

}

impl AppError {
    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) | AppError::Validation(_) | AppError::AttendanceSession(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::ClassInactive(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Store(_) => "StoreError",
            AppError::AttendanceSession(_) => "AttendanceSessionError",
            AppError::Validation(_) => "ValidationError",
            AppError::ClassInactive(_) => "ClassInactive",
            AppError::NotFound(_) => "NotFound",
            AppError::BadRequest(_) => "BadRequest",
        }
    }

    /// Check if this error should be logged as an error vs warning
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    pub fn not_found(resource: &str) -> Self {
        AppError::NotFound(format!("{resource} not found"))
    }

    pub fn bad_request(message: &str) -> Self {
        AppError::BadRequest(message.to_string())
    }
}

impl From<AttendanceServiceError> for AppError {
    fn from(error: AttendanceServiceError) -> Self {
        match error {
            AttendanceServiceError::ClassInactive(class_id) => AppError::ClassInactive(class_id),
            AttendanceServiceError::NoSession(class_id) => {
                AppError::not_found(&format!("Attendance session for class {class_id}"))
            }
            AttendanceServiceError::Session(e) => AppError::AttendanceSession(e),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(error: CatalogError) -> Self {
        match error {
            CatalogError::ClassNotFound(class_id) => AppError::not_found(&format!("Class {class_id}")),
            CatalogError::Validation(e) => AppError::Validation(e),
            CatalogError::Store(e) => AppError::Store(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        if self.is_server_error() {
            logging::log_error(&message, error_code);
        } else {
            tracing::warn!(error = %error_code, message = %message, "Request rejected");
        }

        let body = Json(json!({
            "error": error_code,
            "message": message,
            "timestamp": chrono::Utc::now().timestamp()
        }));

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
