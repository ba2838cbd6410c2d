//! Logging configuration for EduERP
//!
//! Structured logging setup with appropriate levels and formatting.

use std::time::Duration;

use axum::http::StatusCode;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

use crate::models::attendance_session::{AttendanceResult, DistributionMode};
use crate::models::RecordValidationError;

/// Output format for log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single line
    #[default]
    Compact,
    /// One JSON object per line
    Json,
}

/// Initialize the application logging system.
///
/// `RUST_LOG` overrides `log_level` when set. Calling this twice is harmless.
pub fn init_logging(log_level: &str, format: LogFormat) {
    let default_filter = format!("eduerp_attendance={log_level},tower_http={log_level},axum::rejection=trace");

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_span_events(FmtSpan::CLOSE);

    let installed = match format {
        LogFormat::Json => builder
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .try_init(),
        LogFormat::Compact => builder.compact().with_target(false).try_init(),
    };

    if installed.is_ok() {
        tracing::info!("Logging system initialized");
    }
}

/// Create a span for request logging
#[macro_export]
macro_rules! request_span {
    ($method:expr, $path:expr) => {
        tracing::info_span!(
            "http_request",
            method = %$method,
            path = %$path,
            status_code = tracing::field::Empty,
        )
    };
}

/// Create a span for attendance operations
#[macro_export]
macro_rules! attendance_span {
    ($operation:expr, $session_id:expr) => {
        tracing::info_span!(
            "attendance_operation",
            operation = %$operation,
            session_id = %$session_id,
            class_id = tracing::field::Empty,
        )
    };
}

/// Log application startup
pub fn log_startup() {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "EduERP attendance backend starting up"
    );
}

/// Fill in the `status_code` field of a `request_span!` and log the response
pub fn log_response(status: StatusCode, latency: Duration, span: &tracing::Span) {
    let status_code = status.as_u16();
    let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
    span.record("status_code", status_code);

    if status.is_server_error() {
        tracing::warn!(status_code, latency_ms, "Request failed");
    } else {
        tracing::debug!(status_code, latency_ms, "Request finished");
    }
}

/// Log a new session
pub fn log_session_started(
    session_id: &str,
    class_id: &str,
    mode: DistributionMode,
    duration_seconds: u32,
    total_enrolled: u32,
) {
    tracing::info!(
        session_id = %session_id,
        class_id = %class_id,
        mode = %mode,
        duration_seconds,
        total_enrolled,
        "Attendance session started"
    );
}

/// Log one countdown step
pub fn log_session_tick(session_id: &str, remaining_seconds: u32, scanned_count: u32) {
    tracing::debug!(
        session_id = %session_id,
        remaining_seconds,
        scanned_count,
        "Attendance session tick"
    );
}

/// Log the final tally
pub fn log_session_finalized(result: &AttendanceResult) {
    tracing::info!(
        session_id = %result.session_id,
        class_id = %result.class_id,
        present = result.present,
        absent = result.absent,
        rate = result.rate,
        scanned_count = result.scanned_count,
        "Attendance session finalized"
    );
}

/// Log a session that ended without a tally
pub fn log_session_cancelled(session_id: &str, class_id: &str, reason: &str) {
    tracing::info!(
        session_id = %session_id,
        class_id = %class_id,
        reason = %reason,
        "Attendance session cancelled"
    );
}

/// Log a store key served from embedded defaults
pub fn log_store_fallback(key: &str) {
    tracing::info!(key = %key, "No saved data, using embedded defaults");
}

/// Log a stored record left out because it failed validation
pub fn log_invalid_record(key: &str, record_id: &str, error: &RecordValidationError) {
    tracing::warn!(
        key = %key,
        record_id = %record_id,
        error = %error,
        "Skipping invalid stored record"
    );
}

/// Log error with context
pub fn log_error(error: &str, context: &str) {
    tracing::error!(error = %error, context = %context, "Application error occurred");
}
