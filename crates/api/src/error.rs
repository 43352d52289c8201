use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use genflow_core::error::CoreError;
use genflow_scheduler::SchedulerError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`SchedulerError`] and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce consistent JSON error
/// responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `genflow_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A submission rejected by the scheduler.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::InvalidTransition { .. } => {
                    (StatusCode::CONFLICT, "CONFLICT", core.to_string())
                }
            },

            // --- Scheduler errors ---
            AppError::Scheduler(err) => match err {
                SchedulerError::UnknownService(_) => {
                    (StatusCode::NOT_FOUND, "UNKNOWN_SERVICE", err.to_string())
                }
                SchedulerError::ShutDown => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SHUTTING_DOWN",
                    err.to_string(),
                ),
                SchedulerError::InvalidService { .. } => internal(&err.to_string()),
            },

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => internal(msg),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Log the detail and return a sanitized 500.
fn internal(detail: &str) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %detail, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
