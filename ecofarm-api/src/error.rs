//! Error types for ecofarm-api
//!
//! Every handler failure becomes `{"error": {"code", "message"}}`. Provider
//! and store failures reach the client as a generic notice; the detail is
//! logged here and never echoed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ecofarm_common::Error;
use serde_json::json;
use thiserror::Error;

/// Notice shown when any step of a weather fetch or refresh fails
pub const WEATHER_FAILURE: &str = "Failed to fetch weather data";

/// Notice shown when recommendation generation fails
pub const RECOMMENDATION_FAILURE: &str = "Failed to generate recommendations";

/// Notice shown when the chat relay fails
pub const CHAT_FAILURE: &str = "Failed to get chat response";

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed acting user (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// A named operation failed; clients see `notice` unless the cause is safe to show
    #[error("{notice}: {source}")]
    Operation {
        notice: &'static str,
        #[source]
        source: Error,
    },

    /// ecofarm-common error
    #[error(transparent)]
    Common(#[from] Error),
}

impl ApiError {
    /// Wrap a common error with the user-facing notice of the failed operation
    pub fn operation(notice: &'static str) -> impl FnOnce(Error) -> ApiError {
        move |source| ApiError::Operation { notice, source }
    }
}

/// Status and machine-readable code for a common error
fn classify(err: &Error) -> (StatusCode, &'static str) {
    match err {
        Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR"),
        Error::UpstreamUnavailable(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE"),
        Error::MalformedResponse(_) => (StatusCode::BAD_GATEWAY, "MALFORMED_RESPONSE"),
        Error::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
        Error::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        Error::InvalidInput(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        Error::Io(_) | Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    }
}

/// Whether the error text may be shown to clients verbatim
fn is_safe_to_show(err: &Error) -> bool {
    matches!(
        err,
        Error::Config(_) | Error::NotFound(_) | Error::InvalidInput(_)
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Operation { notice, source } => {
                let (status, code) = classify(&source);
                tracing::error!(code, error = %source, "{}", notice);
                let message = if is_safe_to_show(&source) {
                    source.to_string()
                } else {
                    notice.to_string()
                };
                (status, code, message)
            }
            ApiError::Common(err) => {
                let (status, code) = classify(&err);
                let message = if is_safe_to_show(&err) {
                    err.to_string()
                } else {
                    tracing::error!(code, error = %err, "Request failed");
                    "Internal server error".to_string()
                };
                (status, code, message)
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
