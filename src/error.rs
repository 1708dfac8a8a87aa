use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Closed set of user-facing request failures. Everything the handlers can
/// return funnels through here so the status/envelope mapping lives in one place.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed input: missing/blank title, bad status value, out-of-range
    /// pagination, malformed task id. Maps to 400.
    #[error("{0}")]
    Validation(String),

    /// Well-formed id with no matching record, or an unmatched route. Maps to 404.
    #[error("{0}")]
    NotFound(String),

    /// Anything else — storage failures, unexpected errors. Maps to 500 with a
    /// generic message; the underlying error is logged, never leaked.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Internal(err) => {
                error!(err = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}
