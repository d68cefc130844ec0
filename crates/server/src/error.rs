// crates/server/src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use yearbook_db::DbError;
use yearbook_github::UpstreamError;

use crate::aggregate::AggregationError;

/// Structured JSON error response for API errors
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// API error types that map to HTTP status codes
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("GitHub user not found: {0}")]
    SubjectNotFound(String),

    #[error("GitHub rejected the credential")]
    Unauthorized,

    #[error("GitHub unavailable: {0}")]
    Upstream(String),

    #[error("Unexpected GitHub response: {0}")]
    Malformed(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Unauthorized => ApiError::Unauthorized,
            UpstreamError::SubjectNotFound(s) => ApiError::SubjectNotFound(s),
            UpstreamError::Unavailable(msg) => ApiError::Upstream(msg),
            UpstreamError::Malformed(msg) => ApiError::Malformed(msg),
        }
    }
}

impl From<AggregationError> for ApiError {
    fn from(err: AggregationError) -> Self {
        match err {
            AggregationError::Upstream(up) => up.into(),
            AggregationError::Store(db) => ApiError::Database(db),
            AggregationError::InvalidRange(msg) => ApiError::BadRequest(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            ApiError::SubjectNotFound(subject) => {
                tracing::warn!(subject = %subject, "GitHub user not found");
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::with_details("GitHub user not found", subject.clone()),
                )
            }
            ApiError::Unauthorized => {
                tracing::warn!("GitHub rejected the credential");
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse::new("GitHub rejected the credential"),
                )
            }
            ApiError::Upstream(msg) => {
                tracing::error!(error = %msg, "GitHub unavailable");
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorResponse::with_details("GitHub unavailable", msg.clone()),
                )
            }
            ApiError::Malformed(msg) => {
                tracing::error!(error = %msg, "Unexpected GitHub response");
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorResponse::with_details("Unexpected GitHub response", msg.clone()),
                )
            }
            ApiError::Database(db_err) => {
                tracing::error!(error = %db_err, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::with_details("Database error", db_err.to_string()),
                )
            }
            ApiError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new(format!("Not found: {what}")),
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(msg.clone()),
            ),
        };

        (status, Json(error_response)).into_response()
    }
}
