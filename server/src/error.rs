use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use speech_core::SynthesisError;
use story_core::StoryError;

use crate::storage::StorageError;

/// Caller-facing retry hint attached to 429 responses, in seconds.
const RETRY_AFTER_SECS: &str = "5";

/// API error taxonomy. Upstream detail is logged server-side; callers
/// only see the classified kind plus a readable summary.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("User must be logged in.")]
    Unauthenticated,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    FailedPrecondition(String),

    #[error("The story service is busy. Please retry shortly.")]
    ResourceExhausted,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Generation failed: {0}")]
    Internal(String),
}

/// Error response structure
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::FailedPrecondition(_) => {
                (StatusCode::PRECONDITION_FAILED, self.to_string())
            }
            ApiError::ResourceExhausted => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Internal(detail) => {
                tracing::error!("internal error: {detail}");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
            code: status.as_u16(),
        });

        let mut response = (status, body).into_response();
        if status == StatusCode::TOO_MANY_REQUESTS {
            if let Ok(value) = header::HeaderValue::from_str(RETRY_AFTER_SECS) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<StoryError> for ApiError {
    fn from(err: StoryError) -> Self {
        match err {
            StoryError::RateLimited => ApiError::ResourceExhausted,
            StoryError::Validation(msg) | StoryError::Generation(msg) => {
                ApiError::Internal(format!("story generation failed: {msg}"))
            }
        }
    }
}

impl From<SynthesisError> for ApiError {
    fn from(err: SynthesisError) -> Self {
        ApiError::Internal(format!("speech synthesis failed: {err}"))
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Internal(format!("audio storage failed: {err}"))
    }
}
