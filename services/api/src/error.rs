//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use media::MediaError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed or missing input
    #[error("{0}")]
    Validation(String),

    /// No usable session token
    #[error("Authentication required")]
    Unauthenticated,

    /// Valid caller, insufficient role
    #[error("{0}")]
    Forbidden(String),

    /// Referenced entity absent
    #[error("{0}")]
    NotFound(String),

    /// Request body over the upload limit
    #[error("Upload exceeds the size limit")]
    PayloadTooLarge,

    /// Remote asset host failure
    #[error("Media upload failed: {0}")]
    MediaUpload(#[source] MediaError),

    /// Persistence failure
    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl From<MediaError> for ApiError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::UnsupportedType(content_type) => ApiError::Validation(format!(
                "Only image and video files can be attached, got {}",
                content_type
            )),
            MediaError::Stream(reason) => {
                ApiError::Validation(format!("Malformed upload: {}", reason))
            }
            MediaError::TooLarge(_) => ApiError::PayloadTooLarge,
            other => ApiError::MediaUpload(other),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::MediaUpload(_) | ApiError::Storage(_) | ApiError::InternalServerError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            ApiError::MediaUpload(e) => {
                error!("Media upload error: {}", e);
                "Media could not be uploaded".to_string()
            }
            ApiError::Storage(e) => {
                error!("Storage error: {}", e);
                "Database error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
