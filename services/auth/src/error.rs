//! Custom error types for the authentication service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::auth::TokenError;
use common::error::DatabaseError;
use media::MediaError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    /// No usable session token
    #[error("Authentication required")]
    Unauthenticated,

    /// Unknown email or wrong password; deliberately indistinguishable
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    /// Username or email already taken
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Upload exceeds the size limit")]
    PayloadTooLarge,

    #[error("Media upload failed: {0}")]
    MediaUpload(#[source] MediaError),

    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Internal server error")]
    InternalServerError,
}

impl From<MediaError> for AuthError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::UnsupportedType(content_type) => AuthError::Validation(format!(
                "Profile pictures must be JPEG or PNG, got {}",
                content_type
            )),
            MediaError::Stream(reason) => {
                AuthError::Validation(format!("Malformed upload: {}", reason))
            }
            MediaError::TooLarge(_) => AuthError::PayloadTooLarge,
            other => AuthError::MediaUpload(other),
        }
    }
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::Unauthenticated | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
            AuthError::Conflict(_) => StatusCode::CONFLICT,
            AuthError::NotFound(_) => StatusCode::NOT_FOUND,
            AuthError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AuthError::MediaUpload(_)
            | AuthError::Storage(_)
            | AuthError::Token(_)
            | AuthError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            AuthError::MediaUpload(e) => {
                error!("Media upload error: {}", e);
                "Media could not be uploaded".to_string()
            }
            AuthError::Storage(e) => {
                error!("Storage error: {}", e);
                "Database error".to_string()
            }
            AuthError::Token(e) => {
                error!("Token error: {}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
