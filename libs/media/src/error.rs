//! Error types for media staging and hosting

use thiserror::Error;

/// Errors raised while staging or hosting media
#[derive(Error, Debug)]
pub enum MediaError {
    /// Local staging I/O failed
    #[error("Media staging error: {0}")]
    Io(#[from] std::io::Error),

    /// The part is neither an image nor a video
    #[error("Unsupported media type: {0}")]
    UnsupportedType(String),

    /// The asset host rejected or failed an upload
    #[error("Failed to upload {key}: {reason}")]
    Upload { key: String, reason: String },

    /// The asset host failed to remove an asset
    #[error("Failed to delete {key}: {reason}")]
    Delete { key: String, reason: String },

    /// Reading a multipart part failed mid-stream
    #[error("Failed to read upload stream: {0}")]
    Stream(String),

    /// The request body hit the upload size limit
    #[error("Upload exceeds the size limit: {0}")]
    TooLarge(String),

    /// Configuration error
    #[error("Media configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with MediaError
pub type MediaResult<T> = Result<T, MediaError>;
