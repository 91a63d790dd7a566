//! Error types for the media layer.

use thiserror::Error;

/// Result type alias for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while talking to the media service.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Transport-level failure (connect, TLS, timeout, body decode).
    #[error("media service request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Reading the local file to upload failed.
    #[error("media file i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The service answered with a non-success status.
    #[error("media service rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The service answered 2xx but the body was not what we expected.
    #[error("invalid media service response: {0}")]
    InvalidResponse(String),

    /// Missing or invalid configuration.
    #[error("media configuration error: {0}")]
    Config(String),
}
