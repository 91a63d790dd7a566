//! Error types for the storage layer.

use mongodb::bson::oid::ObjectId;
use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// MongoDB server error code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Driver or server error.
    #[error("database error: {0}")]
    Database(mongodb::error::Error),

    /// User not found.
    #[error("user not found: {0}")]
    UserNotFound(ObjectId),

    /// Video not found.
    #[error("video not found: {0}")]
    VideoNotFound(ObjectId),

    /// Comment not found.
    #[error("comment not found: {0}")]
    CommentNotFound(ObjectId),

    /// Tweet not found.
    #[error("tweet not found: {0}")]
    TweetNotFound(ObjectId),

    /// Playlist not found.
    #[error("playlist not found: {0}")]
    PlaylistNotFound(ObjectId),

    /// A unique index rejected the write.
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// Encoding a value as BSON failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] mongodb::bson::ser::Error),

    /// Decoding a BSON document failed.
    #[error("deserialization error: {0}")]
    Deserialization(#[from] mongodb::bson::de::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl StoreError {
    /// Whether this error means the requested document does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound(_)
                | Self::VideoNotFound(_)
                | Self::CommentNotFound(_)
                | Self::TweetNotFound(_)
                | Self::PlaylistNotFound(_)
        )
    }
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        if is_duplicate_key(&err) {
            return Self::Duplicate(err.to_string());
        }
        Self::Database(err)
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        let id = ObjectId::new();
        assert!(StoreError::VideoNotFound(id).is_not_found());
        assert!(StoreError::PlaylistNotFound(id).is_not_found());
        assert!(!StoreError::Duplicate("users.email".into()).is_not_found());
        assert!(!StoreError::ConfigError("x".into()).is_not_found());
    }

    #[test]
    fn test_error_messages() {
        let id = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
        assert_eq!(
            StoreError::TweetNotFound(id).to_string(),
            "tweet not found: 507f1f77bcf86cd799439011"
        );
    }
}
