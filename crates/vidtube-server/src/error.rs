//! API error types with JSON responses.
//!
//! Errors are rendered in the same envelope as successful responses, with
//! `data: null`, `success: false` and a machine readable `code`.

use axum::{
    Json,
    extract::multipart::MultipartRejection,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use vidtube_core::{InvalidId, ValidationError};
use vidtube_media::MediaError;
use vidtube_store::StoreError;

/// API error that can be returned from handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad request (400).
    #[error("{0}")]
    BadRequest(String),

    /// Unauthorized (401).
    #[error("{0}")]
    Unauthorized(String),

    /// Forbidden (403).
    #[error("{0}")]
    Forbidden(String),

    /// Not found (404).
    #[error("{0}")]
    NotFound(String),

    /// Conflict with existing data (409).
    #[error("{0}")]
    Conflict(String),

    /// Request body too large (413).
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Body sent with the wrong content type (415).
    #[error("{0}")]
    UnsupportedMediaType(String),

    /// Internal server error (500).
    #[error("internal error: {0}")]
    Internal(String),

    /// Store error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Media storage error (502).
    #[error("media storage error: {0}")]
    Media(#[from] MediaError),
}

impl ApiError {
    /// Get the error code string for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Self::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Store(e) if e.is_not_found() => "NOT_FOUND",
            Self::Store(StoreError::Duplicate(_)) => "CONFLICT",
            Self::Store(_) => "STORAGE_ERROR",
            Self::Media(_) => "MEDIA_ERROR",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Store(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Duplicate(_)) => StatusCode::CONFLICT,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Media(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message safe to return to the client.
    ///
    /// Server-side causes are replaced by a generic message; the full error
    /// is logged when the response is built.
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => "Something went wrong".to_string(),
            Self::Store(e) if e.is_not_found() => capitalize(&e.to_string()),
            Self::Store(StoreError::Duplicate(_)) => "Resource already exists".to_string(),
            Self::Store(_) => "Something went wrong".to_string(),
            Self::Media(_) => "Media storage is unavailable".to_string(),
            other => other.to_string(),
        }
    }
}

pub(crate) fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::BadRequest(capitalize(&err.to_string()))
    }
}

impl From<InvalidId> for ApiError {
    fn from(err: InvalidId) -> Self {
        Self::BadRequest(capitalize(&err.to_string()))
    }
}

/// Map an extractor rejection onto the error taxonomy, keeping its status
/// where the taxonomy has a matching variant.
fn from_rejection(status: StatusCode, body_text: String) -> ApiError {
    match status {
        StatusCode::PAYLOAD_TOO_LARGE => {
            ApiError::PayloadTooLarge("Request body exceeds the maximum allowed size".to_string())
        }
        StatusCode::UNSUPPORTED_MEDIA_TYPE => ApiError::UnsupportedMediaType(body_text),
        _ => ApiError::BadRequest(format!("Invalid request: {body_text}")),
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        from_rejection(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        from_rejection(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        from_rejection(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        from_rejection(rejection.status(), rejection.body_text())
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// HTTP status code, repeated in the body.
    pub status_code: u16,
    /// Always null.
    pub data: Option<()>,
    /// Human-readable error message.
    pub message: String,
    /// Always false.
    pub success: bool,
    /// Error code (e.g., "NOT_FOUND", "BAD_REQUEST").
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "Request failed");
        }

        let body = ErrorResponse {
            status_code: status.as_u16(),
            data: None,
            message: self.public_message(),
            success: false,
            code: self.code().to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use vidtube_core::ObjectId;

    #[test]
    fn test_store_errors_map_to_status() {
        let id = ObjectId::new();
        let not_found = ApiError::from(StoreError::VideoNotFound(id));
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.code(), "NOT_FOUND");
        assert!(not_found.public_message().starts_with("Video not found"));

        let duplicate = ApiError::from(StoreError::Duplicate("E11000".into()));
        assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);
        assert_eq!(duplicate.public_message(), "Resource already exists");

        let config = ApiError::from(StoreError::ConfigError("x".into()));
        assert_eq!(config.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_media_error_is_bad_gateway() {
        let err = ApiError::from(MediaError::InvalidResponse("no url".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.code(), "MEDIA_ERROR");
        assert!(!err.public_message().contains("no url"));
    }

    #[test]
    fn test_internal_message_is_hidden() {
        let err = ApiError::Internal("password hash corrupt".into());
        assert_eq!(err.public_message(), "Something went wrong");
    }

    #[test]
    fn test_validation_errors_are_bad_requests() {
        let err = ApiError::from(ValidationError::Required("title"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Title is required");
    }

    #[test]
    fn test_rejection_statuses_are_kept() {
        let too_large = from_rejection(StatusCode::PAYLOAD_TOO_LARGE, "length limit".into());
        assert_eq!(too_large.status_code(), StatusCode::PAYLOAD_TOO_LARGE);

        let media_type = from_rejection(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Expected request with `Content-Type: application/json`".into(),
        );
        assert_eq!(media_type.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(media_type.code(), "UNSUPPORTED_MEDIA_TYPE");

        let unprocessable = from_rejection(StatusCode::UNPROCESSABLE_ENTITY, "missing field".into());
        assert_eq!(unprocessable.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(unprocessable.public_message(), "Invalid request: missing field");
    }

    #[test]
    fn test_error_body_shape() {
        let body = ErrorResponse {
            status_code: 404,
            data: None,
            message: "Video not found".into(),
            success: false,
            code: "NOT_FOUND".into(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["statusCode"], 404);
        assert!(json["data"].is_null());
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "NOT_FOUND");
    }
}
