//! Request extractors that reject with [`ApiError`].
//!
//! The stock axum extractors answer a bad body, query or path with a plain
//! text response. These wrappers convert the rejection so every error a
//! client sees uses the JSON error envelope.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Multipart, Path, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON body extractor. Use instead of [`Json`] in handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state).await?;
        Ok(Self(inner))
    }
}

/// Query string extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(inner) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(inner))
    }
}

/// Path parameter extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(inner) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(inner))
    }
}

/// Multipart body extractor.
#[derive(Debug)]
pub struct ValidatedMultipart(pub Multipart);

impl<S> FromRequest<S> for ValidatedMultipart
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(Multipart::from_request(req, state).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{StatusCode, header};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct TitleBody {
        title: String,
    }

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Page {
        page: u32,
    }

    fn json_request(content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = axum::http::Request::post("/");
        if let Some(ct) = content_type {
            builder = builder.header(header::CONTENT_TYPE, ct);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn test_json_body_is_extracted() {
        let req = json_request(Some("application/json"), r#"{"title": "vid"}"#);
        let ValidatedJson(body) = ValidatedJson::<TitleBody>::from_request(req, &()).await.unwrap();
        assert_eq!(body.title, "vid");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let req = json_request(Some("application/json"), "{not json");
        let err = ValidatedJson::<TitleBody>::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.public_message().starts_with("Invalid request"));
    }

    #[tokio::test]
    async fn test_missing_content_type_is_unsupported() {
        let req = json_request(None, r#"{"title": "vid"}"#);
        let err = ValidatedJson::<TitleBody>::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_bad_query_is_bad_request() {
        let (mut parts, _) = axum::http::Request::get("/?page=abc")
            .body(())
            .unwrap()
            .into_parts();
        let err = ValidatedQuery::<Page>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_multipart_without_boundary_is_bad_request() {
        let req = json_request(Some("application/json"), "{}");
        let err = ValidatedMultipart::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
