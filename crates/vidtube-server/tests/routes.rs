//! Router-level tests for behavior decided before any database round trip:
//! authentication gates, id validation and the response envelope.
//!
//! The store is backed by a lazily connecting MongoDB client, so nothing
//! here needs a running database.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use http::{Method, Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;
use vidtube_media::{MediaError, MediaResult, MediaStorage, UploadedMedia};
use vidtube_server::{AppState, ServerConfig, routes::build_router};
use vidtube_store::Store;
use vidtube_store::vidtube_core::ResourceType;

struct OfflineMedia;

#[async_trait]
impl MediaStorage for OfflineMedia {
    async fn upload(&self, _path: &Path, _resource_type: ResourceType) -> MediaResult<UploadedMedia> {
        Err(MediaError::Config("offline".into()))
    }

    async fn delete(&self, _public_id: &str, _resource_type: ResourceType) -> MediaResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "offline"
    }
}

fn config() -> ServerConfig {
    ServerConfig {
        port: 0,
        log_level: "warn".into(),
        cors_origin: "*".into(),
        access_token_secret: "test-access-secret".into(),
        refresh_token_secret: "test-refresh-secret".into(),
        access_token_expiry_minutes: 15,
        refresh_token_expiry_days: 10,
        secure_cookies: false,
        max_upload_bytes: 1024 * 1024,
        upload_tmp_dir: None,
    }
}

async fn app() -> Router {
    let client = mongodb::Client::with_uri_str("mongodb://127.0.0.1:27017")
        .await
        .unwrap();
    let store = Store::from_client(client, "vidtube_router_tests");
    build_router(AppState::new(store, Arc::new(OfflineMedia), config()))
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = app().await.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn assert_error_envelope(body: &Value, status: StatusCode, code: &str) {
    assert_eq!(body["statusCode"], status.as_u16());
    assert_eq!(body["success"], false);
    assert!(body["data"].is_null());
    assert_eq!(body["code"], code);
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
}

#[tokio::test]
async fn test_health_is_public() {
    let (status, body) = send(get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_protected_routes_require_a_token() {
    let protected = [
        (Method::GET, "/api/v1/users/current-user"),
        (Method::GET, "/api/v1/users/history"),
        (Method::POST, "/api/v1/users/logout"),
        (Method::GET, "/api/v1/videos/get-videos-by-userId"),
        (Method::GET, "/api/v1/likes/get-liked-vids"),
        (Method::GET, "/api/v1/subscriptions/get-subscribed-channels"),
        (Method::GET, "/api/v1/tweets/get-users-tweets"),
        (Method::POST, "/api/v1/subscriptions/toggle-sub/65f1a2b3c4d5e6f708091a2b"),
        (Method::DELETE, "/api/v1/playlist/delete-playlist/65f1a2b3c4d5e6f708091a2b"),
    ];

    for (method, uri) in protected {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_error_envelope(&body, StatusCode::UNAUTHORIZED, "UNAUTHORIZED");
        assert_eq!(body["message"], "Unauthorized request");
    }
}

#[tokio::test]
async fn test_malformed_bearer_token_is_rejected() {
    let request = Request::get("/api/v1/users/current-user")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid access token");
}

#[tokio::test]
async fn test_public_routes_validate_ids() {
    let uris = [
        "/api/v1/comments/get-comments/not-an-id",
        "/api/v1/subscriptions/get-subscribers/not-an-id",
        "/api/v1/playlist/playlist-by-id/not-an-id",
        "/api/v1/playlist/user-playlists/not-an-id",
        "/api/v1/dashboard/channel-stats/not-an-id",
        "/api/v1/dashboard/channel-videos/not-an-id",
        "/api/v1/tweets/user/not-an-id",
    ];

    for uri in uris {
        let (status, body) = send(get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_error_envelope(&body, StatusCode::BAD_REQUEST, "BAD_REQUEST");
    }
}

#[tokio::test]
async fn test_refresh_without_token_is_unauthorized() {
    let request = Request::post("/api/v1/users/refresh-token")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error_envelope(&body, StatusCode::UNAUTHORIZED, "UNAUTHORIZED");
}

#[tokio::test]
async fn test_refresh_with_garbage_token_is_unauthorized() {
    let request = Request::post("/api/v1/users/refresh-token")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"refreshToken": "garbage"}"#))
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid refresh token");
}

#[tokio::test]
async fn test_login_requires_email() {
    let request = Request::post("/api/v1/users/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"password": "hunter22"}"#))
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_envelope(&body, StatusCode::BAD_REQUEST, "BAD_REQUEST");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let response = app().await.oneshot(get("/api/v1/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_json_uses_error_envelope() {
    let request = Request::post("/api/v1/users/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_envelope(&body, StatusCode::BAD_REQUEST, "BAD_REQUEST");
}

#[tokio::test]
async fn test_json_without_content_type_uses_error_envelope() {
    let request = Request::post("/api/v1/users/login")
        .body(Body::from(r#"{"email": "a@b.c", "password": "hunter22"}"#))
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_error_envelope(
        &body,
        StatusCode::UNSUPPORTED_MEDIA_TYPE,
        "UNSUPPORTED_MEDIA_TYPE",
    );
}

#[tokio::test]
async fn test_bad_query_uses_error_envelope() {
    let (status, body) =
        send(get("/api/v1/comments/get-comments/65f1a2b3c4d5e6f708091a2b?page=abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_envelope(&body, StatusCode::BAD_REQUEST, "BAD_REQUEST");
}

#[tokio::test]
async fn test_register_without_multipart_uses_error_envelope() {
    let request = Request::post("/api/v1/users/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_envelope(&body, StatusCode::BAD_REQUEST, "BAD_REQUEST");
}
