//! Router tests against a running MongoDB.
//! Run with: cargo test --features integration-tests

#![cfg(feature = "integration-tests")]

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use http::{Request, StatusCode, header};
use mongodb::bson::{Document, doc, oid::ObjectId};
use serde_json::{Value, json};
use tower::ServiceExt;
use vidtube_media::{MediaError, MediaResult, MediaStorage, UploadedMedia};
use vidtube_server::{AppState, ServerConfig, routes::build_router};
use vidtube_store::schema::collections;
use vidtube_store::vidtube_core::ResourceType;
use vidtube_store::{Store, StoreConfig};

const BOUNDARY: &str = "vidtube-test-boundary";

/// Media backend that hands out fake assets and remembers deletions.
#[derive(Default)]
struct RecordingMedia {
    uploads: AtomicUsize,
    fail_images: AtomicBool,
    deleted: Mutex<Vec<String>>,
}

impl RecordingMedia {
    fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaStorage for RecordingMedia {
    async fn upload(&self, _path: &Path, resource_type: ResourceType) -> MediaResult<UploadedMedia> {
        if resource_type == ResourceType::Image && self.fail_images.load(Ordering::SeqCst) {
            return Err(MediaError::InvalidResponse("image upload rejected".into()));
        }
        let n = self.uploads.fetch_add(1, Ordering::SeqCst);
        let public_id = format!("vidtube/{resource_type}-{n}");
        Ok(UploadedMedia {
            secure_url: format!("https://cdn.example/{public_id}"),
            public_id,
            resource_type,
            duration: (resource_type == ResourceType::Video).then_some(4.0),
        })
    }

    async fn delete(&self, public_id: &str, _resource_type: ResourceType) -> MediaResult<()> {
        self.deleted.lock().unwrap().push(public_id.to_string());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

struct Harness {
    app: Router,
    store: Store,
    media: Arc<RecordingMedia>,
}

impl Harness {
    async fn new() -> Self {
        let config = StoreConfig {
            database_url: std::env::var("MONGODB_URI")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            database_name: format!("vidtube_test_{}", ObjectId::new()),
            ..StoreConfig::default()
        };
        let store = Store::connect(config).await.expect("Failed to connect to MongoDB");
        let media = Arc::new(RecordingMedia::default());
        let server_config = ServerConfig {
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
        };
        let app = build_router(AppState::new(store.clone(), media.clone(), server_config));
        Self { app, store, media }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<String>, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let cookies = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, cookies, body)
    }

    async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Vec<String>, Value) {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn teardown(self) {
        self.store.database().drop().await.unwrap();
    }
}

/// Build a `multipart/form-data` body from text fields and `(name, filename, bytes)` files.
fn multipart(texts: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Body {
    let mut body = Vec::new();
    for (name, value) in texts {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (name, filename, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    Body::from(body)
}

fn multipart_request(uri: &str) -> http::request::Builder {
    Request::post(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    )
}

async fn register_and_login(h: &Harness, name: &str) -> Value {
    let body = multipart(
        &[
            ("fullname", "Test User"),
            ("email", &format!("{name}@example.com")),
            ("username", name),
            ("password", "correct-horse"),
        ],
        &[("avatar", "avatar.png", b"png-bytes")],
    );
    let request = multipart_request("/api/v1/users/register")
        .body(body)
        .unwrap();
    let (status, _, body) = h.send(request).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (status, cookies, body) = h
        .post_json(
            "/api/v1/users/login",
            json!({ "email": format!("{name}@example.com"), "password": "correct-horse" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(cookies.iter().any(|c| c.starts_with("accessToken=")));
    assert!(cookies.iter().any(|c| c.starts_with("refreshToken=")));
    body["data"].clone()
}

fn user_id(login: &Value) -> ObjectId {
    ObjectId::parse_str(login["user"]["_id"].as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn test_refresh_rotates_and_rejects_reuse() {
    let h = Harness::new().await;
    let login = register_and_login(&h, "rotator").await;
    let old_token = login["refreshToken"].as_str().unwrap().to_string();

    let (status, cookies, body) = h
        .post_json(
            "/api/v1/users/refresh-token",
            json!({ "refreshToken": old_token }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Access token refreshed");
    assert!(cookies.iter().any(|c| c.starts_with("accessToken=")));
    assert!(cookies.iter().any(|c| c.starts_with("refreshToken=")));

    let new_token = body["data"]["refreshToken"].as_str().unwrap().to_string();
    assert_ne!(new_token, old_token);
    let stored = h.store.get_user(user_id(&login)).await.unwrap();
    assert_eq!(stored.refresh_token.as_deref(), Some(new_token.as_str()));

    let (status, _, body) = h
        .post_json(
            "/api/v1/users/refresh-token",
            json!({ "refreshToken": old_token }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Refresh token is expired or used");
    assert_eq!(body["code"], "UNAUTHORIZED");

    h.teardown().await;
}

#[tokio::test]
async fn test_refresh_for_deleted_user_is_rejected() {
    let h = Harness::new().await;
    let login = register_and_login(&h, "leaver").await;
    let token = login["refreshToken"].as_str().unwrap().to_string();

    h.store
        .database()
        .collection::<Document>(collections::USERS)
        .delete_one(doc! { "_id": user_id(&login) })
        .await
        .unwrap();

    let (status, _, body) = h
        .post_json("/api/v1/users/refresh-token", json!({ "refreshToken": token }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid refresh token");

    h.teardown().await;
}

#[tokio::test]
async fn test_failed_thumbnail_discards_uploaded_video() {
    let h = Harness::new().await;
    let login = register_and_login(&h, "uploader").await;
    let access = login["accessToken"].as_str().unwrap().to_string();

    h.media.fail_images.store(true, Ordering::SeqCst);
    let body = multipart(
        &[("title", "First video"), ("description", "Hello")],
        &[
            ("videoFile", "clip.mp4", b"mp4-bytes"),
            ("thumbnail", "thumb.png", b"png-bytes"),
        ],
    );
    let request = multipart_request("/api/v1/videos/upload-video")
        .header(header::AUTHORIZATION, format!("Bearer {access}"))
        .body(body)
        .unwrap();
    let (status, _, body) = h.send(request).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "MEDIA_ERROR");
    assert_eq!(h.media.deleted(), vec!["vidtube/video-1".to_string()]);

    let videos = h.store.videos_by_owner(user_id(&login), false).await.unwrap();
    assert!(videos.is_empty());

    h.teardown().await;
}
