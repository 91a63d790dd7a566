//! Cloudinary implementation of [`MediaStorage`].
//!
//! Uploads and deletes go through Cloudinary's signed REST endpoints:
//!
//! - `POST {base}/{cloud}/{resource_type}/upload`
//! - `POST {base}/{cloud}/{resource_type}/destroy`
//!
//! Each request carries `api_key`, `timestamp` and a `signature` computed
//! over the other parameters (see [`sign_params`]).

use std::env;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Body;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use tokio_util::io::ReaderStream;
use vidtube_core::ResourceType;

use crate::error::{MediaError, MediaResult};
use crate::traits::{MediaStorage, UploadedMedia};

/// Default Cloudinary API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Default folder all uploads are placed under.
pub const DEFAULT_FOLDER: &str = "vidtube";

/// Cloudinary account configuration.
#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// Folder prefix for uploaded assets.
    pub folder: String,
    /// API base URL, overridable for testing against a stub.
    pub api_base: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("folder", &self.folder)
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl CloudinaryConfig {
    /// Create configuration from environment variables.
    ///
    /// Reads:
    /// - `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET` - Required
    /// - `CLOUDINARY_FOLDER` - Optional, defaults to "vidtube"
    /// - `CLOUDINARY_API_BASE` - Optional, defaults to the public API
    /// - `CLOUDINARY_TIMEOUT_SECS` - Optional, defaults to 120
    pub fn from_env() -> MediaResult<Self> {
        let required = |name: &str| {
            env::var(name).map_err(|_| {
                MediaError::Config(format!("{} environment variable not set", name))
            })
        };

        let timeout_secs = env::var("CLOUDINARY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(120);

        Ok(Self {
            cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
            api_key: required("CLOUDINARY_API_KEY")?,
            api_secret: required("CLOUDINARY_API_SECRET")?,
            folder: env::var("CLOUDINARY_FOLDER").unwrap_or_else(|_| DEFAULT_FOLDER.to_string()),
            api_base: env::var("CLOUDINARY_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Endpoint URL for `action` ("upload" or "destroy") on a resource type.
    pub fn endpoint(&self, resource_type: ResourceType, action: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.api_base.trim_end_matches('/'),
            self.cloud_name,
            resource_type.as_str(),
            action
        )
    }
}

/// Compute a Cloudinary request signature.
///
/// Parameters with empty values are dropped, the rest are sorted by name,
/// joined as `k=v` pairs with `&`, the API secret is appended, and the
/// SHA-1 digest is hex encoded.
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, &str)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
    #[serde(default)]
    resource_type: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

/// Pull `error.message` out of a failure body, falling back to the raw text.
fn rejection_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

fn parse_upload(body: &str, requested: ResourceType) -> MediaResult<UploadedMedia> {
    let response: UploadResponse = serde_json::from_str(body)
        .map_err(|e| MediaError::InvalidResponse(format!("upload response: {}", e)))?;

    let resource_type = match response.resource_type.as_deref() {
        Some(reported) => ResourceType::from_reported(reported),
        None => requested,
    };

    Ok(UploadedMedia {
        secure_url: response.secure_url,
        public_id: response.public_id,
        resource_type,
        duration: response.duration,
    })
}

// ============================================================================
// Client
// ============================================================================

/// Cloudinary-backed media storage.
#[derive(Debug, Clone)]
pub struct CloudinaryStorage {
    config: CloudinaryConfig,
    client: reqwest::Client,
}

impl CloudinaryStorage {
    /// Create a client for the given account.
    pub fn new(config: CloudinaryConfig) -> MediaResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, client })
    }

    /// Account configuration.
    pub fn config(&self) -> &CloudinaryConfig {
        &self.config
    }

    fn timestamp() -> String {
        chrono::Utc::now().timestamp().to_string()
    }

    async fn read_response(response: reqwest::Response) -> MediaResult<String> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(MediaError::Rejected {
                status: status.as_u16(),
                message: rejection_message(&body),
            });
        }
        Ok(body)
    }
}

/// Multipart file part streamed from disk, plus its length in bytes.
async fn file_part(path: &Path) -> MediaResult<(Part, u64)> {
    let file = tokio::fs::File::open(path).await?;
    let size = file.metadata().await?.len();
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();
    let body = Body::wrap_stream(ReaderStream::new(file));
    Ok((Part::stream_with_length(body, size).file_name(file_name), size))
}

#[async_trait]
impl MediaStorage for CloudinaryStorage {
    async fn upload(
        &self,
        path: &Path,
        resource_type: ResourceType,
    ) -> MediaResult<UploadedMedia> {
        let (part, size) = file_part(path).await?;

        let timestamp = Self::timestamp();
        let signature = sign_params(
            &[
                ("folder", self.config.folder.as_str()),
                ("timestamp", timestamp.as_str()),
            ],
            &self.config.api_secret,
        );

        let form = Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("folder", self.config.folder.clone())
            .text("timestamp", timestamp)
            .text("signature", signature);

        let url = self.config.endpoint(resource_type, "upload");
        tracing::debug!(%url, size, "Uploading media");

        let response = self.client.post(&url).multipart(form).send().await?;
        let body = Self::read_response(response).await?;
        let uploaded = parse_upload(&body, resource_type)?;

        tracing::info!(
            public_id = %uploaded.public_id,
            resource_type = %uploaded.resource_type,
            size,
            "Media uploaded"
        );
        Ok(uploaded)
    }

    async fn delete(&self, public_id: &str, resource_type: ResourceType) -> MediaResult<()> {
        let timestamp = Self::timestamp();
        let signature = sign_params(
            &[("public_id", public_id), ("timestamp", timestamp.as_str())],
            &self.config.api_secret,
        );

        let params = [
            ("public_id", public_id.to_string()),
            ("api_key", self.config.api_key.clone()),
            ("timestamp", timestamp),
            ("signature", signature),
        ];

        let url = self.config.endpoint(resource_type, "destroy");
        let response = self.client.post(&url).form(&params).send().await?;
        let body = Self::read_response(response).await?;

        let destroyed: DestroyResponse = serde_json::from_str(&body)
            .map_err(|e| MediaError::InvalidResponse(format!("destroy response: {}", e)))?;

        match destroyed.result.as_str() {
            "ok" => {
                tracing::info!(%public_id, %resource_type, "Media deleted");
                Ok(())
            }
            "not found" => {
                tracing::warn!(%public_id, %resource_type, "Media already absent");
                Ok(())
            }
            other => Err(MediaError::InvalidResponse(format!(
                "unexpected destroy result: {}",
                other
            ))),
        }
    }

    fn name(&self) -> &'static str {
        "cloudinary"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> CloudinaryConfig {
        CloudinaryConfig {
            cloud_name: "demo".to_string(),
            api_key: "123".to_string(),
            api_secret: "secret".to_string(),
            folder: DEFAULT_FOLDER.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_sign_params_reference_vector() {
        let signature = sign_params(
            &[
                ("timestamp", "1315060510"),
                ("public_id", "sample_image"),
                ("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop"),
            ],
            "abcd",
        );
        assert_eq!(signature, "bfd09f95f331f558cbd1320e67aa8d488770583e");
    }

    #[test]
    fn test_sign_params_order_independent() {
        let a = sign_params(&[("folder", "vidtube"), ("timestamp", "1700000000")], "secret");
        let b = sign_params(&[("timestamp", "1700000000"), ("folder", "vidtube")], "secret");
        assert_eq!(a, b);
        assert_eq!(a, "86c5aaee1afe40edf5371aa0db08f767b4df65da");
    }

    #[test]
    fn test_sign_params_skips_empty_values() {
        let with_empty = sign_params(
            &[("folder", "vidtube"), ("tags", ""), ("timestamp", "1700000000")],
            "secret",
        );
        let without = sign_params(&[("folder", "vidtube"), ("timestamp", "1700000000")], "secret");
        assert_eq!(with_empty, without);
    }

    #[test]
    fn test_endpoint() {
        let mut config = test_config();
        assert_eq!(
            config.endpoint(ResourceType::Video, "upload"),
            "https://api.cloudinary.com/v1_1/demo/video/upload"
        );
        config.api_base = "http://localhost:9000/".to_string();
        assert_eq!(
            config.endpoint(ResourceType::Image, "destroy"),
            "http://localhost:9000/demo/image/destroy"
        );
    }

    #[test]
    fn test_debug_hides_secret() {
        let rendered = format!("{:?}", test_config());
        assert!(rendered.contains("demo"));
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn test_parse_upload_video() {
        let body = r#"{
            "public_id": "vidtube/abc",
            "secure_url": "https://res.cloudinary.com/demo/video/upload/vidtube/abc.mp4",
            "url": "http://res.cloudinary.com/demo/video/upload/vidtube/abc.mp4",
            "resource_type": "video",
            "duration": 12.5
        }"#;
        let uploaded = parse_upload(body, ResourceType::Image).unwrap();
        assert_eq!(uploaded.public_id, "vidtube/abc");
        assert_eq!(uploaded.resource_type, ResourceType::Video);
        assert_eq!(uploaded.duration, Some(12.5));
        assert_eq!(uploaded.asset().url, uploaded.secure_url);
    }

    #[test]
    fn test_parse_upload_without_resource_type() {
        let body = r#"{"public_id": "p", "secure_url": "https://x/p.png"}"#;
        let uploaded = parse_upload(body, ResourceType::Image).unwrap();
        assert_eq!(uploaded.resource_type, ResourceType::Image);
        let uploaded = parse_upload(body, ResourceType::Video).unwrap();
        assert_eq!(uploaded.resource_type, ResourceType::Video);
        assert_eq!(uploaded.duration, None);
    }

    #[test]
    fn test_parse_upload_rejects_garbage() {
        let err = parse_upload("not json", ResourceType::Image).unwrap_err();
        assert!(matches!(err, MediaError::InvalidResponse(_)));
    }

    #[test]
    fn test_rejection_message() {
        assert_eq!(
            rejection_message(r#"{"error": {"message": "Invalid Signature"}}"#),
            "Invalid Signature"
        );
        assert_eq!(rejection_message("  Bad Gateway \n"), "Bad Gateway");
    }

    #[tokio::test]
    async fn test_upload_missing_file_is_io_error() {
        let storage = CloudinaryStorage::new(test_config()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.mp4");
        let err = storage
            .upload(&missing, ResourceType::Video)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Io(_)));
    }

    #[tokio::test]
    async fn test_file_part_reports_length_from_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        tokio::fs::write(&path, vec![7u8; 4096]).await.unwrap();

        let (_, size) = file_part(&path).await.unwrap();
        assert_eq!(size, 4096);
    }
}
