//! Media storage abstraction.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vidtube_core::{MediaAsset, ResourceType};

use crate::error::MediaResult;

/// An asset accepted by the media service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedMedia {
    /// HTTPS URL of the stored asset.
    pub secure_url: String,
    /// Opaque identifier needed to delete the asset.
    pub public_id: String,
    /// Resource class the service stored the asset under.
    pub resource_type: ResourceType,
    /// Duration in seconds, reported for audio/video assets.
    pub duration: Option<f64>,
}

impl UploadedMedia {
    /// The `{url, public_id}` pair persisted on documents.
    pub fn asset(&self) -> MediaAsset {
        MediaAsset::new(self.secure_url.clone(), self.public_id.clone())
    }
}

/// Storage backend for user-supplied media.
///
/// Implementations upload a local file and hand back a public URL plus an
/// opaque id, and delete by that id. The server only ever talks to the
/// media service through this trait.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Upload the file at `path`.
    async fn upload(&self, path: &Path, resource_type: ResourceType)
    -> MediaResult<UploadedMedia>;

    /// Delete a previously uploaded asset. Deleting an asset that no longer
    /// exists is not an error.
    async fn delete(&self, public_id: &str, resource_type: ResourceType) -> MediaResult<()>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}
