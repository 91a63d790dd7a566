//! Multipart upload handling.
//!
//! File parts are streamed to named temporary files so large videos never
//! sit in memory. The temporary files are deleted when the [`UploadForm`]
//! (or a [`SpooledFile`] taken out of it) is dropped, which covers every
//! exit path of a handler.
//!
//! Media already pushed to the media service is not covered by that; when a
//! later step fails, handlers call [`discard_uploads`] to delete it again.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use vidtube_core::{MediaAsset, ResourceType};
use vidtube_media::{MediaStorage, UploadedMedia};

use crate::error::{ApiError, ApiResult, capitalize};

/// Fields a route accepts.
#[derive(Debug, Clone, Copy)]
pub struct FormSpec {
    pub text_fields: &'static [&'static str],
    pub file_fields: &'static [&'static str],
}

/// A file part spooled to disk.
#[derive(Debug)]
pub struct SpooledFile {
    file: NamedTempFile,
    pub original_name: Option<String>,
    pub size: u64,
}

impl SpooledFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Parsed multipart form: text values and spooled files by field name.
#[derive(Debug, Default)]
pub struct UploadForm {
    text: HashMap<String, String>,
    files: HashMap<String, SpooledFile>,
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("Upload exceeds the maximum allowed size".to_string())
    } else {
        ApiError::BadRequest(format!("Failed to read multipart: {}", e.body_text()))
    }
}

fn spool_error(e: std::io::Error) -> ApiError {
    ApiError::Internal(format!("Failed to spool upload: {}", e))
}

impl UploadForm {
    /// Read every part of `multipart`, accepting only the fields in `spec`.
    ///
    /// Unknown fields and repeated fields are rejected with 400. File parts
    /// that arrive empty (an unset optional file input) are ignored.
    pub async fn read(
        mut multipart: Multipart,
        spec: FormSpec,
        tmp_dir: Option<&PathBuf>,
    ) -> ApiResult<Self> {
        let mut form = Self::default();

        while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().map(|s| s.to_string()).unwrap_or_default();

            if spec.text_fields.contains(&name.as_str()) {
                if form.text.contains_key(&name) {
                    return Err(ApiError::BadRequest(format!(
                        "Field '{name}' was sent more than once"
                    )));
                }
                let value = field.text().await.map_err(multipart_error)?;
                form.text.insert(name, value);
                continue;
            }

            if !spec.file_fields.contains(&name.as_str()) {
                return Err(ApiError::BadRequest(format!("Unexpected field '{name}'")));
            }
            if form.files.contains_key(&name) {
                return Err(ApiError::BadRequest(format!(
                    "Only one file is allowed in '{name}'"
                )));
            }

            let original_name = field.file_name().map(|s| s.to_string());
            let temp = match tmp_dir {
                Some(dir) => NamedTempFile::new_in(dir),
                None => NamedTempFile::new(),
            }
            .map_err(spool_error)?;
            let mut writer =
                tokio::fs::File::from_std(temp.as_file().try_clone().map_err(spool_error)?);

            let mut size = 0u64;
            while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                size += chunk.len() as u64;
                writer.write_all(&chunk).await.map_err(spool_error)?;
            }
            writer.flush().await.map_err(spool_error)?;

            if size == 0 {
                continue;
            }
            tracing::debug!(field = %name, size, "Spooled upload");
            form.files.insert(
                name,
                SpooledFile {
                    file: temp,
                    original_name,
                    size,
                },
            );
        }

        Ok(form)
    }

    /// Text value of `name`, if sent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.text.get(name).map(String::as_str)
    }

    /// Take the spooled file sent as `name`.
    pub fn take_file(&mut self, name: &str) -> Option<SpooledFile> {
        self.files.remove(name)
    }

    /// Take a required file or fail with 400.
    pub fn require_file(&mut self, name: &str) -> ApiResult<SpooledFile> {
        self.take_file(name)
            .ok_or_else(|| ApiError::BadRequest(format!("{} is required", field_label(name))))
    }
}

/// Human label for a camelCase form field: `coverImage` becomes "Cover image".
fn field_label(name: &str) -> String {
    let mut words = String::with_capacity(name.len() + 2);
    for c in name.chars() {
        if c.is_uppercase() && !words.is_empty() {
            words.push(' ');
        }
        words.extend(c.to_lowercase());
    }
    capitalize(&words)
}

/// Push a spooled file to media storage.
pub async fn upload_spooled(
    media: &dyn MediaStorage,
    file: &SpooledFile,
    resource_type: ResourceType,
) -> ApiResult<UploadedMedia> {
    let uploaded = media.upload(file.path(), resource_type).await?;
    tracing::info!(
        public_id = %uploaded.public_id,
        resource_type = %uploaded.resource_type,
        size = file.size,
        "Uploaded media"
    );
    Ok(uploaded)
}

/// Delete media that was uploaded for a request that then failed.
///
/// Best effort: failures are logged and not retried.
pub async fn discard_uploads(media: &dyn MediaStorage, uploads: &[UploadedMedia]) {
    for upload in uploads {
        match media.delete(&upload.public_id, upload.resource_type).await {
            Ok(()) => tracing::info!(public_id = %upload.public_id, "Discarded uploaded media"),
            Err(e) => tracing::warn!(
                public_id = %upload.public_id,
                error = %e,
                "Failed to discard uploaded media"
            ),
        }
    }
}

/// Delete an asset that is no longer referenced. Best effort.
pub async fn release_asset(media: &dyn MediaStorage, asset: &MediaAsset, resource_type: ResourceType) {
    if let Err(e) = media.delete(&asset.public_id, resource_type).await {
        tracing::warn!(public_id = %asset.public_id, error = %e, "Failed to delete media");
    }
}
