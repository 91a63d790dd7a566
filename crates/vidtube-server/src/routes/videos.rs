//! Video routes: publishing, lookup, watching and owner management.

use axum::{
    Router,
    extract::State,
    routing::{delete, get, patch, post},
};
use serde::{Deserialize, Serialize};
use vidtube_core::{ResourceType, parse_object_id, require_non_blank};
use vidtube_store::{NewVideo, VideoPatch};

use crate::auth::AuthenticatedUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ValidatedJson, ValidatedMultipart, ValidatedPath};
use crate::response::{ApiResponse, Empty};
use crate::state::AppState;
use crate::upload::{FormSpec, UploadForm, discard_uploads, release_asset, upload_spooled};
use crate::views::{VideoSummaryView, VideoView};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for update-video. At least one field must be present.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateVideoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration: Option<f64>,
}

impl UpdateVideoRequest {
    /// Validate and convert into a store patch.
    pub fn into_patch(self) -> ApiResult<VideoPatch> {
        let title = match self.title {
            Some(t) => Some(require_non_blank(Some(t.as_str()), "title")?.to_string()),
            None => None,
        };
        let description = match self.description {
            Some(d) => Some(require_non_blank(Some(d.as_str()), "description")?.to_string()),
            None => None,
        };
        let duration = self.duration.map(validate_duration).transpose()?;

        let patch = VideoPatch {
            title,
            description,
            duration,
        };
        if patch.is_empty() {
            return Err(ApiError::BadRequest(
                "Provide at least one of title, description or duration".to_string(),
            ));
        }
        Ok(patch)
    }
}

/// Response for the current user's video list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserVideosResponse {
    pub total_videos: usize,
    pub videos: Vec<VideoView>,
}

const UPLOAD_FORM: FormSpec = FormSpec {
    text_fields: &["title", "description", "duration"],
    file_fields: &["videoFile", "thumbnail"],
};

fn validate_duration(duration: f64) -> ApiResult<f64> {
    if duration.is_finite() && duration > 0.0 {
        Ok(duration)
    } else {
        Err(ApiError::BadRequest(
            "Duration must be a positive number of seconds".to_string(),
        ))
    }
}

fn parse_duration(raw: Option<&str>) -> ApiResult<Option<f64>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => {
            let value: f64 = s
                .parse()
                .map_err(|_| ApiError::BadRequest("Duration must be a number".to_string()))?;
            validate_duration(value).map(Some)
        }
        None => Ok(None),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/videos/upload-video - Publish a video.
async fn upload_video(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ValidatedMultipart(multipart): ValidatedMultipart,
) -> ApiResult<ApiResponse<VideoView>> {
    let mut form =
        UploadForm::read(multipart, UPLOAD_FORM, state.config().upload_tmp_dir.as_ref()).await?;

    let title = require_non_blank(form.text("title"), "title")?.to_string();
    let description = require_non_blank(form.text("description"), "description")?.to_string();
    let form_duration = parse_duration(form.text("duration"))?;

    let video_file = form.require_file("videoFile")?;
    let thumbnail_file = form.require_file("thumbnail")?;

    let media = state.media();
    let video_upload = upload_spooled(media, &video_file, ResourceType::Video).await?;
    let thumbnail_upload = match upload_spooled(media, &thumbnail_file, ResourceType::Image).await {
        Ok(upload) => upload,
        Err(e) => {
            discard_uploads(media, std::slice::from_ref(&video_upload)).await;
            return Err(e);
        }
    };
    let uploads = [video_upload, thumbnail_upload];

    let Some(duration) = form_duration.or(uploads[0].duration) else {
        discard_uploads(media, &uploads).await;
        return Err(ApiError::BadRequest(
            "Video duration could not be determined".to_string(),
        ));
    };

    let new_video = NewVideo {
        video_file: uploads[0].asset(),
        thumbnail: uploads[1].asset(),
        title,
        description,
        duration,
        owner: auth.id(),
    };

    let video = match state.store().insert_video(new_video).await {
        Ok(video) => video,
        Err(e) => {
            discard_uploads(media, &uploads).await;
            return Err(e.into());
        }
    };

    tracing::info!(video_id = %video.id, owner = %video.owner, "Video published");

    Ok(ApiResponse::created(
        VideoView::from(video),
        "Video uploaded successfully",
    ))
}

/// GET /api/v1/videos/get-videos-by-userId - Current user's videos.
async fn user_videos(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> ApiResult<ApiResponse<UserVideosResponse>> {
    let videos = state.store().videos_by_owner(auth.id(), false).await?;
    let message = if videos.is_empty() {
        "No videos found for this user"
    } else {
        "Videos fetched successfully"
    };
    Ok(ApiResponse::ok(
        UserVideosResponse {
            total_videos: videos.len(),
            videos: videos.into_iter().map(VideoView::from).collect(),
        },
        message,
    ))
}

/// GET /api/v1/videos/get-video/{videoTitle} - Find a published video by title.
async fn video_by_title(
    State(state): State<AppState>,
    ValidatedPath(title): ValidatedPath<String>,
) -> ApiResult<ApiResponse<VideoSummaryView>> {
    let title = require_non_blank(Some(title.as_str()), "title")?;
    let video = state
        .store()
        .video_by_title(title)
        .await?
        .ok_or_else(|| ApiError::NotFound("Video not found".to_string()))?;
    Ok(ApiResponse::ok(
        VideoSummaryView::from(video),
        "Video fetched successfully",
    ))
}

/// GET /api/v1/videos/watch/{videoId} - Watch a video.
///
/// Counts a view and moves the video to the front of the viewer's history.
async fn watch_video(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ValidatedPath(video_id): ValidatedPath<String>,
) -> ApiResult<ApiResponse<VideoView>> {
    let video_id = parse_object_id(&video_id, "video")?;
    let video = state.store().get_video(video_id).await?;
    if !video.is_published && !auth.owns(video.owner) {
        return Err(ApiError::NotFound("Video not found".to_string()));
    }

    let video = state.store().increment_views(video_id).await?;
    state.store().record_watch(auth.id(), video_id).await?;

    tracing::debug!(video_id = %video_id, user_id = %auth.id(), views = video.views, "Video watched");

    Ok(ApiResponse::ok(
        VideoView::from(video),
        "Video fetched successfully",
    ))
}

/// PATCH /api/v1/videos/update-video/{videoId}
async fn update_video(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ValidatedPath(video_id): ValidatedPath<String>,
    ValidatedJson(req): ValidatedJson<UpdateVideoRequest>,
) -> ApiResult<ApiResponse<VideoView>> {
    let video_id = parse_object_id(&video_id, "video")?;
    let patch = req.into_patch()?;

    let video = state.store().get_video(video_id).await?;
    auth.require_owner(video.owner, "update this video")?;

    let video = state.store().update_video(video_id, patch).await?;
    tracing::info!(video_id = %video_id, "Video updated");

    Ok(ApiResponse::ok(
        VideoView::from(video),
        "Video updated successfully",
    ))
}

/// DELETE /api/v1/videos/delete-video/{videoId}
async fn delete_video(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ValidatedPath(video_id): ValidatedPath<String>,
) -> ApiResult<ApiResponse<Empty>> {
    let video_id = parse_object_id(&video_id, "video")?;
    let video = state.store().get_video(video_id).await?;
    auth.require_owner(video.owner, "delete this video")?;

    release_asset(state.media(), &video.video_file, ResourceType::Video).await;
    release_asset(state.media(), &video.thumbnail, ResourceType::Image).await;
    state.store().delete_video(video_id).await?;

    tracing::info!(video_id = %video_id, owner = %video.owner, "Video deleted");

    Ok(ApiResponse::ok(Empty {}, "Video deleted successfully"))
}

/// PATCH /api/v1/videos/toggle-publish/{videoId}
async fn toggle_publish(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ValidatedPath(video_id): ValidatedPath<String>,
) -> ApiResult<ApiResponse<VideoView>> {
    let video_id = parse_object_id(&video_id, "video")?;
    let video = state.store().get_video(video_id).await?;
    auth.require_owner(video.owner, "change this video")?;

    let video = state
        .store()
        .set_video_published(video_id, !video.is_published)
        .await?;
    tracing::info!(video_id = %video_id, is_published = video.is_published, "Publish status changed");

    let message = if video.is_published {
        "Video published"
    } else {
        "Video unpublished"
    };
    Ok(ApiResponse::ok(VideoView::from(video), message))
}

/// Build video routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/upload-video", post(upload_video))
        .route("/get-videos-by-userId", get(user_videos))
        .route("/get-video/{videoTitle}", get(video_by_title))
        .route("/watch/{videoId}", get(watch_video))
        .route("/update-video/{videoId}", patch(update_video))
        .route("/delete-video/{videoId}", delete(delete_video))
        .route("/toggle-publish/{videoId}", patch(toggle_publish))
}
