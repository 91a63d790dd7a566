//! Channel dashboard routes.

use axum::{
    Router,
    extract::State,
    routing::get,
};
use vidtube_core::parse_object_id;

use crate::error::{ApiError, ApiResult};
use crate::extract::ValidatedPath;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::views::{ChannelStatsView, VideoView};

/// GET /api/v1/dashboard/channel-stats/{channelId}
async fn channel_stats(
    State(state): State<AppState>,
    ValidatedPath(channel_id): ValidatedPath<String>,
) -> ApiResult<ApiResponse<ChannelStatsView>> {
    let channel_id = parse_object_id(&channel_id, "channel")?;
    if !state.store().user_exists(channel_id).await? {
        return Err(ApiError::NotFound("Channel not found".to_string()));
    }

    let stats = state.store().channel_stats(channel_id).await?;
    Ok(ApiResponse::ok(
        ChannelStatsView::from(stats),
        "Channel stats fetched successfully",
    ))
}

/// GET /api/v1/dashboard/channel-videos/{channelId} - Published videos.
async fn channel_videos(
    State(state): State<AppState>,
    ValidatedPath(channel_id): ValidatedPath<String>,
) -> ApiResult<ApiResponse<Vec<VideoView>>> {
    let channel_id = parse_object_id(&channel_id, "channel")?;
    if !state.store().user_exists(channel_id).await? {
        return Err(ApiError::NotFound("Channel not found".to_string()));
    }

    let videos = state.store().videos_by_owner(channel_id, true).await?;
    Ok(ApiResponse::ok(
        videos.into_iter().map(VideoView::from).collect(),
        "Channel videos fetched successfully",
    ))
}

/// Build dashboard routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/channel-stats/{channelId}", get(channel_stats))
        .route("/channel-videos/{channelId}", get(channel_videos))
}
