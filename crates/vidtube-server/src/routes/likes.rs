//! Like toggles and the liked-videos listing.

use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use serde::Serialize;
use vidtube_core::{LikeTarget, ObjectId, parse_object_id};

use crate::auth::AuthenticatedUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::ValidatedPath;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::views::{LikeView, LikedVideoView};

/// Result of a toggle: whether the target is now liked, and the like that
/// was created or removed.
#[derive(Debug, Serialize)]
pub struct ToggleLikeResponse {
    pub liked: bool,
    pub like: LikeView,
}

async fn ensure_target_exists(state: &AppState, target: LikeTarget) -> ApiResult<()> {
    let store = state.store();
    match target {
        LikeTarget::Video(id) => {
            if !store.video_exists(id).await? {
                return Err(ApiError::NotFound("Video not found".to_string()));
            }
        }
        LikeTarget::Comment(id) => {
            store.get_comment(id).await?;
        }
        LikeTarget::Tweet(id) => {
            store.get_tweet(id).await?;
        }
    }
    Ok(())
}

/// Delete the user's like on `target` if present, else create it.
async fn toggle(
    state: &AppState,
    target: LikeTarget,
    user: ObjectId,
) -> ApiResult<ApiResponse<ToggleLikeResponse>> {
    ensure_target_exists(state, target).await?;

    if let Some(existing) = state.store().find_like(target, user).await? {
        state.store().delete_like(existing.id).await?;
        tracing::debug!(like_target = target.label(), target_id = %target.id(), "Like removed");
        return Ok(ApiResponse::ok(
            ToggleLikeResponse {
                liked: false,
                like: existing.into(),
            },
            format!("Removed like from {}", target.label()),
        ));
    }

    let like = state.store().insert_like(target, user).await?;
    tracing::debug!(like_target = target.label(), target_id = %target.id(), "Like added");
    Ok(ApiResponse::ok(
        ToggleLikeResponse {
            liked: true,
            like: like.into(),
        },
        format!("Liked {}", target.label()),
    ))
}

/// POST /api/v1/likes/toggle-vid-like/{videoId}
async fn toggle_video_like(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ValidatedPath(video_id): ValidatedPath<String>,
) -> ApiResult<ApiResponse<ToggleLikeResponse>> {
    let target = LikeTarget::Video(parse_object_id(&video_id, "video")?);
    toggle(&state, target, auth.id()).await
}

/// POST /api/v1/likes/toggle-comment-like/{commentId}
async fn toggle_comment_like(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ValidatedPath(comment_id): ValidatedPath<String>,
) -> ApiResult<ApiResponse<ToggleLikeResponse>> {
    let target = LikeTarget::Comment(parse_object_id(&comment_id, "comment")?);
    toggle(&state, target, auth.id()).await
}

/// POST /api/v1/likes/toggle-tweet-like/{tweetId}
async fn toggle_tweet_like(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ValidatedPath(tweet_id): ValidatedPath<String>,
) -> ApiResult<ApiResponse<ToggleLikeResponse>> {
    let target = LikeTarget::Tweet(parse_object_id(&tweet_id, "tweet")?);
    toggle(&state, target, auth.id()).await
}

/// GET /api/v1/likes/get-liked-vids
async fn liked_videos(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> ApiResult<ApiResponse<Vec<LikedVideoView>>> {
    let liked = state.store().liked_videos(auth.id()).await?;
    let message = if liked.is_empty() {
        "No liked videos yet"
    } else {
        "Liked videos fetched successfully"
    };
    Ok(ApiResponse::ok(
        liked.into_iter().map(LikedVideoView::from).collect(),
        message,
    ))
}

/// Build like routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/toggle-vid-like/{videoId}", post(toggle_video_like))
        .route("/toggle-comment-like/{commentId}", post(toggle_comment_like))
        .route("/toggle-tweet-like/{tweetId}", post(toggle_tweet_like))
        .route("/get-liked-vids", get(liked_videos))
}
