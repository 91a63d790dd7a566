//! Comment routes.

use axum::{
    Router,
    extract::State,
    routing::{delete, get, patch, post},
};
use serde::{Deserialize, Serialize};
use vidtube_core::{PageQuery, parse_object_id, require_non_blank};
use vidtube_store::CommentDocument;

use crate::auth::AuthenticatedUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ValidatedJson, ValidatedPath, ValidatedQuery};
use crate::response::{ApiResponse, Empty};
use crate::state::AppState;
use crate::views::{CommentDetailsView, CommentView};

/// Request body for adding or editing a comment.
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: Option<String>,
}

/// One page of comments.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPage {
    pub total_comments: u64,
    pub page: u32,
    pub limit: u32,
    pub comments: Vec<CommentDetailsView>,
}

/// GET /api/v1/comments/get-comments/{videoId}?page=&limit=
async fn video_comments(
    State(state): State<AppState>,
    ValidatedPath(video_id): ValidatedPath<String>,
    ValidatedQuery(page): ValidatedQuery<PageQuery>,
) -> ApiResult<ApiResponse<CommentPage>> {
    let video_id = parse_object_id(&video_id, "video")?;
    let page = page.normalized();

    if !state.store().video_exists(video_id).await? {
        return Err(ApiError::NotFound("Video not found".to_string()));
    }

    let total_comments = state.store().count_video_comments(video_id).await?;
    let comments = state.store().video_comments(video_id, page).await?;

    Ok(ApiResponse::ok(
        CommentPage {
            total_comments,
            page: page.page,
            limit: page.limit,
            comments: comments.into_iter().map(CommentDetailsView::from).collect(),
        },
        "Comments fetched successfully",
    ))
}

/// POST /api/v1/comments/add-comment/{videoId}
async fn add_comment(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ValidatedPath(video_id): ValidatedPath<String>,
    ValidatedJson(req): ValidatedJson<CommentRequest>,
) -> ApiResult<ApiResponse<CommentDetailsView>> {
    let video_id = parse_object_id(&video_id, "video")?;
    let content = require_non_blank(req.content.as_deref(), "content")?;

    if !state.store().video_exists(video_id).await? {
        return Err(ApiError::NotFound("Video not found".to_string()));
    }
    if state
        .store()
        .find_comment_by_owner_and_content(video_id, auth.id(), content)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "You already posted this comment".to_string(),
        ));
    }

    let comment = CommentDocument::new(content.to_string(), video_id, auth.id());
    state.store().insert_comment(&comment).await?;
    let details = state.store().populated_comment(comment.id).await?;

    tracing::info!(comment_id = %comment.id, video_id = %video_id, "Comment added");

    Ok(ApiResponse::created(
        CommentDetailsView::from(details),
        "Comment added successfully",
    ))
}

/// PATCH /api/v1/comments/update-comment/{commentId}
async fn update_comment(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ValidatedPath(comment_id): ValidatedPath<String>,
    ValidatedJson(req): ValidatedJson<CommentRequest>,
) -> ApiResult<ApiResponse<CommentView>> {
    let comment_id = parse_object_id(&comment_id, "comment")?;
    let content = require_non_blank(req.content.as_deref(), "content")?;

    let comment = state.store().get_comment(comment_id).await?;
    auth.require_owner(comment.owner, "edit this comment")?;

    let comment = state
        .store()
        .update_comment_content(comment_id, content)
        .await?;

    Ok(ApiResponse::ok(
        CommentView::from(comment),
        "Comment updated successfully",
    ))
}

/// DELETE /api/v1/comments/delete-comment/{commentId}
async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ValidatedPath(comment_id): ValidatedPath<String>,
) -> ApiResult<ApiResponse<Empty>> {
    let comment_id = parse_object_id(&comment_id, "comment")?;
    let comment = state.store().get_comment(comment_id).await?;
    auth.require_owner(comment.owner, "delete this comment")?;

    state.store().delete_comment(comment_id).await?;
    tracing::info!(comment_id = %comment_id, "Comment deleted");

    Ok(ApiResponse::ok(Empty {}, "Comment deleted successfully"))
}

/// Build comment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/get-comments/{videoId}", get(video_comments))
        .route("/add-comment/{videoId}", post(add_comment))
        .route("/update-comment/{commentId}", patch(update_comment))
        .route("/delete-comment/{commentId}", delete(delete_comment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_request_allows_missing_content() {
        let req: CommentRequest = serde_json::from_str("{}").unwrap();
        assert!(req.content.is_none());
    }

    #[test]
    fn test_comment_page_serialization() {
        let page = CommentPage {
            total_comments: 3,
            page: 2,
            limit: 1,
            comments: Vec::new(),
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["totalComments"], 3);
        assert_eq!(json["page"], 2);
        assert_eq!(json["limit"], 1);
    }
}
