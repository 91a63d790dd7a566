//! Playlist routes.

use axum::{
    Router,
    extract::State,
    routing::{delete, get, patch, post},
};
use serde::Deserialize;
use vidtube_core::{parse_object_id, require_non_blank};
use vidtube_store::PlaylistDocument;

use crate::auth::AuthenticatedUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ValidatedJson, ValidatedPath};
use crate::response::{ApiResponse, Empty};
use crate::state::AppState;
use crate::views::{PlaylistDetailsView, PlaylistView};

/// Request body for creating or renaming a playlist.
#[derive(Debug, Deserialize)]
pub struct PlaylistRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl PlaylistRequest {
    fn fields(&self) -> ApiResult<(&str, &str)> {
        let name = require_non_blank(self.name.as_deref(), "name")?;
        let description = require_non_blank(self.description.as_deref(), "description")?;
        Ok((name, description))
    }
}

/// Load a playlist and check the caller owns it.
async fn owned_playlist(
    state: &AppState,
    auth: &AuthenticatedUser,
    raw_id: &str,
    action: &str,
) -> ApiResult<PlaylistDocument> {
    let playlist_id = parse_object_id(raw_id, "playlist")?;
    let playlist = state.store().get_playlist(playlist_id).await?;
    auth.require_owner(playlist.owner, action)?;
    Ok(playlist)
}

/// POST /api/v1/playlist/create-playlist
async fn create_playlist(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ValidatedJson(req): ValidatedJson<PlaylistRequest>,
) -> ApiResult<ApiResponse<PlaylistView>> {
    let (name, description) = req.fields()?;

    if state
        .store()
        .find_playlist_by_name(auth.id(), name)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "A playlist with this name already exists".to_string(),
        ));
    }

    let playlist = PlaylistDocument::new(name.to_string(), description.to_string(), auth.id());
    state.store().insert_playlist(&playlist).await?;

    tracing::info!(playlist_id = %playlist.id, owner = %playlist.owner, "Playlist created");

    Ok(ApiResponse::created(
        PlaylistView::from(playlist),
        "Playlist created successfully",
    ))
}

/// GET /api/v1/playlist/user-playlists/{userId}
async fn user_playlists(
    State(state): State<AppState>,
    ValidatedPath(user_id): ValidatedPath<String>,
) -> ApiResult<ApiResponse<Vec<PlaylistView>>> {
    let user_id = parse_object_id(&user_id, "user")?;
    if !state.store().user_exists(user_id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }
    let playlists = state.store().playlists_by_owner(user_id).await?;
    Ok(ApiResponse::ok(
        playlists.into_iter().map(PlaylistView::from).collect(),
        "Playlists fetched successfully",
    ))
}

/// GET /api/v1/playlist/playlist-by-id/{playlistId}
async fn playlist_by_id(
    State(state): State<AppState>,
    ValidatedPath(playlist_id): ValidatedPath<String>,
) -> ApiResult<ApiResponse<PlaylistDetailsView>> {
    let playlist_id = parse_object_id(&playlist_id, "playlist")?;
    let details = state.store().playlist_details(playlist_id).await?;
    Ok(ApiResponse::ok(
        PlaylistDetailsView::from(details),
        "Playlist fetched successfully",
    ))
}

/// POST /api/v1/playlist/add-video/{playlistId}/{videoId}
async fn add_video(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ValidatedPath((playlist_id, video_id)): ValidatedPath<(String, String)>,
) -> ApiResult<ApiResponse<PlaylistView>> {
    let video_id = parse_object_id(&video_id, "video")?;
    let playlist = owned_playlist(&state, &auth, &playlist_id, "modify this playlist").await?;

    if !state.store().video_exists(video_id).await? {
        return Err(ApiError::NotFound("Video not found".to_string()));
    }
    if playlist.videos.contains(&video_id) {
        return Err(ApiError::Conflict(
            "Video is already in the playlist".to_string(),
        ));
    }

    let playlist = state
        .store()
        .add_video_to_playlist(playlist.id, video_id)
        .await?;

    Ok(ApiResponse::ok(
        PlaylistView::from(playlist),
        "Video added to playlist",
    ))
}

/// DELETE /api/v1/playlist/remove-video/{playlistId}/{videoId}
async fn remove_video(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ValidatedPath((playlist_id, video_id)): ValidatedPath<(String, String)>,
) -> ApiResult<ApiResponse<PlaylistView>> {
    let video_id = parse_object_id(&video_id, "video")?;
    let playlist = owned_playlist(&state, &auth, &playlist_id, "modify this playlist").await?;

    if !playlist.videos.contains(&video_id) {
        return Err(ApiError::NotFound(
            "Video is not in the playlist".to_string(),
        ));
    }

    let playlist = state
        .store()
        .remove_video_from_playlist(playlist.id, video_id)
        .await?;

    Ok(ApiResponse::ok(
        PlaylistView::from(playlist),
        "Video removed from playlist",
    ))
}

/// DELETE /api/v1/playlist/delete-playlist/{playlistId}
async fn delete_playlist(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ValidatedPath(playlist_id): ValidatedPath<String>,
) -> ApiResult<ApiResponse<Empty>> {
    let playlist = owned_playlist(&state, &auth, &playlist_id, "delete this playlist").await?;
    state.store().delete_playlist(playlist.id).await?;

    tracing::info!(playlist_id = %playlist.id, "Playlist deleted");

    Ok(ApiResponse::ok(Empty {}, "Playlist deleted successfully"))
}

/// PATCH /api/v1/playlist/update-playlist/{playlistId}
async fn update_playlist(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ValidatedPath(playlist_id): ValidatedPath<String>,
    ValidatedJson(req): ValidatedJson<PlaylistRequest>,
) -> ApiResult<ApiResponse<PlaylistView>> {
    let (name, description) = req.fields()?;
    let playlist = owned_playlist(&state, &auth, &playlist_id, "update this playlist").await?;

    if name != playlist.name
        && state
            .store()
            .find_playlist_by_name(auth.id(), name)
            .await?
            .is_some()
    {
        return Err(ApiError::Conflict(
            "A playlist with this name already exists".to_string(),
        ));
    }

    let playlist = state
        .store()
        .update_playlist(playlist.id, Some(name), Some(description))
        .await?;

    Ok(ApiResponse::ok(
        PlaylistView::from(playlist),
        "Playlist updated successfully",
    ))
}

/// Build playlist routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/create-playlist", post(create_playlist))
        .route("/user-playlists/{userId}", get(user_playlists))
        .route("/playlist-by-id/{playlistId}", get(playlist_by_id))
        .route("/add-video/{playlistId}/{videoId}", post(add_video))
        .route("/remove-video/{playlistId}/{videoId}", delete(remove_video))
        .route("/delete-playlist/{playlistId}", delete(delete_playlist))
        .route("/update-playlist/{playlistId}", patch(update_playlist))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_request_requires_both_fields() {
        let req: PlaylistRequest = serde_json::from_str(r#"{"name": "Mix"}"#).unwrap();
        assert!(matches!(req.fields(), Err(ApiError::BadRequest(_))));

        let req: PlaylistRequest =
            serde_json::from_str(r#"{"name": " Mix ", "description": "Songs"}"#).unwrap();
        assert_eq!(req.fields().unwrap(), ("Mix", "Songs"));
    }
}
