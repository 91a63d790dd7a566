//! Playlist operations.

use futures::TryStreamExt;
use mongodb::bson::{DateTime, Document, doc, oid::ObjectId};
use mongodb::options::ReturnDocument;

use crate::error::{StoreError, StoreResult};
use crate::models::*;
use crate::pipelines;
use crate::store::Store;

impl Store {
    /// A playlist of `owner` named exactly `name`, if any.
    pub async fn find_playlist_by_name(
        &self,
        owner: ObjectId,
        name: &str,
    ) -> StoreResult<Option<PlaylistDocument>> {
        Ok(self
            .playlists()
            .find_one(doc! { "owner": owner, "name": name })
            .await?)
    }

    /// Insert a playlist.
    pub async fn insert_playlist(&self, playlist: &PlaylistDocument) -> StoreResult<()> {
        self.playlists().insert_one(playlist).await?;
        tracing::debug!(playlist_id = %playlist.id, owner = %playlist.owner, "Inserted playlist");
        Ok(())
    }

    /// Get a playlist by id.
    pub async fn get_playlist(&self, id: ObjectId) -> StoreResult<PlaylistDocument> {
        self.playlists()
            .find_one(doc! { "_id": id })
            .await?
            .ok_or(StoreError::PlaylistNotFound(id))
    }

    /// Playlists created by `owner`, newest first.
    pub async fn playlists_by_owner(&self, owner: ObjectId) -> StoreResult<Vec<PlaylistDocument>> {
        let playlists = self
            .playlists()
            .find(doc! { "owner": owner })
            .sort(doc! { "createdAt": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(playlists)
    }

    /// A playlist with its videos and owner.
    pub async fn playlist_details(&self, id: ObjectId) -> StoreResult<PlaylistDetails> {
        let details: Option<PlaylistDetails> = self
            .aggregate_one(&self.playlists(), pipelines::playlist_details(id))
            .await?;
        details.ok_or(StoreError::PlaylistNotFound(id))
    }

    /// Append a video unless it is already in the playlist.
    pub async fn add_video_to_playlist(
        &self,
        playlist_id: ObjectId,
        video_id: ObjectId,
    ) -> StoreResult<PlaylistDocument> {
        self.modify_playlist(
            playlist_id,
            doc! {
                "$addToSet": { "videos": video_id },
                "$set": { "updatedAt": DateTime::now() },
            },
        )
        .await
    }

    /// Remove a video from the playlist. Removing an absent video is a no-op.
    pub async fn remove_video_from_playlist(
        &self,
        playlist_id: ObjectId,
        video_id: ObjectId,
    ) -> StoreResult<PlaylistDocument> {
        self.modify_playlist(
            playlist_id,
            doc! {
                "$pull": { "videos": video_id },
                "$set": { "updatedAt": DateTime::now() },
            },
        )
        .await
    }

    /// Change the playlist's name and/or description.
    pub async fn update_playlist(
        &self,
        id: ObjectId,
        name: Option<&str>,
        description: Option<&str>,
    ) -> StoreResult<PlaylistDocument> {
        let mut fields = Document::new();
        if let Some(name) = name {
            fields.insert("name", name);
        }
        if let Some(description) = description {
            fields.insert("description", description);
        }
        fields.insert("updatedAt", DateTime::now());
        self.modify_playlist(id, doc! { "$set": fields }).await
    }

    /// Delete a playlist. Returns the deleted document.
    pub async fn delete_playlist(&self, id: ObjectId) -> StoreResult<PlaylistDocument> {
        self.playlists()
            .find_one_and_delete(doc! { "_id": id })
            .await?
            .ok_or(StoreError::PlaylistNotFound(id))
    }

    async fn modify_playlist(&self, id: ObjectId, update: Document) -> StoreResult<PlaylistDocument> {
        self.playlists()
            .find_one_and_update(doc! { "_id": id }, update)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or(StoreError::PlaylistNotFound(id))
    }
}
