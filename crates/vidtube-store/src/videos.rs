//! Video operations and channel statistics.

use futures::TryStreamExt;
use mongodb::bson::{DateTime, Document, doc, oid::ObjectId};
use mongodb::options::ReturnDocument;

use crate::error::{StoreError, StoreResult};
use crate::models::*;
use crate::pipelines;
use crate::store::Store;

impl Store {
    /// Insert a new video.
    pub async fn insert_video(&self, video: NewVideo) -> StoreResult<VideoDocument> {
        let document = VideoDocument::from(video);
        self.videos().insert_one(&document).await?;
        tracing::debug!(video_id = %document.id, owner = %document.owner, "Inserted video");
        Ok(document)
    }

    /// Get a video by id.
    pub async fn get_video(&self, id: ObjectId) -> StoreResult<VideoDocument> {
        self.videos()
            .find_one(doc! { "_id": id })
            .await?
            .ok_or(StoreError::VideoNotFound(id))
    }

    /// Whether a video exists.
    pub async fn video_exists(&self, id: ObjectId) -> StoreResult<bool> {
        Ok(self.videos().count_documents(doc! { "_id": id }).await? > 0)
    }

    /// Videos uploaded by `owner`, newest first.
    pub async fn videos_by_owner(
        &self,
        owner: ObjectId,
        published_only: bool,
    ) -> StoreResult<Vec<VideoDocument>> {
        let mut filter = doc! { "owner": owner };
        if published_only {
            filter.insert("isPublished", true);
        }
        let videos = self
            .videos()
            .find(filter)
            .sort(doc! { "createdAt": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(videos)
    }

    /// Most viewed published video whose title contains `title`.
    pub async fn video_by_title(&self, title: &str) -> StoreResult<Option<VideoSummary>> {
        self.aggregate_one(&self.videos(), pipelines::video_by_title(title))
            .await
    }

    /// Apply `patch` to a video and return the updated document.
    pub async fn update_video(&self, id: ObjectId, patch: VideoPatch) -> StoreResult<VideoDocument> {
        let mut fields = Document::new();
        if let Some(title) = patch.title {
            fields.insert("title", title);
        }
        if let Some(description) = patch.description {
            fields.insert("description", description);
        }
        if let Some(duration) = patch.duration {
            fields.insert("duration", duration);
        }
        fields.insert("updatedAt", DateTime::now());

        self.videos()
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": fields })
            .return_document(ReturnDocument::After)
            .await?
            .ok_or(StoreError::VideoNotFound(id))
    }

    /// Set the published flag and return the updated document.
    pub async fn set_video_published(
        &self,
        id: ObjectId,
        is_published: bool,
    ) -> StoreResult<VideoDocument> {
        self.videos()
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": { "isPublished": is_published, "updatedAt": DateTime::now() } },
            )
            .return_document(ReturnDocument::After)
            .await?
            .ok_or(StoreError::VideoNotFound(id))
    }

    /// Add one view and return the updated document.
    pub async fn increment_views(&self, id: ObjectId) -> StoreResult<VideoDocument> {
        self.videos()
            .find_one_and_update(doc! { "_id": id }, doc! { "$inc": { "views": 1_i64 } })
            .return_document(ReturnDocument::After)
            .await?
            .ok_or(StoreError::VideoNotFound(id))
    }

    /// Delete a video and everything that references it: its comments and
    /// their likes, likes on the video, playlist entries and watch history
    /// entries.
    ///
    /// Returns the deleted document so the caller can release its media.
    pub async fn delete_video(&self, id: ObjectId) -> StoreResult<VideoDocument> {
        let video = self
            .videos()
            .find_one_and_delete(doc! { "_id": id })
            .await?
            .ok_or(StoreError::VideoNotFound(id))?;

        let comment_ids: Vec<ObjectId> = self
            .comments()
            .distinct("_id", doc! { "video": id })
            .await?
            .into_iter()
            .filter_map(|b| b.as_object_id())
            .collect();

        if !comment_ids.is_empty() {
            self.likes()
                .delete_many(doc! { "comment": { "$in": comment_ids } })
                .await?;
        }
        let comments = self.comments().delete_many(doc! { "video": id }).await?;
        let likes = self.likes().delete_many(doc! { "video": id }).await?;
        self.playlists()
            .update_many(
                doc! { "videos": id },
                doc! { "$pull": { "videos": id }, "$set": { "updatedAt": DateTime::now() } },
            )
            .await?;
        self.users()
            .update_many(
                doc! { "watchHistory": id },
                doc! { "$pull": { "watchHistory": id } },
            )
            .await?;

        tracing::debug!(
            video_id = %id,
            comments = comments.deleted_count,
            likes = likes.deleted_count,
            "Deleted video"
        );
        Ok(video)
    }

    /// Dashboard counters for `channel`.
    pub async fn channel_stats(&self, channel: ObjectId) -> StoreResult<ChannelStats> {
        let stats: Option<ChannelStats> = self
            .aggregate_one(&self.videos(), pipelines::channel_video_stats(channel))
            .await?;
        let total_subscribers = self.count_subscribers(channel).await?;
        Ok(ChannelStats {
            total_subscribers,
            ..stats.unwrap_or_default()
        })
    }
}

/// Integration tests that require a running MongoDB.
/// Run with: cargo test --features integration-tests
#[cfg(all(test, feature = "integration-tests"))]
mod integration_tests {
    use super::*;
    use crate::store::StoreConfig;
    use vidtube_core::{LikeTarget, MediaAsset};

    async fn setup_test_store() -> Store {
        let config = StoreConfig {
            database_url: std::env::var("MONGODB_URI")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            database_name: format!("vidtube_test_{}", ObjectId::new()),
            ..StoreConfig::default()
        };
        Store::connect(config).await.expect("Failed to connect to MongoDB")
    }

    async fn create_test_user(store: &Store, name: &str) -> UserDocument {
        store
            .insert_user(NewUser {
                username: name.to_string(),
                email: format!("{name}@example.com"),
                fullname: name.to_string(),
                avatar: MediaAsset::new("https://cdn.example/a.png", "vidtube/a"),
                cover_image: None,
                password_hash: "hash".to_string(),
            })
            .await
            .expect("Failed to create test user")
    }

    async fn create_test_video(store: &Store, owner: ObjectId) -> VideoDocument {
        store
            .insert_video(NewVideo {
                video_file: MediaAsset::new("https://cdn.example/v.mp4", "vidtube/v"),
                thumbnail: MediaAsset::new("https://cdn.example/t.png", "vidtube/t"),
                title: "Test video".to_string(),
                description: "A video".to_string(),
                duration: 12.5,
                owner,
            })
            .await
            .expect("Failed to create test video")
    }

    #[tokio::test]
    async fn test_delete_video_cascades() {
        let store = setup_test_store().await;
        let owner = create_test_user(&store, "owner").await;
        let viewer = create_test_user(&store, "viewer").await;
        let video = create_test_video(&store, owner.id).await;

        let comment = CommentDocument::new("Nice".to_string(), video.id, viewer.id);
        store.insert_comment(&comment).await.unwrap();
        store
            .insert_like(LikeTarget::Comment(comment.id), owner.id)
            .await
            .unwrap();
        store
            .insert_like(LikeTarget::Video(video.id), viewer.id)
            .await
            .unwrap();

        let playlist = PlaylistDocument::new("Mix".into(), "Songs".into(), viewer.id);
        store.insert_playlist(&playlist).await.unwrap();
        store
            .add_video_to_playlist(playlist.id, video.id)
            .await
            .unwrap();
        store.record_watch(viewer.id, video.id).await.unwrap();

        store.delete_video(video.id).await.unwrap();

        assert!(!store.video_exists(video.id).await.unwrap());
        assert_eq!(store.count_video_comments(video.id).await.unwrap(), 0);
        assert!(
            store
                .find_like(LikeTarget::Comment(comment.id), owner.id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            store
                .find_like(LikeTarget::Video(video.id), viewer.id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(store.get_playlist(playlist.id).await.unwrap().videos.is_empty());
        assert!(store.get_user(viewer.id).await.unwrap().watch_history.is_empty());

        store.database().drop().await.unwrap();
    }

    #[tokio::test]
    async fn test_channel_stats_counts_views_likes_and_subscribers() {
        let store = setup_test_store().await;
        let owner = create_test_user(&store, "channel").await;
        let fan = create_test_user(&store, "fan").await;
        let video = create_test_video(&store, owner.id).await;

        store.increment_views(video.id).await.unwrap();
        store.increment_views(video.id).await.unwrap();
        store
            .insert_like(LikeTarget::Video(video.id), fan.id)
            .await
            .unwrap();
        store.insert_subscription(fan.id, owner.id).await.unwrap();

        let stats = store.channel_stats(owner.id).await.unwrap();
        assert_eq!(stats.total_videos, 1);
        assert_eq!(stats.total_views, 2);
        assert_eq!(stats.total_likes, 1);
        assert_eq!(stats.total_subscribers, 1);

        store.database().drop().await.unwrap();
    }

    #[tokio::test]
    async fn test_watch_history_is_most_recent_first_without_duplicates() {
        let store = setup_test_store().await;
        let owner = create_test_user(&store, "uploader").await;
        let first = create_test_video(&store, owner.id).await;
        let second = create_test_video(&store, owner.id).await;

        store.record_watch(owner.id, first.id).await.unwrap();
        store.record_watch(owner.id, second.id).await.unwrap();
        store.record_watch(owner.id, first.id).await.unwrap();

        let user = store.get_user(owner.id).await.unwrap();
        assert_eq!(user.watch_history, vec![first.id, second.id]);

        store.database().drop().await.unwrap();
    }
}
