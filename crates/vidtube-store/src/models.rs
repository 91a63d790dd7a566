//! Document models for the storage layer.
//!
//! Two kinds of types live here:
//!
//! - `*Document` types mirror a stored document one-to-one and are used for
//!   inserts and plain finds.
//! - Read models (`ChannelProfile`, `VideoSummary`, ...) are the shapes
//!   produced by aggregation pipelines in [`crate::pipelines`]. They are
//!   only ever deserialized.
//!
//! Field names are camelCase in the database. Nothing here knows about
//! HTTP; the server maps these into its own response types and never
//! exposes `password` or `refreshToken`.

use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};
use vidtube_core::MediaAsset;

/// Maximum number of entries kept in a user's watch history.
pub const WATCH_HISTORY_LIMIT: i32 = 100;

// ============================================================================
// Stored documents
// ============================================================================

/// A document in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// Lower-cased, unique.
    pub username: String,
    /// Lower-cased, unique.
    pub email: String,
    pub fullname: String,
    pub avatar: MediaAsset,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<MediaAsset>,
    /// Watched video ids, most recent first.
    #[serde(default)]
    pub watch_history: Vec<ObjectId>,
    /// Argon2 PHC string.
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Fields required to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub avatar: MediaAsset,
    pub cover_image: Option<MediaAsset>,
    pub password_hash: String,
}

impl From<NewUser> for UserDocument {
    fn from(user: NewUser) -> Self {
        let now = DateTime::now();
        Self {
            id: ObjectId::new(),
            username: user.username,
            email: user.email,
            fullname: user.fullname,
            avatar: user.avatar,
            cover_image: user.cover_image,
            watch_history: Vec::new(),
            password: user.password_hash,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A document in the `videos` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub video_file: MediaAsset,
    pub thumbnail: MediaAsset,
    pub title: String,
    pub description: String,
    /// Seconds.
    pub duration: f64,
    #[serde(default)]
    pub views: i64,
    #[serde(default = "default_published")]
    pub is_published: bool,
    pub owner: ObjectId,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

fn default_published() -> bool {
    true
}

/// Fields required to publish a video.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub video_file: MediaAsset,
    pub thumbnail: MediaAsset,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub owner: ObjectId,
}

impl From<NewVideo> for VideoDocument {
    fn from(video: NewVideo) -> Self {
        let now = DateTime::now();
        Self {
            id: ObjectId::new(),
            video_file: video.video_file,
            thumbnail: video.thumbnail,
            title: video.title,
            description: video.description,
            duration: video.duration,
            views: 0,
            is_published: true,
            owner: video.owner,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a video's editable metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration: Option<f64>,
}

impl VideoPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.duration.is_none()
    }
}

/// A document in the `comments` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub content: String,
    pub video: ObjectId,
    pub owner: ObjectId,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl CommentDocument {
    pub fn new(content: String, video: ObjectId, owner: ObjectId) -> Self {
        let now = DateTime::now();
        Self {
            id: ObjectId::new(),
            content,
            video,
            owner,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A document in the `likes` collection. Exactly one target is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tweet: Option<ObjectId>,
    pub liked_by: ObjectId,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl LikeDocument {
    pub fn new(target: vidtube_core::LikeTarget, liked_by: ObjectId) -> Self {
        use vidtube_core::LikeTarget;

        let now = DateTime::now();
        let (video, comment, tweet) = match target {
            LikeTarget::Video(id) => (Some(id), None, None),
            LikeTarget::Comment(id) => (None, Some(id), None),
            LikeTarget::Tweet(id) => (None, None, Some(id)),
        };
        Self {
            id: ObjectId::new(),
            video,
            comment,
            tweet,
            liked_by,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A document in the `playlists` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub description: String,
    /// Ordered, no duplicates.
    #[serde(default)]
    pub videos: Vec<ObjectId>,
    pub owner: ObjectId,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl PlaylistDocument {
    pub fn new(name: String, description: String, owner: ObjectId) -> Self {
        let now = DateTime::now();
        Self {
            id: ObjectId::new(),
            name,
            description,
            videos: Vec::new(),
            owner,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A document in the `subscriptions` collection: `subscriber` follows `channel`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub subscriber: ObjectId,
    pub channel: ObjectId,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl SubscriptionDocument {
    pub fn new(subscriber: ObjectId, channel: ObjectId) -> Self {
        let now = DateTime::now();
        Self {
            id: ObjectId::new(),
            subscriber,
            channel,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A document in the `tweets` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub content: String,
    pub owner: ObjectId,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl TweetDocument {
    pub fn new(content: String, owner: ObjectId) -> Self {
        let now = DateTime::now();
        Self {
            id: ObjectId::new(),
            content,
            owner,
            created_at: now,
            updated_at: now,
        }
    }
}

// ============================================================================
// Aggregation read models
// ============================================================================

/// Public slice of a user joined into another document.
///
/// Different pipelines project different fields, so everything except the
/// id is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwnerSummary {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub fullname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<MediaAsset>,
}

/// Result of the channel profile pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub username: String,
    pub fullname: String,
    pub email: String,
    pub avatar: MediaAsset,
    #[serde(default)]
    pub cover_image: Option<MediaAsset>,
    pub subscribers_count: i64,
    pub channels_subscribed_to_count: i64,
    pub is_subscribed: bool,
}

/// A video joined with its owner.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub video_file: Option<MediaAsset>,
    #[serde(default)]
    pub thumbnail: Option<MediaAsset>,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub views: i64,
    #[serde(default = "default_published")]
    pub is_published: bool,
    #[serde(default)]
    pub owner: Option<OwnerSummary>,
    #[serde(default)]
    pub created_at: Option<DateTime>,
}

/// Intermediate shape of the watch history pipeline: the id list in watch
/// order plus the joined videos in arbitrary order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WatchHistoryJoin {
    #[serde(default)]
    pub watch_history: Vec<ObjectId>,
    #[serde(default)]
    pub videos: Vec<VideoSummary>,
}

impl WatchHistoryJoin {
    /// Videos in watch-history order; ids whose video is gone are skipped.
    pub(crate) fn into_ordered(self) -> Vec<VideoSummary> {
        let mut videos = self.videos;
        let mut ordered = Vec::with_capacity(videos.len());
        for id in self.watch_history {
            if let Some(pos) = videos.iter().position(|v| v.id == id) {
                ordered.push(videos.swap_remove(pos));
            }
        }
        ordered
    }
}

/// Minimal reference to a video (id and title).
#[derive(Debug, Clone, Deserialize)]
pub struct VideoRef {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub title: Option<String>,
}

/// A comment with its video title and author.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDetails {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub content: String,
    #[serde(default)]
    pub video: Option<VideoRef>,
    #[serde(default)]
    pub owner: Option<OwnerSummary>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Compact video shape used inside likes and playlists.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCard {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<MediaAsset>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub views: Option<i64>,
    #[serde(default)]
    pub owner: Option<ObjectId>,
}

/// A like on a video joined with the video.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedVideo {
    /// The like's id.
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub video: VideoCard,
    pub created_at: DateTime,
}

/// One side of a subscription edge joined with the user on the other side.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionEdge {
    /// The subscription's id.
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user: OwnerSummary,
    pub created_at: DateTime,
}

/// A playlist with its videos (in playlist order) and owner.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDetails {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub videos: Vec<VideoCard>,
    #[serde(default)]
    pub owner: Option<OwnerSummary>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// A tweet with its author and like count.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetDetails {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub content: String,
    #[serde(default)]
    pub owner: Option<OwnerSummary>,
    #[serde(default)]
    pub likes_count: i64,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Aggregate counters for a channel dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    #[serde(default)]
    pub total_videos: i64,
    #[serde(default)]
    pub total_views: i64,
    #[serde(default)]
    pub total_likes: i64,
    #[serde(default)]
    pub total_subscribers: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{self, doc};
    use vidtube_core::LikeTarget;

    fn asset(name: &str) -> MediaAsset {
        MediaAsset::new(format!("https://cdn.example/{name}"), format!("vidtube/{name}"))
    }

    #[test]
    fn test_user_document_field_names() {
        let user: UserDocument = NewUser {
            username: "alice".into(),
            email: "alice@example.com".into(),
            fullname: "Alice".into(),
            avatar: asset("a.png"),
            cover_image: None,
            password_hash: "$argon2id$hash".into(),
        }
        .into();

        let doc = bson::to_document(&user).unwrap();
        assert!(doc.contains_key("_id"));
        assert!(doc.contains_key("watchHistory"));
        assert!(doc.contains_key("createdAt"));
        assert!(!doc.contains_key("coverImage"));
        assert!(!doc.contains_key("refreshToken"));
        assert_eq!(doc.get_str("password").unwrap(), "$argon2id$hash");
    }

    #[test]
    fn test_video_defaults_on_read() {
        let id = ObjectId::new();
        let owner = ObjectId::new();
        let now = DateTime::now();
        let doc = doc! {
            "_id": id,
            "videoFile": { "url": "u", "public_id": "p" },
            "thumbnail": { "url": "t", "public_id": "q" },
            "title": "Intro",
            "description": "First",
            "duration": 12.0,
            "owner": owner,
            "createdAt": now,
            "updatedAt": now,
        };
        let video: VideoDocument = bson::from_document(doc).unwrap();
        assert_eq!(video.views, 0);
        assert!(video.is_published);
        assert_eq!(video.owner, owner);
    }

    #[test]
    fn test_like_document_sets_single_target() {
        let target = ObjectId::new();
        let like = LikeDocument::new(LikeTarget::Comment(target), ObjectId::new());
        let doc = bson::to_document(&like).unwrap();
        assert_eq!(doc.get_object_id("comment").unwrap(), target);
        assert!(!doc.contains_key("video"));
        assert!(!doc.contains_key("tweet"));
        assert!(doc.contains_key("likedBy"));
    }

    #[test]
    fn test_video_patch_is_empty() {
        assert!(VideoPatch::default().is_empty());
        let patch = VideoPatch {
            duration: Some(3.0),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_channel_profile_accepts_int32_counts() {
        let doc = doc! {
            "_id": ObjectId::new(),
            "username": "alice",
            "fullname": "Alice",
            "email": "alice@example.com",
            "avatar": { "url": "u", "public_id": "p" },
            "subscribersCount": 3_i32,
            "channelsSubscribedToCount": 0_i32,
            "isSubscribed": true,
        };
        let profile: ChannelProfile = bson::from_document(doc).unwrap();
        assert_eq!(profile.subscribers_count, 3);
        assert!(profile.is_subscribed);
        assert!(profile.cover_image.is_none());
    }

    #[test]
    fn test_watch_history_preserves_order() {
        let ids: Vec<ObjectId> = (0..3).map(|_| ObjectId::new()).collect();
        let video = |id: ObjectId| {
            bson::from_document::<VideoSummary>(doc! {
                "_id": id, "title": "t", "description": "d",
            })
            .unwrap()
        };
        let join = WatchHistoryJoin {
            watch_history: vec![ids[2], ids[0], ObjectId::new(), ids[1]],
            videos: vec![video(ids[0]), video(ids[1]), video(ids[2])],
        };
        let ordered: Vec<ObjectId> = join.into_ordered().into_iter().map(|v| v.id).collect();
        assert_eq!(ordered, vec![ids[2], ids[0], ids[1]]);
    }

    #[test]
    fn test_channel_stats_defaults() {
        let stats: ChannelStats = bson::from_document(doc! {}).unwrap();
        assert_eq!(stats, ChannelStats::default());
    }
}
