//! Response shapes.
//!
//! Store models carry `ObjectId` and BSON datetimes; these views render ids
//! as hex strings and timestamps as RFC 3339. User views never include the
//! password hash or refresh token.

use chrono::{DateTime, Utc};
use serde::Serialize;
use vidtube_core::{MediaAsset, ObjectId};
use vidtube_store::models::*;

fn hex(id: ObjectId) -> String {
    id.to_hex()
}

fn time(dt: bson::DateTime) -> DateTime<Utc> {
    dt.to_chrono()
}

// ============================================================================
// Users
// ============================================================================

/// A user as returned to its owner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub avatar: MediaAsset,
    pub cover_image: Option<MediaAsset>,
    pub watch_history: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&UserDocument> for UserView {
    fn from(user: &UserDocument) -> Self {
        Self {
            id: hex(user.id),
            username: user.username.clone(),
            email: user.email.clone(),
            fullname: user.fullname.clone(),
            avatar: user.avatar.clone(),
            cover_image: user.cover_image.clone(),
            watch_history: user.watch_history.iter().copied().map(hex).collect(),
            created_at: time(user.created_at),
            updated_at: time(user.updated_at),
        }
    }
}

/// Public slice of a user embedded in other resources.
#[derive(Debug, Clone, Serialize)]
pub struct OwnerView {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fullname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<MediaAsset>,
}

impl From<OwnerSummary> for OwnerView {
    fn from(owner: OwnerSummary) -> Self {
        Self {
            id: owner.id.map(hex),
            username: owner.username,
            fullname: owner.fullname,
            email: owner.email,
            avatar: owner.avatar,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfileView {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub fullname: String,
    pub email: String,
    pub avatar: MediaAsset,
    pub cover_image: Option<MediaAsset>,
    pub subscribers_count: i64,
    pub channels_subscribed_to_count: i64,
    pub is_subscribed: bool,
}

impl From<ChannelProfile> for ChannelProfileView {
    fn from(profile: ChannelProfile) -> Self {
        Self {
            id: hex(profile.id),
            username: profile.username,
            fullname: profile.fullname,
            email: profile.email,
            avatar: profile.avatar,
            cover_image: profile.cover_image,
            subscribers_count: profile.subscribers_count,
            channels_subscribed_to_count: profile.channels_subscribed_to_count,
            is_subscribed: profile.is_subscribed,
        }
    }
}

// ============================================================================
// Videos
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoView {
    #[serde(rename = "_id")]
    pub id: String,
    pub video_file: MediaAsset,
    pub thumbnail: MediaAsset,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<VideoDocument> for VideoView {
    fn from(video: VideoDocument) -> Self {
        Self {
            id: hex(video.id),
            video_file: video.video_file,
            thumbnail: video.thumbnail,
            title: video.title,
            description: video.description,
            duration: video.duration,
            views: video.views,
            is_published: video.is_published,
            owner: hex(video.owner),
            created_at: time(video.created_at),
            updated_at: time(video.updated_at),
        }
    }
}

/// A video joined with its owner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummaryView {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub video_file: Option<MediaAsset>,
    pub thumbnail: Option<MediaAsset>,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub owner: Option<OwnerView>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<VideoSummary> for VideoSummaryView {
    fn from(video: VideoSummary) -> Self {
        Self {
            id: hex(video.id),
            title: video.title,
            description: video.description,
            video_file: video.video_file,
            thumbnail: video.thumbnail,
            duration: video.duration,
            views: video.views,
            is_published: video.is_published,
            owner: video.owner.map(OwnerView::from),
            created_at: video.created_at.map(time),
        }
    }
}

/// Compact video used inside likes and playlists.
#[derive(Debug, Clone, Serialize)]
pub struct VideoCardView {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<MediaAsset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl From<VideoCard> for VideoCardView {
    fn from(card: VideoCard) -> Self {
        Self {
            id: hex(card.id),
            title: card.title,
            description: card.description,
            thumbnail: card.thumbnail,
            duration: card.duration,
            views: card.views,
            owner: card.owner.map(hex),
        }
    }
}

// ============================================================================
// Comments
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(rename = "_id")]
    pub id: String,
    pub content: String,
    pub video: String,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CommentDocument> for CommentView {
    fn from(comment: CommentDocument) -> Self {
        Self {
            id: hex(comment.id),
            content: comment.content,
            video: hex(comment.video),
            owner: hex(comment.owner),
            created_at: time(comment.created_at),
            updated_at: time(comment.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoRefView {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDetailsView {
    #[serde(rename = "_id")]
    pub id: String,
    pub content: String,
    pub video: Option<VideoRefView>,
    pub owner: Option<OwnerView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CommentDetails> for CommentDetailsView {
    fn from(comment: CommentDetails) -> Self {
        Self {
            id: hex(comment.id),
            content: comment.content,
            video: comment.video.map(|v| VideoRefView {
                id: hex(v.id),
                title: v.title,
            }),
            owner: comment.owner.map(OwnerView::from),
            created_at: time(comment.created_at),
            updated_at: time(comment.updated_at),
        }
    }
}

// ============================================================================
// Likes
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeView {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tweet: Option<String>,
    pub liked_by: String,
    pub created_at: DateTime<Utc>,
}

impl From<LikeDocument> for LikeView {
    fn from(like: LikeDocument) -> Self {
        Self {
            id: hex(like.id),
            video: like.video.map(hex),
            comment: like.comment.map(hex),
            tweet: like.tweet.map(hex),
            liked_by: hex(like.liked_by),
            created_at: time(like.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedVideoView {
    #[serde(rename = "_id")]
    pub id: String,
    pub video: VideoCardView,
    pub liked_at: DateTime<Utc>,
}

impl From<LikedVideo> for LikedVideoView {
    fn from(liked: LikedVideo) -> Self {
        Self {
            id: hex(liked.id),
            video: liked.video.into(),
            liked_at: time(liked.created_at),
        }
    }
}

// ============================================================================
// Subscriptions
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionView {
    #[serde(rename = "_id")]
    pub id: String,
    pub subscriber: String,
    pub channel: String,
    pub created_at: DateTime<Utc>,
}

impl From<SubscriptionDocument> for SubscriptionView {
    fn from(sub: SubscriptionDocument) -> Self {
        Self {
            id: hex(sub.id),
            subscriber: hex(sub.subscriber),
            channel: hex(sub.channel),
            created_at: time(sub.created_at),
        }
    }
}

/// The user on the other side of a subscription.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionEdgeView {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: OwnerView,
    pub subscribed_at: DateTime<Utc>,
}

impl From<SubscriptionEdge> for SubscriptionEdgeView {
    fn from(edge: SubscriptionEdge) -> Self {
        Self {
            id: hex(edge.id),
            user: edge.user.into(),
            subscribed_at: time(edge.created_at),
        }
    }
}

// ============================================================================
// Playlists
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistView {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub videos: Vec<String>,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PlaylistDocument> for PlaylistView {
    fn from(playlist: PlaylistDocument) -> Self {
        Self {
            id: hex(playlist.id),
            name: playlist.name,
            description: playlist.description,
            videos: playlist.videos.into_iter().map(hex).collect(),
            owner: hex(playlist.owner),
            created_at: time(playlist.created_at),
            updated_at: time(playlist.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDetailsView {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub videos: Vec<VideoCardView>,
    pub owner: Option<OwnerView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PlaylistDetails> for PlaylistDetailsView {
    fn from(playlist: PlaylistDetails) -> Self {
        Self {
            id: hex(playlist.id),
            name: playlist.name,
            description: playlist.description,
            videos: playlist.videos.into_iter().map(VideoCardView::from).collect(),
            owner: playlist.owner.map(OwnerView::from),
            created_at: time(playlist.created_at),
            updated_at: time(playlist.updated_at),
        }
    }
}

// ============================================================================
// Tweets
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetView {
    #[serde(rename = "_id")]
    pub id: String,
    pub content: String,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TweetDocument> for TweetView {
    fn from(tweet: TweetDocument) -> Self {
        Self {
            id: hex(tweet.id),
            content: tweet.content,
            owner: hex(tweet.owner),
            created_at: time(tweet.created_at),
            updated_at: time(tweet.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetDetailsView {
    #[serde(rename = "_id")]
    pub id: String,
    pub content: String,
    pub owner: Option<OwnerView>,
    pub likes_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TweetDetails> for TweetDetailsView {
    fn from(tweet: TweetDetails) -> Self {
        Self {
            id: hex(tweet.id),
            content: tweet.content,
            owner: tweet.owner.map(OwnerView::from),
            likes_count: tweet.likes_count,
            created_at: time(tweet.created_at),
            updated_at: time(tweet.updated_at),
        }
    }
}

// ============================================================================
// Dashboard
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatsView {
    pub total_videos: i64,
    pub total_views: i64,
    pub total_subscribers: i64,
    pub total_likes: i64,
}

impl From<ChannelStats> for ChannelStatsView {
    fn from(stats: ChannelStats) -> Self {
        Self {
            total_videos: stats.total_videos,
            total_views: stats.total_views,
            total_subscribers: stats.total_subscribers,
            total_likes: stats.total_likes,
        }
    }
}
