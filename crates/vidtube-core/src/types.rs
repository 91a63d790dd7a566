//! Core data types for the VidTube backend.
//!
//! These are the small value types that more than one crate needs to agree
//! on: how a media asset is referenced, what a like points at, and how list
//! endpoints page through results.

use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Media
// ============================================================================

/// Reference to an asset held by the hosted media service.
///
/// `url` is the public (secure) URL; `public_id` is the opaque identifier
/// the service needs to delete the asset later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub url: String,
    pub public_id: String,
}

impl MediaAsset {
    pub fn new(url: impl Into<String>, public_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            public_id: public_id.into(),
        }
    }
}

/// Resource class understood by the media service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Image,
    Video,
}

impl ResourceType {
    /// Path segment used in media service URLs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }

    /// Parse the resource type reported back by the media service.
    ///
    /// Anything unrecognised (e.g. "raw") is treated as an image, which is
    /// what the service assumes when no type is given on delete.
    #[must_use]
    pub fn from_reported(value: &str) -> Self {
        match value {
            "video" => Self::Video,
            _ => Self::Image,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Likes
// ============================================================================

/// What a like document points at. Exactly one target is set per like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LikeTarget {
    Video(ObjectId),
    Comment(ObjectId),
    Tweet(ObjectId),
}

impl LikeTarget {
    /// Document field holding the target id.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Video(_) => "video",
            Self::Comment(_) => "comment",
            Self::Tweet(_) => "tweet",
        }
    }

    /// The target's object id.
    #[must_use]
    pub const fn id(&self) -> ObjectId {
        match self {
            Self::Video(id) | Self::Comment(id) | Self::Tweet(id) => *id,
        }
    }

    /// Human-readable label used in response messages.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.field()
    }
}

// ============================================================================
// Pagination
// ============================================================================

/// Upper bound on `limit` for any paginated listing.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Page selection parsed from `?page=&limit=` query parameters.
///
/// Pages are 1-based. Missing values default to page 1 with 10 items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PageQuery {
    /// Clamp to sane bounds: page >= 1, 1 <= limit <= [`MAX_PAGE_LIMIT`].
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.clamp(1, MAX_PAGE_LIMIT),
        }
    }

    /// Number of documents to skip for this page.
    #[must_use]
    pub fn skip(&self) -> u64 {
        let page = self.normalized();
        u64::from(page.page - 1) * u64::from(page.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_asset_uses_public_id_field_name() {
        let asset = MediaAsset::new("https://cdn.example/a.png", "vidtube/a");
        let json = serde_json::to_value(&asset).unwrap();
        assert_eq!(json["url"], "https://cdn.example/a.png");
        assert_eq!(json["public_id"], "vidtube/a");
    }

    #[test]
    fn resource_type_paths() {
        assert_eq!(ResourceType::Image.as_str(), "image");
        assert_eq!(ResourceType::Video.to_string(), "video");
    }

    #[test]
    fn resource_type_from_reported() {
        assert_eq!(ResourceType::from_reported("video"), ResourceType::Video);
        assert_eq!(ResourceType::from_reported("image"), ResourceType::Image);
        assert_eq!(ResourceType::from_reported("raw"), ResourceType::Image);
    }

    #[test]
    fn like_target_fields() {
        let id = ObjectId::new();
        assert_eq!(LikeTarget::Video(id).field(), "video");
        assert_eq!(LikeTarget::Comment(id).field(), "comment");
        assert_eq!(LikeTarget::Tweet(id).field(), "tweet");
        assert_eq!(LikeTarget::Tweet(id).id(), id);
    }

    #[test]
    fn page_query_defaults() {
        let page: PageQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(page, PageQuery::default());
        assert_eq!(page.skip(), 0);
    }

    #[test]
    fn page_query_skip() {
        let page = PageQuery { page: 3, limit: 20 };
        assert_eq!(page.skip(), 40);
    }

    #[test]
    fn page_query_clamps() {
        let page = PageQuery { page: 0, limit: 1000 }.normalized();
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, MAX_PAGE_LIMIT);

        let page = PageQuery { page: 2, limit: 0 }.normalized();
        assert_eq!(page.limit, 1);
        assert_eq!(page.skip(), 1);
    }
}
