//! vidtube-core: Shared domain vocabulary for the VidTube backend
//!
//! This crate provides:
//! - Object id parsing for path and body identifiers
//! - Media asset references shared by the store and the media client
//! - Like targets, pagination parameters and field validation helpers
//!
//! Nothing in here performs I/O; the store and server crates build on
//! these types.

pub mod ids;
pub mod types;
pub mod validation;

pub use bson::oid::ObjectId;
pub use ids::{InvalidId, parse_object_id};
pub use types::{LikeTarget, MediaAsset, PageQuery, ResourceType};
pub use validation::{
    ValidationError, check_max_chars, escape_regex, normalize_email, normalize_username,
    require_non_blank,
};
