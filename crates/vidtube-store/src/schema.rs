//! Collection names and index setup.
//!
//! MongoDB creates collections lazily, so the only schema work is making
//! sure the indexes exist. Index creation is idempotent and runs on
//! connect unless disabled.

use mongodb::bson::{Document, doc};
use mongodb::options::IndexOptions;
use mongodb::{Database, IndexModel};

use crate::error::StoreResult;

/// Collection names.
pub mod collections {
    pub const USERS: &str = "users";
    pub const VIDEOS: &str = "videos";
    pub const COMMENTS: &str = "comments";
    pub const LIKES: &str = "likes";
    pub const PLAYLISTS: &str = "playlists";
    pub const SUBSCRIPTIONS: &str = "subscriptions";
    pub const TWEETS: &str = "tweets";
}

/// An index to ensure on a collection.
#[derive(Debug, Clone)]
pub struct IndexSpec {
    pub collection: &'static str,
    pub keys: Document,
    pub unique: bool,
}

/// Every index the application relies on.
pub fn index_specs() -> Vec<IndexSpec> {
    let spec = |collection, keys, unique| IndexSpec {
        collection,
        keys,
        unique,
    };
    vec![
        spec(collections::USERS, doc! { "username": 1 }, true),
        spec(collections::USERS, doc! { "email": 1 }, true),
        spec(collections::VIDEOS, doc! { "owner": 1, "createdAt": -1 }, false),
        spec(collections::VIDEOS, doc! { "title": 1 }, false),
        spec(collections::COMMENTS, doc! { "video": 1, "createdAt": -1 }, false),
        spec(collections::LIKES, doc! { "likedBy": 1, "video": 1 }, false),
        spec(collections::LIKES, doc! { "comment": 1 }, false),
        spec(collections::LIKES, doc! { "tweet": 1 }, false),
        spec(collections::PLAYLISTS, doc! { "owner": 1, "name": 1 }, false),
        spec(
            collections::SUBSCRIPTIONS,
            doc! { "subscriber": 1, "channel": 1 },
            true,
        ),
        spec(collections::SUBSCRIPTIONS, doc! { "channel": 1 }, false),
        spec(collections::TWEETS, doc! { "owner": 1, "createdAt": -1 }, false),
    ]
}

/// Create all indexes. Safe to run repeatedly.
pub async fn ensure_indexes(db: &Database) -> StoreResult<()> {
    tracing::info!("Ensuring database indexes...");

    for spec in index_specs() {
        let options = IndexOptions::builder().unique(spec.unique).build();
        let model = IndexModel::builder()
            .keys(spec.keys.clone())
            .options(options)
            .build();

        db.collection::<Document>(spec.collection)
            .create_index(model)
            .await?;
        tracing::debug!(collection = spec.collection, keys = %spec.keys, "Index ensured");
    }

    tracing::info!("Indexes ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_indexes() {
        let unique: Vec<(&str, Document)> = index_specs()
            .into_iter()
            .filter(|s| s.unique)
            .map(|s| (s.collection, s.keys))
            .collect();

        assert!(unique.contains(&(collections::USERS, doc! { "username": 1 })));
        assert!(unique.contains(&(collections::USERS, doc! { "email": 1 })));
        assert!(unique.contains(&(
            collections::SUBSCRIPTIONS,
            doc! { "subscriber": 1, "channel": 1 }
        )));
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_every_collection_indexed() {
        let specs = index_specs();
        for name in [
            collections::USERS,
            collections::VIDEOS,
            collections::COMMENTS,
            collections::LIKES,
            collections::PLAYLISTS,
            collections::SUBSCRIPTIONS,
            collections::TWEETS,
        ] {
            assert!(specs.iter().any(|s| s.collection == name), "{name} has no index");
        }
    }
}
