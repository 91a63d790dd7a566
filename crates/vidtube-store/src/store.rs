//! Main store implementation for database operations.
//!
//! The `Store` type owns the MongoDB client and exposes typed operations per
//! collection. User operations live here; videos, social features and
//! playlists are in sibling modules as further `impl Store` blocks.

use futures::TryStreamExt;
use mongodb::bson::{self, DateTime, Document, doc, oid::ObjectId};
use mongodb::options::{ClientOptions, ReturnDocument};
use mongodb::{Client, Collection, Database};
use serde::de::DeserializeOwned;
use vidtube_core::MediaAsset;

use crate::error::{StoreError, StoreResult};
use crate::models::*;
use crate::pipelines;
use crate::schema::{self, collections};

/// Configuration for connecting to the database.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// MongoDB connection string.
    pub database_url: String,
    /// Database name.
    pub database_name: String,
    /// Maximum number of connections in the driver pool.
    pub max_pool_size: u32,
    /// Create indexes on connect.
    pub ensure_indexes: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: "mongodb://localhost:27017".to_string(),
            database_name: "vidtube".to_string(),
            max_pool_size: 10,
            ensure_indexes: true,
        }
    }
}

impl StoreConfig {
    /// Create configuration from environment variables.
    ///
    /// Reads:
    /// - `MONGODB_URI` - Required connection string
    /// - `DB_NAME` - Optional, defaults to "vidtube"
    /// - `MONGODB_MAX_POOL_SIZE` - Optional, defaults to 10
    /// - `DATABASE_ENSURE_INDEXES` - Optional, defaults to true
    pub fn from_env() -> StoreResult<Self> {
        let database_url = std::env::var("MONGODB_URI").map_err(|_| {
            StoreError::ConfigError("MONGODB_URI environment variable not set".to_string())
        })?;

        let database_name = std::env::var("DB_NAME").unwrap_or_else(|_| "vidtube".to_string());

        let max_pool_size = std::env::var("MONGODB_MAX_POOL_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        let ensure_indexes = std::env::var("DATABASE_ENSURE_INDEXES")
            .ok()
            .map(|s| s.to_lowercase() != "false" && s != "0")
            .unwrap_or(true);

        Ok(Self {
            database_url,
            database_name,
            max_pool_size,
            ensure_indexes,
        })
    }
}

/// Database store for the VidTube backend.
#[derive(Debug, Clone)]
pub struct Store {
    client: Client,
    db: Database,
}

impl Store {
    /// Connect to the database with the given configuration.
    ///
    /// Creates indexes if `config.ensure_indexes` is true, which is also the
    /// first round trip and therefore surfaces connection problems early.
    pub async fn connect(config: StoreConfig) -> StoreResult<Self> {
        tracing::info!(database = %config.database_name, "Connecting to database...");

        let mut options = ClientOptions::parse(&config.database_url).await?;
        options.max_pool_size = Some(config.max_pool_size);
        options.app_name = Some("vidtube".to_string());

        let client = Client::with_options(options)?;
        let store = Self::from_client(client, &config.database_name);

        if config.ensure_indexes {
            schema::ensure_indexes(&store.db).await?;
        }

        tracing::info!("Connected to database");
        Ok(store)
    }

    /// Create a store from an existing client.
    ///
    /// The driver connects lazily, so this performs no I/O.
    pub fn from_client(client: Client, database_name: &str) -> Self {
        let db = client.database(database_name);
        Self { client, db }
    }

    /// The underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The application database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    pub(crate) fn users(&self) -> Collection<UserDocument> {
        self.db.collection(collections::USERS)
    }

    pub(crate) fn videos(&self) -> Collection<VideoDocument> {
        self.db.collection(collections::VIDEOS)
    }

    pub(crate) fn comments(&self) -> Collection<CommentDocument> {
        self.db.collection(collections::COMMENTS)
    }

    pub(crate) fn likes(&self) -> Collection<LikeDocument> {
        self.db.collection(collections::LIKES)
    }

    pub(crate) fn playlists(&self) -> Collection<PlaylistDocument> {
        self.db.collection(collections::PLAYLISTS)
    }

    pub(crate) fn subscriptions(&self) -> Collection<SubscriptionDocument> {
        self.db.collection(collections::SUBSCRIPTIONS)
    }

    pub(crate) fn tweets(&self) -> Collection<TweetDocument> {
        self.db.collection(collections::TWEETS)
    }

    /// Run a pipeline on `collection` and decode every result document.
    pub(crate) async fn aggregate_into<T, C>(
        &self,
        collection: &Collection<C>,
        pipeline: Vec<Document>,
    ) -> StoreResult<Vec<T>>
    where
        T: DeserializeOwned,
        C: Send + Sync,
    {
        let documents: Vec<Document> = collection.aggregate(pipeline).await?.try_collect().await?;
        documents
            .into_iter()
            .map(|d| bson::from_document(d).map_err(StoreError::from))
            .collect()
    }

    /// Run a pipeline and decode the first result, if any.
    pub(crate) async fn aggregate_one<T, C>(
        &self,
        collection: &Collection<C>,
        pipeline: Vec<Document>,
    ) -> StoreResult<Option<T>>
    where
        T: DeserializeOwned,
        C: Send + Sync,
    {
        Ok(self
            .aggregate_into(collection, pipeline)
            .await?
            .into_iter()
            .next())
    }

    // ==================== User Operations ====================

    /// Find a user whose username or email matches either value.
    pub async fn find_user_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> StoreResult<Option<UserDocument>> {
        Ok(self
            .users()
            .find_one(doc! { "$or": [ { "username": username }, { "email": email } ] })
            .await?)
    }

    /// Find the user to log in. `email` is required; when `username` is
    /// given it must belong to the same user.
    pub async fn find_user_for_login(
        &self,
        email: &str,
        username: Option<&str>,
    ) -> StoreResult<Option<UserDocument>> {
        let mut filter = doc! { "email": email };
        if let Some(username) = username {
            filter.insert("username", username);
        }
        Ok(self.users().find_one(filter).await?)
    }

    /// Get a user by id.
    pub async fn get_user(&self, id: ObjectId) -> StoreResult<UserDocument> {
        self.users()
            .find_one(doc! { "_id": id })
            .await?
            .ok_or(StoreError::UserNotFound(id))
    }

    /// Whether a user exists.
    pub async fn user_exists(&self, id: ObjectId) -> StoreResult<bool> {
        Ok(self.users().count_documents(doc! { "_id": id }).await? > 0)
    }

    /// Insert a new user.
    pub async fn insert_user(&self, user: NewUser) -> StoreResult<UserDocument> {
        let document = UserDocument::from(user);
        self.users().insert_one(&document).await?;
        tracing::debug!(user_id = %document.id, "Inserted user");
        Ok(document)
    }

    /// Store the user's current refresh token.
    pub async fn set_refresh_token(&self, id: ObjectId, token: &str) -> StoreResult<()> {
        let result = self
            .users()
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "refreshToken": token, "updatedAt": DateTime::now() } },
            )
            .await?;
        if result.matched_count == 0 {
            return Err(StoreError::UserNotFound(id));
        }
        Ok(())
    }

    /// Remove the user's refresh token (logout).
    pub async fn clear_refresh_token(&self, id: ObjectId) -> StoreResult<()> {
        self.users()
            .update_one(
                doc! { "_id": id },
                doc! { "$unset": { "refreshToken": 1 }, "$set": { "updatedAt": DateTime::now() } },
            )
            .await?;
        Ok(())
    }

    /// Replace the user's password hash.
    ///
    /// Existing refresh tokens are revoked so other sessions must log in
    /// again.
    pub async fn update_password(&self, id: ObjectId, password_hash: &str) -> StoreResult<()> {
        let result = self
            .users()
            .update_one(
                doc! { "_id": id },
                doc! {
                    "$set": { "password": password_hash, "updatedAt": DateTime::now() },
                    "$unset": { "refreshToken": 1 },
                },
            )
            .await?;
        if result.matched_count == 0 {
            return Err(StoreError::UserNotFound(id));
        }
        Ok(())
    }

    /// Whether `email` belongs to a user other than `id`.
    pub async fn email_taken_by_other(&self, email: &str, id: ObjectId) -> StoreResult<bool> {
        let count = self
            .users()
            .count_documents(doc! { "email": email, "_id": { "$ne": id } })
            .await?;
        Ok(count > 0)
    }

    async fn set_user_fields(&self, id: ObjectId, mut fields: Document) -> StoreResult<UserDocument> {
        fields.insert("updatedAt", DateTime::now());
        self.users()
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": fields })
            .return_document(ReturnDocument::After)
            .await?
            .ok_or(StoreError::UserNotFound(id))
    }

    /// Update the user's display name and email.
    pub async fn update_account(
        &self,
        id: ObjectId,
        fullname: &str,
        email: &str,
    ) -> StoreResult<UserDocument> {
        self.set_user_fields(id, doc! { "fullname": fullname, "email": email })
            .await
    }

    /// Replace the user's avatar. Returns the updated user.
    pub async fn update_avatar(&self, id: ObjectId, avatar: &MediaAsset) -> StoreResult<UserDocument> {
        self.set_user_fields(id, doc! { "avatar": bson::to_bson(avatar)? })
            .await
    }

    /// Replace the user's cover image. Returns the updated user.
    pub async fn update_cover_image(
        &self,
        id: ObjectId,
        cover_image: &MediaAsset,
    ) -> StoreResult<UserDocument> {
        self.set_user_fields(id, doc! { "coverImage": bson::to_bson(cover_image)? })
            .await
    }

    /// Public channel profile for `username` as seen by `viewer`.
    pub async fn channel_profile(
        &self,
        username: &str,
        viewer: Option<ObjectId>,
    ) -> StoreResult<Option<ChannelProfile>> {
        self.aggregate_one(&self.users(), pipelines::channel_profile(username, viewer))
            .await
    }

    /// The user's watch history, most recent first, with video owners.
    pub async fn watch_history(&self, user_id: ObjectId) -> StoreResult<Vec<VideoSummary>> {
        let join: Option<WatchHistoryJoin> = self
            .aggregate_one(&self.users(), pipelines::watch_history(user_id))
            .await?;
        let join = join.ok_or(StoreError::UserNotFound(user_id))?;
        Ok(join.into_ordered())
    }

    /// Move `video_id` to the front of the user's watch history, keeping at
    /// most [`WATCH_HISTORY_LIMIT`] entries.
    pub async fn record_watch(&self, user_id: ObjectId, video_id: ObjectId) -> StoreResult<()> {
        // $pull and $push on the same field cannot share one update.
        self.users()
            .update_one(
                doc! { "_id": user_id },
                doc! { "$pull": { "watchHistory": video_id } },
            )
            .await?;
        self.users()
            .update_one(
                doc! { "_id": user_id },
                doc! {
                    "$push": {
                        "watchHistory": {
                            "$each": [video_id],
                            "$position": 0,
                            "$slice": WATCH_HISTORY_LIMIT,
                        }
                    }
                },
            )
            .await?;
        Ok(())
    }
}
