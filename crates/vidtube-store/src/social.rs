//! Comments, likes, subscriptions and tweets.

use mongodb::bson::{DateTime, doc, oid::ObjectId};
use mongodb::options::ReturnDocument;
use vidtube_core::{LikeTarget, PageQuery};

use crate::error::{StoreError, StoreResult};
use crate::models::*;
use crate::pipelines;
use crate::store::Store;

impl Store {
    // ==================== Comments ====================

    /// One page of a video's comments, newest first.
    pub async fn video_comments(
        &self,
        video_id: ObjectId,
        page: PageQuery,
    ) -> StoreResult<Vec<CommentDetails>> {
        self.aggregate_into(&self.comments(), pipelines::video_comments(video_id, page))
            .await
    }

    /// Total comments on a video.
    pub async fn count_video_comments(&self, video_id: ObjectId) -> StoreResult<u64> {
        Ok(self
            .comments()
            .count_documents(doc! { "video": video_id })
            .await?)
    }

    /// An identical comment by the same user on the same video, if any.
    pub async fn find_comment_by_owner_and_content(
        &self,
        video_id: ObjectId,
        owner: ObjectId,
        content: &str,
    ) -> StoreResult<Option<CommentDocument>> {
        Ok(self
            .comments()
            .find_one(doc! { "video": video_id, "owner": owner, "content": content })
            .await?)
    }

    /// Insert a comment.
    pub async fn insert_comment(&self, comment: &CommentDocument) -> StoreResult<()> {
        self.comments().insert_one(comment).await?;
        Ok(())
    }

    /// Get a comment by id.
    pub async fn get_comment(&self, id: ObjectId) -> StoreResult<CommentDocument> {
        self.comments()
            .find_one(doc! { "_id": id })
            .await?
            .ok_or(StoreError::CommentNotFound(id))
    }

    /// A comment joined with its video title and author.
    pub async fn populated_comment(&self, id: ObjectId) -> StoreResult<CommentDetails> {
        let details: Option<CommentDetails> = self
            .aggregate_one(&self.comments(), pipelines::comment_details(id))
            .await?;
        details.ok_or(StoreError::CommentNotFound(id))
    }

    /// Replace a comment's content and return the updated document.
    pub async fn update_comment_content(
        &self,
        id: ObjectId,
        content: &str,
    ) -> StoreResult<CommentDocument> {
        self.comments()
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": { "content": content, "updatedAt": DateTime::now() } },
            )
            .return_document(ReturnDocument::After)
            .await?
            .ok_or(StoreError::CommentNotFound(id))
    }

    /// Delete a comment together with its likes.
    pub async fn delete_comment(&self, id: ObjectId) -> StoreResult<CommentDocument> {
        let comment = self
            .comments()
            .find_one_and_delete(doc! { "_id": id })
            .await?
            .ok_or(StoreError::CommentNotFound(id))?;
        self.likes().delete_many(doc! { "comment": id }).await?;
        Ok(comment)
    }

    // ==================== Likes ====================

    /// The like `user` placed on `target`, if any.
    pub async fn find_like(
        &self,
        target: LikeTarget,
        user: ObjectId,
    ) -> StoreResult<Option<LikeDocument>> {
        let mut filter = doc! { "likedBy": user };
        filter.insert(target.field(), target.id());
        Ok(self.likes().find_one(filter).await?)
    }

    /// Insert a like.
    pub async fn insert_like(&self, target: LikeTarget, user: ObjectId) -> StoreResult<LikeDocument> {
        let like = LikeDocument::new(target, user);
        self.likes().insert_one(&like).await?;
        Ok(like)
    }

    /// Delete a like by id. Returns whether it existed.
    pub async fn delete_like(&self, id: ObjectId) -> StoreResult<bool> {
        let result = self.likes().delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    /// Videos liked by `user`, most recent like first.
    pub async fn liked_videos(&self, user: ObjectId) -> StoreResult<Vec<LikedVideo>> {
        self.aggregate_into(&self.likes(), pipelines::liked_videos(user))
            .await
    }

    // ==================== Subscriptions ====================

    /// The subscription of `subscriber` to `channel`, if any.
    pub async fn find_subscription(
        &self,
        subscriber: ObjectId,
        channel: ObjectId,
    ) -> StoreResult<Option<SubscriptionDocument>> {
        Ok(self
            .subscriptions()
            .find_one(doc! { "subscriber": subscriber, "channel": channel })
            .await?)
    }

    /// Subscribe `subscriber` to `channel`.
    pub async fn insert_subscription(
        &self,
        subscriber: ObjectId,
        channel: ObjectId,
    ) -> StoreResult<SubscriptionDocument> {
        let subscription = SubscriptionDocument::new(subscriber, channel);
        self.subscriptions().insert_one(&subscription).await?;
        Ok(subscription)
    }

    /// Delete a subscription by id. Returns whether it existed.
    pub async fn delete_subscription(&self, id: ObjectId) -> StoreResult<bool> {
        let result = self.subscriptions().delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    /// Users subscribed to `channel`, newest first.
    pub async fn channel_subscribers(&self, channel: ObjectId) -> StoreResult<Vec<SubscriptionEdge>> {
        self.aggregate_into(&self.subscriptions(), pipelines::channel_subscribers(channel))
            .await
    }

    /// Channels `subscriber` follows, newest first.
    pub async fn subscribed_channels(
        &self,
        subscriber: ObjectId,
    ) -> StoreResult<Vec<SubscriptionEdge>> {
        self.aggregate_into(
            &self.subscriptions(),
            pipelines::subscribed_channels(subscriber),
        )
        .await
    }

    /// Number of subscribers of `channel`.
    pub async fn count_subscribers(&self, channel: ObjectId) -> StoreResult<i64> {
        let count = self
            .subscriptions()
            .count_documents(doc! { "channel": channel })
            .await?;
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    // ==================== Tweets ====================

    /// Insert a tweet.
    pub async fn insert_tweet(&self, tweet: &TweetDocument) -> StoreResult<()> {
        self.tweets().insert_one(tweet).await?;
        Ok(())
    }

    /// Get a tweet by id.
    pub async fn get_tweet(&self, id: ObjectId) -> StoreResult<TweetDocument> {
        self.tweets()
            .find_one(doc! { "_id": id })
            .await?
            .ok_or(StoreError::TweetNotFound(id))
    }

    /// Tweets by `owner`, newest first, with like counts.
    pub async fn user_tweets(&self, owner: ObjectId) -> StoreResult<Vec<TweetDetails>> {
        self.aggregate_into(&self.tweets(), pipelines::user_tweets(owner))
            .await
    }

    /// Replace a tweet's content and return the updated document.
    pub async fn update_tweet_content(
        &self,
        id: ObjectId,
        content: &str,
    ) -> StoreResult<TweetDocument> {
        self.tweets()
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": { "content": content, "updatedAt": DateTime::now() } },
            )
            .return_document(ReturnDocument::After)
            .await?
            .ok_or(StoreError::TweetNotFound(id))
    }

    /// Delete a tweet together with its likes.
    pub async fn delete_tweet(&self, id: ObjectId) -> StoreResult<TweetDocument> {
        let tweet = self
            .tweets()
            .find_one_and_delete(doc! { "_id": id })
            .await?
            .ok_or(StoreError::TweetNotFound(id))?;
        self.likes().delete_many(doc! { "tweet": id }).await?;
        Ok(tweet)
    }
}
