//! Tweet routes: short text posts on a channel.

use axum::{
    Router,
    extract::State,
    routing::{delete, get, patch, post},
};
use serde::Deserialize;
use vidtube_core::{ObjectId, check_max_chars, parse_object_id, require_non_blank};
use vidtube_store::TweetDocument;

use crate::auth::AuthenticatedUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ValidatedJson, ValidatedPath};
use crate::response::{ApiResponse, Empty};
use crate::state::AppState;
use crate::views::{TweetDetailsView, TweetView};

/// Maximum tweet length in characters.
pub const MAX_TWEET_CHARS: usize = 280;

/// Request body for creating or editing a tweet.
#[derive(Debug, Deserialize)]
pub struct TweetRequest {
    pub content: Option<String>,
}

impl TweetRequest {
    fn content(&self) -> ApiResult<&str> {
        let content = require_non_blank(self.content.as_deref(), "content")?;
        check_max_chars(content, "content", MAX_TWEET_CHARS)?;
        Ok(content)
    }
}

async fn list_tweets(state: &AppState, owner: ObjectId) -> ApiResult<ApiResponse<Vec<TweetDetailsView>>> {
    let tweets = state.store().user_tweets(owner).await?;
    let message = if tweets.is_empty() {
        "No tweets found"
    } else {
        "Tweets fetched successfully"
    };
    Ok(ApiResponse::ok(
        tweets.into_iter().map(TweetDetailsView::from).collect(),
        message,
    ))
}

/// POST /api/v1/tweets/create-tweet
async fn create_tweet(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ValidatedJson(req): ValidatedJson<TweetRequest>,
) -> ApiResult<ApiResponse<TweetView>> {
    let content = req.content()?;
    let tweet = TweetDocument::new(content.to_string(), auth.id());
    state.store().insert_tweet(&tweet).await?;

    tracing::info!(tweet_id = %tweet.id, owner = %tweet.owner, "Tweet created");

    Ok(ApiResponse::created(
        TweetView::from(tweet),
        "Tweet created successfully",
    ))
}

/// GET /api/v1/tweets/get-users-tweets - The current user's tweets.
async fn own_tweets(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> ApiResult<ApiResponse<Vec<TweetDetailsView>>> {
    list_tweets(&state, auth.id()).await
}

/// GET /api/v1/tweets/user/{userId} - Another user's tweets.
async fn user_tweets(
    State(state): State<AppState>,
    ValidatedPath(user_id): ValidatedPath<String>,
) -> ApiResult<ApiResponse<Vec<TweetDetailsView>>> {
    let user_id = parse_object_id(&user_id, "user")?;
    if !state.store().user_exists(user_id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }
    list_tweets(&state, user_id).await
}

/// PATCH /api/v1/tweets/update-tweet/{tweetId}
async fn update_tweet(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ValidatedPath(tweet_id): ValidatedPath<String>,
    ValidatedJson(req): ValidatedJson<TweetRequest>,
) -> ApiResult<ApiResponse<TweetView>> {
    let tweet_id = parse_object_id(&tweet_id, "tweet")?;
    let content = req.content()?;

    let tweet = state.store().get_tweet(tweet_id).await?;
    auth.require_owner(tweet.owner, "edit this tweet")?;

    let tweet = state.store().update_tweet_content(tweet_id, content).await?;
    Ok(ApiResponse::ok(
        TweetView::from(tweet),
        "Tweet updated successfully",
    ))
}

/// DELETE /api/v1/tweets/delete-tweet/{tweetId}
async fn delete_tweet(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ValidatedPath(tweet_id): ValidatedPath<String>,
) -> ApiResult<ApiResponse<Empty>> {
    let tweet_id = parse_object_id(&tweet_id, "tweet")?;
    let tweet = state.store().get_tweet(tweet_id).await?;
    auth.require_owner(tweet.owner, "delete this tweet")?;

    state.store().delete_tweet(tweet_id).await?;
    tracing::info!(tweet_id = %tweet_id, "Tweet deleted");

    Ok(ApiResponse::ok(Empty {}, "Tweet deleted successfully"))
}

/// Build tweet routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/create-tweet", post(create_tweet))
        .route("/get-users-tweets", get(own_tweets))
        .route("/user/{userId}", get(user_tweets))
        .route("/update-tweet/{tweetId}", patch(update_tweet))
        .route("/delete-tweet/{tweetId}", delete(delete_tweet))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(content: &str) -> TweetRequest {
        TweetRequest {
            content: Some(content.to_string()),
        }
    }

    #[test]
    fn test_tweet_content_is_trimmed() {
        assert_eq!(request("  hello  ").content().unwrap(), "hello");
    }

    #[test]
    fn test_tweet_length_limit() {
        let at_limit = "a".repeat(MAX_TWEET_CHARS);
        assert!(request(&at_limit).content().is_ok());

        let over = "a".repeat(MAX_TWEET_CHARS + 1);
        assert!(matches!(
            request(&over).content(),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_blank_tweet_rejected() {
        assert!(request("   ").content().is_err());
        assert!(TweetRequest { content: None }.content().is_err());
    }
}
