//! Channel subscription routes.

use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use serde::Serialize;
use vidtube_core::parse_object_id;

use crate::auth::AuthenticatedUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::ValidatedPath;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::views::{SubscriptionEdgeView, SubscriptionView};

/// Result of a subscription toggle.
#[derive(Debug, Serialize)]
pub struct ToggleSubscriptionResponse {
    pub subscribed: bool,
    pub subscription: SubscriptionView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribersResponse {
    pub subs_count: usize,
    pub subscribers: Vec<SubscriptionEdgeView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionsResponse {
    pub subs_count: usize,
    pub subscriptions: Vec<SubscriptionEdgeView>,
}

/// POST /api/v1/subscriptions/toggle-sub/{channelId}
async fn toggle_subscription(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ValidatedPath(channel_id): ValidatedPath<String>,
) -> ApiResult<ApiResponse<ToggleSubscriptionResponse>> {
    let channel_id = parse_object_id(&channel_id, "channel")?;
    if auth.owns(channel_id) {
        return Err(ApiError::BadRequest(
            "You cannot subscribe to your own channel".to_string(),
        ));
    }
    if !state.store().user_exists(channel_id).await? {
        return Err(ApiError::NotFound("Channel not found".to_string()));
    }

    let store = state.store();
    if let Some(existing) = store.find_subscription(auth.id(), channel_id).await? {
        store.delete_subscription(existing.id).await?;
        tracing::info!(subscriber = %auth.id(), channel = %channel_id, "Unsubscribed");
        return Ok(ApiResponse::ok(
            ToggleSubscriptionResponse {
                subscribed: false,
                subscription: existing.into(),
            },
            "Unsubscribed successfully",
        ));
    }

    let subscription = store.insert_subscription(auth.id(), channel_id).await?;
    tracing::info!(subscriber = %auth.id(), channel = %channel_id, "Subscribed");
    Ok(ApiResponse::ok(
        ToggleSubscriptionResponse {
            subscribed: true,
            subscription: subscription.into(),
        },
        "Subscribed successfully",
    ))
}

/// GET /api/v1/subscriptions/get-subscribers/{channelId}
async fn channel_subscribers(
    State(state): State<AppState>,
    ValidatedPath(channel_id): ValidatedPath<String>,
) -> ApiResult<ApiResponse<SubscribersResponse>> {
    let channel_id = parse_object_id(&channel_id, "channel")?;
    if !state.store().user_exists(channel_id).await? {
        return Err(ApiError::NotFound("Channel not found".to_string()));
    }

    let subscribers = state.store().channel_subscribers(channel_id).await?;
    Ok(ApiResponse::ok(
        SubscribersResponse {
            subs_count: subscribers.len(),
            subscribers: subscribers.into_iter().map(SubscriptionEdgeView::from).collect(),
        },
        "Subscribers fetched successfully",
    ))
}

/// GET /api/v1/subscriptions/get-subscribed-channels
async fn subscribed_channels(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> ApiResult<ApiResponse<SubscriptionsResponse>> {
    let subscriptions = state.store().subscribed_channels(auth.id()).await?;
    Ok(ApiResponse::ok(
        SubscriptionsResponse {
            subs_count: subscriptions.len(),
            subscriptions: subscriptions
                .into_iter()
                .map(SubscriptionEdgeView::from)
                .collect(),
        },
        "Subscribed channels fetched successfully",
    ))
}

/// Build subscription routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/toggle-sub/{channelId}", post(toggle_subscription))
        .route("/get-subscribers/{channelId}", get(channel_subscribers))
        .route("/get-subscribed-channels", get(subscribed_channels))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_field_names() {
        let json = serde_json::to_value(SubscribersResponse {
            subs_count: 0,
            subscribers: Vec::new(),
        })
        .unwrap();
        assert_eq!(json["subsCount"], 0);
        assert!(json["subscribers"].is_array());
    }
}
