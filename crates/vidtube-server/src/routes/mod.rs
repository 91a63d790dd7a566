//! Route definitions for the HTTP API.
//!
//! Every resource router is nested under `/api/v1`; the health check sits
//! at the root.

pub mod comments;
pub mod dashboard;
pub mod health;
pub mod likes;
pub mod playlists;
pub mod subscriptions;
pub mod tweets;
pub mod users;
pub mod videos;

use axum::{Router, extract::DefaultBodyLimit};

use crate::state::AppState;

/// Prefix shared by all resource routes.
pub const API_PREFIX: &str = "/api/v1";

/// Build the complete router with all routes.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/users", users::routes())
        .nest("/videos", videos::routes())
        .nest("/comments", comments::routes())
        .nest("/likes", likes::routes())
        .nest("/playlist", playlists::routes())
        .nest("/subscriptions", subscriptions::routes())
        .nest("/tweets", tweets::routes())
        .nest("/dashboard", dashboard::routes());

    let body_limit = state.config().max_upload_bytes;

    Router::new()
        .merge(health::routes())
        .nest(API_PREFIX, api)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
