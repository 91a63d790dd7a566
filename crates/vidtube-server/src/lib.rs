//! vidtube-server: HTTP API for the VidTube video-sharing backend
//!
//! This crate provides:
//! - REST endpoints under `/api/v1` for users, videos, comments, likes,
//!   playlists, subscriptions, tweets and the channel dashboard
//! - JWT access/refresh authentication via cookies or bearer headers
//! - Multipart upload handling backed by a [`vidtube_media::MediaStorage`]
//! - The `{statusCode, data, message, success}` response envelope
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vidtube_server::{AppState, ServerConfig, routes};
//!
//! let state = AppState::new(store, media, ServerConfig::from_env()?);
//! let app = routes::build_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;
pub mod upload;
pub mod views;

// Re-exports for convenience
pub use auth::AuthenticatedUser;
pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use response::ApiResponse;
pub use state::AppState;

// Re-export dependent crates
pub use vidtube_core;
pub use vidtube_media;
pub use vidtube_store;
