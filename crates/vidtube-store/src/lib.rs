//! vidtube-store: Storage layer for the VidTube backend
//!
//! This crate provides:
//! - MongoDB storage for users, videos, comments, likes, playlists,
//!   subscriptions and tweets
//! - Aggregation pipelines for profile, history and listing joins
//! - Index management
//!
//! # Usage
//!
//! ```rust,ignore
//! use vidtube_store::{Store, StoreConfig};
//!
//! let config = StoreConfig::from_env()?;
//! let store = Store::connect(config).await?;
//!
//! let user = store.get_user(user_id).await?;
//! let history = store.watch_history(user.id).await?;
//! ```

pub mod error;
pub mod models;
pub mod pipelines;
mod playlists;
pub mod schema;
mod social;
pub mod store;
mod videos;

pub use error::{StoreError, StoreResult};
pub use models::*;
pub use store::{Store, StoreConfig};

// Re-export vidtube-core for downstream crates
pub use vidtube_core;
