//! Application state shared across handlers.

use std::sync::Arc;

use vidtube_media::MediaStorage;
use vidtube_store::Store;

use crate::config::ServerConfig;

/// Application state shared across all handlers.
///
/// This is cloneable and can be extracted in handlers using `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// Database store.
    store: Arc<Store>,
    /// Hosted media storage.
    media: Arc<dyn MediaStorage>,
    /// Server configuration.
    config: Arc<ServerConfig>,
}

impl AppState {
    /// Create new application state.
    pub fn new(store: Store, media: Arc<dyn MediaStorage>, config: ServerConfig) -> Self {
        Self {
            store: Arc::new(store),
            media,
            config: Arc::new(config),
        }
    }

    /// Get a reference to the database store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Get a reference to the media storage.
    pub fn media(&self) -> &dyn MediaStorage {
        self.media.as_ref()
    }

    /// Get a reference to the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("media", &self.media.name())
            .finish_non_exhaustive()
    }
}
