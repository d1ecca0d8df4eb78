//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::services::ParcelStore;

/// Application state shared across all handlers.
///
/// Built once during startup and cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    store: ParcelStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `store` - Parcel/payment store over the connected repository
    #[must_use]
    pub fn new(config: ServerConfig, store: ParcelStore) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, store }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the parcel/payment store.
    #[must_use]
    pub fn store(&self) -> &ParcelStore {
        &self.inner.store
    }
}
