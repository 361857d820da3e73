//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::delivery::DeliveryMode;
use crate::storage::SignedDocumentStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    /// Present only in stored delivery mode
    document_store: Option<SignedDocumentStore>,
}

impl AppState {
    /// Create state from configuration.
    ///
    /// Stored delivery gets a local document store under `STORAGE_DIR`.
    pub fn new(config: Config) -> Self {
        let document_store = match config.delivery.mode {
            DeliveryMode::Inline => None,
            DeliveryMode::Stored => Some(SignedDocumentStore::with_local_storage(
                config.delivery.storage_dir.clone(),
            )),
        };

        Self {
            inner: Arc::new(AppStateInner {
                config,
                document_store,
            }),
        }
    }

    /// Create state for stored delivery with a specific store
    pub fn with_store(mut config: Config, store: SignedDocumentStore) -> Self {
        config.delivery.mode = DeliveryMode::Stored;
        Self {
            inner: Arc::new(AppStateInner {
                config,
                document_store: Some(store),
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn delivery_mode(&self) -> DeliveryMode {
        self.inner.config.delivery.mode
    }

    /// Get the document store (stored delivery only)
    pub fn document_store(&self) -> Option<&SignedDocumentStore> {
        self.inner.document_store.as_ref()
    }
}
