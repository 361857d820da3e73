//! Signed document store
//!
//! Append-only keyed storage for finished documents. Records are created on
//! submit and read on download; nothing is updated or deleted.

use std::path::PathBuf;
use std::sync::Arc;

use super::local::LocalDocumentStore;
use super::memory::MemoryDocumentStore;
use super::types::{DocId, SignedDocumentRecord, StorageError, StoredDocument};

/// Attempts at finding an unused identifier before giving up
const MAX_ID_ATTEMPTS: usize = 3;

// ============================================================================
// Store Trait
// ============================================================================

/// Trait for signed document storage backends
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store a document under `id`.
    ///
    /// Fails with [`StorageError::AlreadyExists`] if the id is taken; existing
    /// content is never overwritten.
    async fn insert(
        &self,
        id: &DocId,
        filename: &str,
        data: &[u8],
    ) -> Result<SignedDocumentRecord, StorageError>;

    /// Read a document back
    async fn fetch(&self, id: &DocId) -> Result<StoredDocument, StorageError>;

    /// Check if a document exists
    async fn contains(&self, id: &DocId) -> bool;
}

// ============================================================================
// Signed Document Store (facade)
// ============================================================================

/// Signed document store with a pluggable backend
#[derive(Clone)]
pub struct SignedDocumentStore {
    inner: Arc<dyn DocumentStore>,
}

impl SignedDocumentStore {
    /// Create with local filesystem storage
    pub fn with_local_storage(base_path: PathBuf) -> Self {
        Self::with_backend(LocalDocumentStore::new(base_path))
    }

    /// Create with in-memory storage
    pub fn in_memory() -> Self {
        Self::with_backend(MemoryDocumentStore::new())
    }

    /// Create with any backend
    pub fn with_backend(backend: impl DocumentStore + 'static) -> Self {
        Self {
            inner: Arc::new(backend),
        }
    }

    /// Persist a document under a freshly generated identifier.
    ///
    /// Collisions are retried with a new identifier.
    pub async fn store(
        &self,
        filename: &str,
        data: &[u8],
    ) -> Result<SignedDocumentRecord, StorageError> {
        self.store_with(DocId::generate, filename, data).await
    }

    async fn store_with<G>(
        &self,
        mut generate: G,
        filename: &str,
        data: &[u8],
    ) -> Result<SignedDocumentRecord, StorageError>
    where
        G: FnMut() -> DocId,
    {
        let mut last_err = None;

        for attempt in 1..=MAX_ID_ATTEMPTS {
            let id = generate();
            match self.inner.insert(&id, filename, data).await {
                Ok(record) => {
                    tracing::info!(
                        doc_id = %record.id,
                        size = record.size,
                        "Stored signed document"
                    );
                    return Ok(record);
                }
                Err(StorageError::AlreadyExists(taken)) => {
                    tracing::warn!(doc_id = %taken, attempt = attempt, "Document id collision, retrying");
                    last_err = Some(StorageError::AlreadyExists(taken));
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| StorageError::AlreadyExists(String::new())))
    }

    /// Look up a document by a client-supplied identifier.
    ///
    /// Malformed identifiers are reported as not found without touching the
    /// backend.
    pub async fn fetch(&self, raw_id: &str) -> Result<StoredDocument, StorageError> {
        let id = DocId::parse(raw_id).ok_or_else(|| StorageError::NotFound(raw_id.to_string()))?;
        self.inner.fetch(&id).await
    }

    /// Check if a document exists
    pub async fn contains(&self, raw_id: &str) -> bool {
        match DocId::parse(raw_id) {
            Some(id) => self.inner.contains(&id).await,
            None => false,
        }
    }
}
