//! Local filesystem document store
//!
//! Layout:
//!
//! ```text
//! <base>/<id>.pdf    signed document bytes
//! <base>/<id>.json   SignedDocumentRecord
//! ```

use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;

use super::store::DocumentStore;
use super::types::{DocId, SignedDocumentRecord, StorageError, StoredDocument};

/// Local filesystem document storage
pub struct LocalDocumentStore {
    base_path: PathBuf,
}

impl LocalDocumentStore {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn pdf_path(&self, id: &DocId) -> PathBuf {
        self.base_path.join(format!("{}.pdf", id))
    }

    fn record_path(&self, id: &DocId) -> PathBuf {
        self.base_path.join(format!("{}.json", id))
    }

    async fn write_document(mut file: tokio::fs::File, data: &[u8]) -> Result<(), StorageError> {
        file.write_all(data).await?;
        file.flush().await?;
        Ok(())
    }

    async fn write_record(
        &self,
        id: &DocId,
        filename: &str,
        size: u64,
    ) -> Result<SignedDocumentRecord, StorageError> {
        let record = SignedDocumentRecord {
            id: id.clone(),
            filename: filename.to_string(),
            path: self.pdf_path(id).to_string_lossy().to_string(),
            size,
            created_at: Utc::now(),
        };

        let json = serde_json::to_vec_pretty(&record)?;
        tokio::fs::write(self.record_path(id), json).await?;
        Ok(record)
    }

    /// Remove what a failed insert left behind, best effort
    async fn discard(&self, id: &DocId) {
        for path in [self.pdf_path(id), self.record_path(id)] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(doc_id = %id, "Failed to remove {}: {}", path.display(), e)
                }
            }
        }
    }

    /// Rebuild a record for a PDF whose sidecar is missing or unreadable
    async fn fallback_record(&self, id: &DocId, size: u64) -> SignedDocumentRecord {
        let created_at = tokio::fs::metadata(self.pdf_path(id))
            .await
            .and_then(|meta| meta.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        SignedDocumentRecord {
            id: id.clone(),
            filename: format!("{}.pdf", id),
            path: self.pdf_path(id).to_string_lossy().to_string(),
            size,
            created_at,
        }
    }
}

#[async_trait::async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn insert(
        &self,
        id: &DocId,
        filename: &str,
        data: &[u8],
    ) -> Result<SignedDocumentRecord, StorageError> {
        tokio::fs::create_dir_all(&self.base_path).await?;

        let pdf_path = self.pdf_path(id);
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&pdf_path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => StorageError::AlreadyExists(id.to_string()),
                _ => StorageError::Io(e),
            })?;

        let result = match Self::write_document(file, data).await {
            Ok(()) => self.write_record(id, filename, data.len() as u64).await,
            Err(e) => Err(e),
        };

        if result.is_err() {
            self.discard(id).await;
        }
        result
    }

    async fn fetch(&self, id: &DocId) -> Result<StoredDocument, StorageError> {
        let data = match tokio::fs::read(self.pdf_path(id)).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(id.to_string()))
            }
            Err(e) => return Err(StorageError::Io(e)),
        };

        let record = match tokio::fs::read(self.record_path(id)).await {
            Ok(json) => match serde_json::from_slice::<SignedDocumentRecord>(&json) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(doc_id = %id, "Unreadable document record: {}", e);
                    self.fallback_record(id, data.len() as u64).await
                }
            },
            Err(_) => self.fallback_record(id, data.len() as u64).await,
        };

        Ok(StoredDocument { record, data })
    }

    async fn contains(&self, id: &DocId) -> bool {
        tokio::fs::try_exists(self.pdf_path(id)).await.unwrap_or(false)
    }
}
