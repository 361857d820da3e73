//! In-memory document store

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::RwLock;

use super::store::DocumentStore;
use super::types::{DocId, SignedDocumentRecord, StorageError, StoredDocument};

/// Document storage held in process memory; contents are lost on restart
#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<DocId, (SignedDocumentRecord, Vec<u8>)>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(
        &self,
        id: &DocId,
        filename: &str,
        data: &[u8],
    ) -> Result<SignedDocumentRecord, StorageError> {
        let mut documents = self.documents.write();
        if documents.contains_key(id) {
            return Err(StorageError::AlreadyExists(id.to_string()));
        }

        let record = SignedDocumentRecord {
            id: id.clone(),
            filename: filename.to_string(),
            path: format!("memory://{}", id),
            size: data.len() as u64,
            created_at: Utc::now(),
        };
        documents.insert(id.clone(), (record.clone(), data.to_vec()));

        Ok(record)
    }

    async fn fetch(&self, id: &DocId) -> Result<StoredDocument, StorageError> {
        self.documents
            .read()
            .get(id)
            .map(|(record, data)| StoredDocument {
                record: record.clone(),
                data: data.clone(),
            })
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    async fn contains(&self, id: &DocId) -> bool {
        self.documents.read().contains_key(id)
    }
}
