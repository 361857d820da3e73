//! Storage types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of a signed-document identifier in hex characters
pub const DOC_ID_LEN: usize = 12;

/// Identifier of a stored signed document.
///
/// Always exactly [`DOC_ID_LEN`] lowercase hex characters, which also makes
/// it safe to use as a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocId(String);

impl DocId {
    /// Fresh random identifier (48 bits from a UUIDv4)
    pub fn generate() -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        Self(simple[..DOC_ID_LEN].to_string())
    }

    /// Validate an identifier received from a client
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = raw.len() == DOC_ID_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DocId {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DocId::parse(&value).ok_or(StorageError::NotFound(value))
    }
}

impl From<DocId> for String {
    fn from(id: DocId) -> Self {
        id.0
    }
}

/// Metadata about a stored signed document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedDocumentRecord {
    pub id: DocId,
    /// Client-facing file name
    pub filename: String,
    /// Backend location (file path, or `memory://<id>`)
    pub path: String,
    /// Size in bytes
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

/// A stored document with its data
#[derive(Debug)]
pub struct StoredDocument {
    pub record: SignedDocumentRecord,
    pub data: Vec<u8>,
}

/// Storage error types
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Document already exists: {0}")]
    AlreadyExists(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
