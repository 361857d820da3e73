//! Storage for signed documents
//!
//! Used by the stored delivery mode. Backends: local filesystem and memory.

mod local;
mod memory;
mod store;
mod types;

pub use local::LocalDocumentStore;
pub use memory::MemoryDocumentStore;
pub use store::{DocumentStore, SignedDocumentStore};
pub use types::*;
