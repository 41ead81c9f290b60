//! Document store seam for run bookkeeping
//!
//! Provides the persistence contract the runs framework is written against:
//! - Run documents keyed by dataset, runs field and run key
//! - Opaque results blobs tagged with a content type
//! - A lock-free in-memory backend for tests, demos and embedding
//!
//! # Example
//!
//! ```rust
//! use trueno_runs::store::{DocumentStore, MemoryDocumentStore, RunDocument};
//!
//! # fn example() -> trueno_runs::Result<()> {
//! let store = MemoryDocumentStore::new();
//!
//! let doc = RunDocument::new("dataset-1", "eval");
//! store.put_run("evaluations", doc)?;
//! assert!(store.contains_run("dataset-1", "evaluations", "eval")?);
//!
//! store.remove_run("dataset-1", "evaluations", "eval")?;
//! assert!(store.list_run_keys("dataset-1", "evaluations")?.is_empty());
//! # Ok(())
//! # }
//! ```

mod memory;

pub use memory::MemoryDocumentStore;

use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Content type used for results blobs.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Handle to a stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobId(String);

impl BlobId {
    /// Allocate a fresh handle.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the handle as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BlobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored blob contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    /// Raw bytes
    pub data: Vec<u8>,
    /// MIME type recorded at write time
    pub content_type: String,
}

/// Persisted counterpart of a run's metadata.
///
/// Owned by the dataset document; exactly one per `(dataset, runs field, key)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDocument {
    /// ID of the root dataset
    pub dataset_id: String,
    /// Run key
    pub key: String,
    /// Library version that executed the run
    pub version: Option<String>,
    /// UTC time of the run
    pub timestamp: Option<DateTime<Utc>>,
    /// Serialized run config (`method`, `cls`, fields...)
    pub config: Value,
    /// JSON-encoded view stages the run was executed against
    pub view_stages: Vec<String>,
    /// Handle of the results blob, if results were saved
    pub results: Option<BlobId>,
}

impl RunDocument {
    /// Create an empty document for a key.
    #[must_use]
    pub fn new(dataset_id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            key: key.into(),
            version: None,
            timestamp: None,
            config: Value::Null,
            view_stages: Vec::new(),
            results: None,
        }
    }
}

/// Document store contract used by the runs framework.
///
/// Calls are synchronous and each one is atomic on its own; nothing here
/// groups several calls into a transaction.
pub trait DocumentStore: Send + Sync {
    /// List run keys stored on a dataset under a runs field.
    fn list_run_keys(&self, dataset_id: &str, field: &str) -> Result<Vec<String>>;

    /// Get a run document.
    ///
    /// Returns `None` if the key doesn't exist.
    fn get_run(&self, dataset_id: &str, field: &str, key: &str) -> Result<Option<RunDocument>>;

    /// Insert or replace a run document, keyed by its `dataset_id` and `key`.
    fn put_run(&self, field: &str, doc: RunDocument) -> Result<()>;

    /// Remove a run document, returning it if it existed.
    fn remove_run(&self, dataset_id: &str, field: &str, key: &str)
        -> Result<Option<RunDocument>>;

    /// Store a blob and return its handle.
    fn put_blob(&self, data: Vec<u8>, content_type: &str) -> Result<BlobId>;

    /// Read a blob.
    ///
    /// Returns `None` if the handle doesn't exist.
    fn read_blob(&self, id: &BlobId) -> Result<Option<Blob>>;

    /// Delete a blob.
    ///
    /// No-op if the handle doesn't exist.
    fn delete_blob(&self, id: &BlobId) -> Result<()>;

    /// Check if a run document exists.
    fn contains_run(&self, dataset_id: &str, field: &str, key: &str) -> Result<bool> {
        Ok(self.get_run(dataset_id, field, key)?.is_some())
    }
}
