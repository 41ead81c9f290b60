//! In-memory document store implementation using `DashMap`.
//!
//! This is the default backend - data is lost on process restart.

use super::{Blob, BlobId, DocumentStore, RunDocument};
use crate::Result;
use dashmap::DashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RunSlot {
    dataset_id: String,
    field: String,
    key: String,
}

impl RunSlot {
    fn new(dataset_id: &str, field: &str, key: &str) -> Self {
        Self {
            dataset_id: dataset_id.to_string(),
            field: field.to_string(),
            key: key.to_string(),
        }
    }
}

/// In-memory document store using lock-free concurrent hashmaps.
///
/// Thread-safe; each call locks only the shard it touches.
///
/// # Example
///
/// ```rust
/// use trueno_runs::store::{DocumentStore, MemoryDocumentStore, JSON_CONTENT_TYPE};
///
/// # fn example() -> trueno_runs::Result<()> {
/// let store = MemoryDocumentStore::new();
/// let id = store.put_blob(b"{\"cls\": \"x\"}".to_vec(), JSON_CONTENT_TYPE)?;
/// assert!(store.read_blob(&id)?.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    runs: DashMap<RunSlot, RunDocument>,
    blobs: DashMap<BlobId, Blob>,
}

impl MemoryDocumentStore {
    /// Create a new in-memory document store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of run documents across all datasets and fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Check if the store holds no run documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Get the number of stored blobs.
    #[must_use]
    pub fn blob_count(&self) -> usize {
        self.blobs.len()
    }

    /// Clear all documents and blobs.
    pub fn clear(&self) {
        self.runs.clear();
        self.blobs.clear();
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn list_run_keys(&self, dataset_id: &str, field: &str) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .runs
            .iter()
            .filter(|entry| entry.key().dataset_id == dataset_id && entry.key().field == field)
            .map(|entry| entry.key().key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn get_run(&self, dataset_id: &str, field: &str, key: &str) -> Result<Option<RunDocument>> {
        Ok(self
            .runs
            .get(&RunSlot::new(dataset_id, field, key))
            .map(|v| v.value().clone()))
    }

    fn put_run(&self, field: &str, doc: RunDocument) -> Result<()> {
        let slot = RunSlot::new(&doc.dataset_id, field, &doc.key);
        self.runs.insert(slot, doc);
        Ok(())
    }

    fn remove_run(
        &self,
        dataset_id: &str,
        field: &str,
        key: &str,
    ) -> Result<Option<RunDocument>> {
        Ok(self
            .runs
            .remove(&RunSlot::new(dataset_id, field, key))
            .map(|(_, doc)| doc))
    }

    fn put_blob(&self, data: Vec<u8>, content_type: &str) -> Result<BlobId> {
        let id = BlobId::generate();
        self.blobs.insert(
            id.clone(),
            Blob {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(id)
    }

    fn read_blob(&self, id: &BlobId) -> Result<Option<Blob>> {
        Ok(self.blobs.get(id).map(|v| v.value().clone()))
    }

    fn delete_blob(&self, id: &BlobId) -> Result<()> {
        self.blobs.remove(id);
        Ok(())
    }
}
