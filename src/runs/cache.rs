//! Results Cache - in-process cache of loaded run results
//!
//! ## Consistency Rules
//!
//! The cache is only touched by the lifecycle controller:
//!
//! - **read-through**: a load that misses stores what it read
//! - **write-through**: a save with caching enabled stores what it wrote
//! - **invalidate-on-write**: a save with caching disabled drops the entry,
//!   so the next load reads what was written
//! - **invalidate-on-delete**: deleting a run evicts its entry and detaches
//!   the cached results from the key
//! - **re-key-on-rename**: renaming a run moves its entry and updates the
//!   cached results' key
//!
//! An entry may hold `None`, meaning "this run is known to have no results".
//! The cache is per process; other processes writing to the same store are
//! not observed.

use dashmap::DashMap;

use super::results::SharedResults;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheSlot {
    dataset_id: String,
    field: String,
    key: String,
}

impl CacheSlot {
    fn new(dataset_id: &str, field: &str, key: &str) -> Self {
        Self {
            dataset_id: dataset_id.to_string(),
            field: field.to_string(),
            key: key.to_string(),
        }
    }
}

/// Cache of run results keyed by dataset, runs field and run key.
///
/// Thread-safe. Share one instance between controllers with
/// [`RunsBuilder::results_cache`](super::RunsBuilder::results_cache).
#[derive(Debug, Default)]
pub struct ResultsCache {
    entries: DashMap<CacheSlot, Option<SharedResults>>,
}

impl ResultsCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if an entry exists for the run.
    #[must_use]
    pub fn contains(&self, dataset_id: &str, field: &str, key: &str) -> bool {
        self.entries
            .contains_key(&CacheSlot::new(dataset_id, field, key))
    }

    /// Look up a run's entry.
    ///
    /// The outer `Option` is the cache hit; the inner one is whether the run
    /// has results.
    #[must_use]
    pub fn get(&self, dataset_id: &str, field: &str, key: &str) -> Option<Option<SharedResults>> {
        self.entries
            .get(&CacheSlot::new(dataset_id, field, key))
            .map(|entry| entry.value().clone())
    }

    /// Store a run's entry, replacing any previous one.
    pub fn insert(&self, dataset_id: &str, field: &str, key: &str, results: Option<SharedResults>) {
        self.entries
            .insert(CacheSlot::new(dataset_id, field, key), results);
    }

    /// Remove a run's entry and detach the cached results from the key.
    pub fn evict(&self, dataset_id: &str, field: &str, key: &str) -> Option<Option<SharedResults>> {
        let (_, results) = self
            .entries
            .remove(&CacheSlot::new(dataset_id, field, key))?;
        if let Some(results) = &results {
            results.set_key(None);
        }
        Some(results)
    }

    /// Drop a run's entry, leaving the cached results attached to their key.
    pub fn invalidate(&self, dataset_id: &str, field: &str, key: &str) {
        self.entries.remove(&CacheSlot::new(dataset_id, field, key));
    }

    /// Move a run's entry to a new key and update the cached results' key.
    ///
    /// No-op if the run has no entry.
    pub fn rekey(&self, dataset_id: &str, field: &str, key: &str, new_key: &str) {
        let Some((_, results)) = self
            .entries
            .remove(&CacheSlot::new(dataset_id, field, key))
        else {
            return;
        };

        if let Some(results) = &results {
            results.set_key(Some(new_key.to_string()));
        }
        self.entries
            .insert(CacheSlot::new(dataset_id, field, new_key), results);
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}
