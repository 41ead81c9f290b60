//! Runs - lifecycle controller for one kind of run on a dataset
//!
//! ## Lifecycle
//!
//! ```text
//! unregistered ──register_run──> registered ──save_run_results──> results present
//!                                    │  ^                              │
//!                                    │  └──save_run_results(None)──────┘
//!                                    └──────────delete_run──────────> deleted
//! ```
//!
//! Check-then-act sequences (exists-then-save, exists-then-delete) are not
//! atomic. Concurrent writers on the same key can interleave; the store's
//! per-document writes are the only guarantee.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::cache::ResultsCache;
use super::config::RunConfig;
use super::info::RunInfo;
use super::registry::TypeRegistry;
use super::results::{RunResults, SharedResults};
use super::run::{is_valid_key, Run, RunKind};
use crate::store::{BlobId, DocumentStore, RunDocument, JSON_CONTENT_TYPE};
use crate::view::{is_nested_under, root_fields, Dataset, DatasetView};
use crate::{Error, Result};

/// Filter for [`Runs::list_runs`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunFilter {
    run_type: Option<String>,
    fields: Vec<(String, Value)>,
}

impl RunFilter {
    /// Match every run.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only runs of this type, or declaring it as an ancestor.
    #[must_use]
    pub fn run_type(mut self, run_type: impl Into<String>) -> Self {
        self.run_type = Some(run_type.into());
        self
    }

    /// Only runs whose config attribute `name` equals `value`.
    ///
    /// A missing attribute compares equal to `null`.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Check if the filter matches everything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.run_type.is_none() && self.fields.is_empty()
    }

    fn matches(&self, config: &dyn RunConfig) -> bool {
        if let Some(run_type) = &self.run_type {
            if !config.is_run_type(run_type) {
                return false;
            }
        }

        self.fields
            .iter()
            .all(|(name, value)| config.field(name).unwrap_or(Value::Null) == *value)
    }
}

/// Options for [`Runs::load_run_results`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    cache: bool,
    load_view: bool,
    credentials: Map<String, Value>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            cache: true,
            load_view: true,
            credentials: Map::new(),
        }
    }
}

impl LoadOptions {
    /// Cache enabled, run view loaded, no credentials.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether to read from and store into the results cache.
    #[must_use]
    pub const fn cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Whether results are bound to the run's view (`true`) or the whole dataset.
    #[must_use]
    pub const fn load_view(mut self, load_view: bool) -> Self {
        self.load_view = load_view;
        self
    }

    /// Pass a credential to the config's `load_credentials` hook.
    #[must_use]
    pub fn credential(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.credentials.insert(name.into(), value.into());
        self
    }
}

/// Builder for [`Runs`].
#[derive(Debug)]
pub struct RunsBuilder {
    kind: RunKind,
    version: String,
    cache: Option<Arc<ResultsCache>>,
}

impl RunsBuilder {
    /// Create a builder for a run kind, versioned with this crate's version.
    #[must_use]
    pub fn new(kind: RunKind) -> Self {
        Self {
            kind,
            version: env!("CARGO_PKG_VERSION").to_string(),
            cache: None,
        }
    }

    /// Library version recorded on new runs and compared against stored ones.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Share a results cache with other controllers.
    #[must_use]
    pub fn results_cache(mut self, cache: Arc<ResultsCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Build the controller.
    ///
    /// # Errors
    ///
    /// Returns error if the version is not a semver string.
    pub fn build(
        self,
        store: Arc<dyn DocumentStore>,
        registry: Arc<TypeRegistry>,
    ) -> Result<Runs> {
        semver::Version::parse(&self.version).map_err(|e| {
            Error::InvalidArgument(format!("version '{}' is not semver: {e}", self.version))
        })?;

        Ok(Runs {
            kind: self.kind,
            version: self.version,
            store,
            registry,
            cache: self.cache.unwrap_or_default(),
        })
    }
}

/// Lifecycle controller for one [`RunKind`].
///
/// Records run metadata in a [`DocumentStore`], persists results blobs, and
/// keeps loaded results in a [`ResultsCache`].
pub struct Runs {
    kind: RunKind,
    version: String,
    store: Arc<dyn DocumentStore>,
    registry: Arc<TypeRegistry>,
    cache: Arc<ResultsCache>,
}

impl std::fmt::Debug for Runs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runs")
            .field("kind", &self.kind)
            .field("version", &self.version)
            .field("registry", &self.registry)
            .field("cache", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl Runs {
    /// Create a builder.
    #[must_use]
    pub fn builder(kind: RunKind) -> RunsBuilder {
        RunsBuilder::new(kind)
    }

    /// The run kind this controller manages.
    #[must_use]
    pub const fn kind(&self) -> RunKind {
        self.kind
    }

    /// Library version recorded on new runs.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The type registry used to decode stored configs and results.
    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// The results cache.
    #[must_use]
    pub fn cache(&self) -> &ResultsCache {
        &self.cache
    }

    fn field(&self) -> &'static str {
        self.kind.runs_field()
    }

    fn run_str(&self) -> String {
        self.kind.run_str().to_string()
    }

    /// Register a run of `run`'s method under `key` on the dataset.
    ///
    /// Validates the key and any existing run, then records the run info
    /// with the current version and time. No results are written.
    ///
    /// # Errors
    ///
    /// Returns any error from [`validate_run`](Self::validate_run) or the store.
    pub fn register_run(
        &self,
        run: &dyn Run,
        samples: &DatasetView,
        key: &str,
        overwrite: bool,
    ) -> Result<()> {
        self.validate_run(run, samples, key, overwrite)?;

        let config: Arc<dyn RunConfig> = Arc::from(run.config().clone_config());
        let info = RunInfo::new(key, config)
            .with_version(self.version.clone())
            .with_timestamp(Utc::now());
        self.save_run_info(samples, &info, true)?;

        info!("Registered {} '{}'", self.kind.run_str(), key);
        Ok(())
    }

    /// Check that the dataset can accept `run` under `key`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidKey`] if `key` is not an identifier
    /// - [`Error::RunExists`] if the key exists and `overwrite` is false
    /// - [`Error::TypeMismatch`] if the existing run has another config type
    /// - any error from the run's [`validate_existing`](Run::validate_existing) hook
    pub fn validate_run(
        &self,
        run: &dyn Run,
        samples: &DatasetView,
        key: &str,
        overwrite: bool,
    ) -> Result<()> {
        if !is_valid_key(key) {
            return Err(Error::InvalidKey {
                run_str: self.run_str(),
                key: key.to_string(),
            });
        }

        let dataset = samples.root_dataset();
        if !self.store.contains_run(dataset.id(), self.field(), key)? {
            return Ok(());
        }

        if !overwrite {
            return Err(Error::RunExists {
                run_str: self.run_str(),
                key: key.to_string(),
            });
        }

        let existing = match self.get_run_info(samples, key) {
            Ok(existing) => existing,
            Err(e) => {
                // Unloadable info can always be overwritten
                debug!("Existing {} '{}' is unloadable: {}", self.kind.run_str(), key, e);
                return Ok(());
            }
        };

        if run.config().cls() != existing.config().cls() {
            return Err(Error::TypeMismatch {
                run_str: self.run_str(),
                key: key.to_string(),
                existing: existing.config().cls().to_string(),
                new: run.config().cls().to_string(),
            });
        }

        run.validate_existing(self.kind, key, &existing)
    }

    /// List run keys on the dataset, sorted.
    ///
    /// With a non-empty filter, each run's info is loaded; runs whose info
    /// fails to load are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot list keys.
    pub fn list_runs(&self, samples: &DatasetView, filter: &RunFilter) -> Result<Vec<String>> {
        let dataset = samples.root_dataset();
        let mut keys = self.store.list_run_keys(dataset.id(), self.field())?;
        keys.sort();

        if filter.is_empty() {
            return Ok(keys);
        }

        let mut matched = Vec::with_capacity(keys.len());
        for key in keys {
            let info = match self.get_run_info(samples, &key) {
                Ok(info) => info,
                Err(e) => {
                    warn!(
                        "Failed to load info for {} with key '{}': {}",
                        self.kind.run_str(),
                        key,
                        e
                    );
                    continue;
                }
            };

            if filter.matches(info.config().as_ref()) {
                matched.push(key);
            }
        }

        Ok(matched)
    }

    /// Check if a run exists under `key`.
    ///
    /// # Errors
    ///
    /// Returns error if the store lookup fails.
    pub fn has_run(&self, samples: &DatasetView, key: &str) -> Result<bool> {
        self.store
            .contains_run(samples.root_dataset().id(), self.field(), key)
    }

    /// Replace the key of a run.
    ///
    /// The run's `rename` hook failing is logged and does not stop the rename.
    ///
    /// # Errors
    ///
    /// - [`Error::RunExists`] if `new_key` is taken; nothing is changed
    /// - [`Error::InvalidKey`] if `new_key` is not an identifier
    /// - [`Error::NotFound`] if there is no run under `key`
    pub fn update_run_key(&self, samples: &DatasetView, key: &str, new_key: &str) -> Result<()> {
        let dataset = samples.root_dataset();

        if self.store.contains_run(dataset.id(), self.field(), new_key)? {
            return Err(Error::RunExists {
                run_str: self.run_str(),
                key: new_key.to_string(),
            });
        }

        if !is_valid_key(new_key) {
            return Err(Error::InvalidKey {
                run_str: self.run_str(),
                key: new_key.to_string(),
            });
        }

        let mut doc = self.get_run_doc(dataset, key)?;

        if let Err(e) = self
            .build_run(samples, key)
            .and_then(|run| run.rename(samples, key, new_key))
        {
            warn!(
                "Failed to run rename() for the {} with key '{}': {}",
                self.kind.run_str(),
                key,
                e
            );
        }

        self.store.remove_run(dataset.id(), self.field(), key)?;
        doc.key = new_key.to_string();
        self.store.put_run(self.field(), doc)?;

        self.cache.rekey(dataset.id(), self.field(), key, new_key);

        info!("Renamed {} '{}' to '{}'", self.kind.run_str(), key, new_key);
        Ok(())
    }

    /// Get the info of the run under `key`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if there is no run under `key`
    /// - [`Error::VersionSkew`] if the info fails to decode and was written
    ///   by another version
    /// - the decode error otherwise
    pub fn get_run_info(&self, samples: &DatasetView, key: &str) -> Result<RunInfo> {
        let doc = self.get_run_doc(samples.root_dataset(), key)?;
        RunInfo::from_document(&doc, &self.registry)
            .map_err(|e| self.version_skew("info", key, doc.version.as_deref(), e))
    }

    /// Record run info on the dataset, with the stages of `samples`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RunExists`] if the key exists and `overwrite` is
    /// false, or any store error. With `overwrite`, the existing run is
    /// deleted first.
    pub fn save_run_info(
        &self,
        samples: &DatasetView,
        info: &RunInfo,
        overwrite: bool,
    ) -> Result<()> {
        let dataset = samples.root_dataset();
        let key = info.key();

        if self.store.contains_run(dataset.id(), self.field(), key)? {
            if !overwrite {
                return Err(Error::RunExists {
                    run_str: self.run_str(),
                    key: key.to_string(),
                });
            }
            self.delete_run(samples, key)?;
        }

        let view_stages = samples
            .serialize()?
            .iter()
            .map(serde_json::to_string)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let doc = info.to_document(dataset.id(), view_stages)?;
        self.store.put_run(self.field(), doc)?;
        debug!("Saved info for {} '{}'", self.kind.run_str(), key);
        Ok(())
    }

    /// Replace the stored config of a run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no run under `key`, or any
    /// serialization or store error.
    pub fn update_run_config(
        &self,
        samples: &DatasetView,
        key: &str,
        config: &dyn RunConfig,
    ) -> Result<()> {
        let mut doc = self.get_run_doc(samples.root_dataset(), key)?;
        doc.config = config.serialize()?;
        self.store.put_run(self.field(), doc)
    }

    /// Save the results of a run, or clear them with `None`.
    ///
    /// Existing results are replaced when `overwrite` is set; they stay in
    /// place if the new results fail to encode. With `cache`, the results (or
    /// the absence of them) are also cached; without it, any cached entry for
    /// the run is dropped.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if there is no run under `key`
    /// - [`Error::ResultsExist`] if results exist and `overwrite` is false
    /// - any serialization or store error
    pub fn save_run_results(
        &self,
        samples: &DatasetView,
        key: &str,
        results: Option<SharedResults>,
        overwrite: bool,
        cache: bool,
    ) -> Result<()> {
        let dataset = samples.root_dataset();
        let mut doc = self.get_run_doc(dataset, key)?;

        if doc.results.is_some() && !overwrite {
            return Err(Error::ResultsExist {
                run_str: self.run_str(),
                key: key.to_string(),
            });
        }

        // A failed encode must leave the stored results in place
        let bytes = match &results {
            Some(results) => Some(serde_json::to_vec(&results.serialize()?)?),
            None => None,
        };

        if let Some(existing) = doc.results.take() {
            self.store.delete_blob(&existing)?;
        }
        if let Some(bytes) = bytes {
            doc.results = Some(self.store.put_blob(bytes, JSON_CONTENT_TYPE)?);
        }

        if cache {
            self.cache.insert(dataset.id(), self.field(), key, results);
        } else {
            self.cache.invalidate(dataset.id(), self.field(), key);
        }

        self.store.put_run(self.field(), doc)?;
        debug!("Saved results for {} '{}'", self.kind.run_str(), key);
        Ok(())
    }

    /// Load the results of a run.
    ///
    /// Returns `Ok(None)` if the run has no results.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if there is no run under `key`
    /// - [`Error::VersionSkew`] if the results fail to decode and were
    ///   written by another version
    /// - any other decode, credential or store error
    pub fn load_run_results(
        &self,
        samples: &DatasetView,
        key: &str,
        options: &LoadOptions,
    ) -> Result<Option<SharedResults>> {
        let dataset = samples.root_dataset();

        if options.cache {
            if let Some(hit) = self.cache.get(dataset.id(), self.field(), key) {
                debug!("Results cache hit for {} '{}'", self.kind.run_str(), key);
                return Ok(hit);
            }
        }

        let doc = self.get_run_doc(dataset, key)?;
        let results = match &doc.results {
            Some(blob_id) => self.read_run_results(samples, key, &doc, blob_id, options)?,
            None => None,
        };

        if options.cache {
            self.cache
                .insert(dataset.id(), self.field(), key, results.clone());
        }

        Ok(results)
    }

    fn read_run_results(
        &self,
        samples: &DatasetView,
        key: &str,
        doc: &RunDocument,
        blob_id: &BlobId,
        options: &LoadOptions,
    ) -> Result<Option<SharedResults>> {
        let dataset = samples.root_dataset();
        let info = self.get_run_info(samples, key)?;
        let mut config = info.config().clone_config();
        config.load_credentials(&options.credentials)?;
        let config: Arc<dyn RunConfig> = Arc::from(config);

        let run_samples = if options.load_view {
            self.load_run_view(samples, key, false)?
        } else {
            dataset.view()
        };

        let blob = self.store.read_blob(blob_id)?.ok_or_else(|| {
            Error::StorageError(format!(
                "results blob {blob_id} of {} '{key}' is missing",
                self.kind.run_str()
            ))
        })?;
        let d: Value = serde_json::from_slice(&blob.data)?;

        let results = RunResults::from_dict(d, run_samples, config, key, &self.registry)
            .map_err(|e| self.version_skew("results", key, doc.version.as_deref(), e))?
            .map(Arc::new);

        debug!("Loaded results for {} '{}' from store", self.kind.run_str(), key);
        Ok(results)
    }

    /// Check if results of a run are cached.
    #[must_use]
    pub fn has_cached_run_results(&self, samples: &DatasetView, key: &str) -> bool {
        self.cache
            .contains(samples.root_dataset().id(), self.field(), key)
    }

    /// Rebuild the view a run was executed on.
    ///
    /// With `select_fields`, the view is narrowed to the root fields the run
    /// touched, and fields of other runs nested under those roots are
    /// excluded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no run under `key`, or any
    /// decode or hook error.
    pub fn load_run_view(
        &self,
        samples: &DatasetView,
        key: &str,
        select_fields: bool,
    ) -> Result<DatasetView> {
        let dataset = samples.root_dataset();
        let doc = self.get_run_doc(dataset, key)?;

        let stage_dicts = doc
            .view_stages
            .iter()
            .map(|s| serde_json::from_str(s))
            .collect::<std::result::Result<Vec<Value>, _>>()?;
        let view = DatasetView::build(dataset, stage_dicts)?;

        if !select_fields {
            return Ok(view);
        }

        let fields = self.get_run_fields(samples, key)?;
        let roots = root_fields(&fields);
        let view = view.select_fields(&roots);

        let mut exclude = Vec::new();
        for other in self.list_runs(samples, &RunFilter::new())? {
            if other == key {
                continue;
            }

            exclude.extend(
                self.get_run_fields(samples, &other)?
                    .into_iter()
                    .filter(|field| is_nested_under(field, &roots)),
            );
        }

        if exclude.is_empty() {
            Ok(view)
        } else {
            Ok(view.exclude_fields(&exclude))
        }
    }

    /// Delete a run, its results and its cache entry.
    ///
    /// The run's `cleanup` hook failing is logged and does not stop the
    /// deletion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no run under `key`, or any
    /// store error.
    pub fn delete_run(&self, samples: &DatasetView, key: &str) -> Result<()> {
        let dataset = samples.root_dataset();
        let doc = self.get_run_doc(dataset, key)?;

        if let Err(e) = self
            .build_run(samples, key)
            .and_then(|run| run.cleanup(samples, key))
        {
            warn!(
                "Failed to run cleanup() for the {} with key '{}': {}",
                self.kind.run_str(),
                key,
                e
            );
        }

        self.store.remove_run(dataset.id(), self.field(), key)?;
        self.cache.evict(dataset.id(), self.field(), key);

        if let Some(blob_id) = &doc.results {
            self.store.delete_blob(blob_id)?;
        }

        info!("Deleted {} '{}'", self.kind.run_str(), key);
        Ok(())
    }

    /// Delete every run of this kind on the dataset.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`delete_run`](Self::delete_run).
    pub fn delete_runs(&self, samples: &DatasetView) -> Result<()> {
        for key in self.list_runs(samples, &RunFilter::new())? {
            self.delete_run(samples, &key)?;
        }
        Ok(())
    }

    fn get_run_doc(&self, dataset: &Dataset, key: &str) -> Result<RunDocument> {
        self.store
            .get_run(dataset.id(), self.field(), key)?
            .ok_or_else(|| Error::NotFound {
                run_str: self.run_str(),
                key: key.to_string(),
            })
    }

    fn build_run(&self, samples: &DatasetView, key: &str) -> Result<Box<dyn Run>> {
        Ok(self.get_run_info(samples, key)?.config().build())
    }

    fn get_run_fields(&self, samples: &DatasetView, key: &str) -> Result<Vec<String>> {
        self.build_run(samples, key)?.get_fields(samples, key)
    }

    fn version_skew(
        &self,
        what: &'static str,
        key: &str,
        stored: Option<&str>,
        source: Error,
    ) -> Error {
        if stored == Some(self.version.as_str()) {
            return source;
        }

        Error::VersionSkew {
            what,
            run_str: self.run_str(),
            key: key.to_string(),
            stored: stored.unwrap_or("????").to_string(),
            current: self.version.clone(),
            source: Box::new(source),
        }
    }
}
