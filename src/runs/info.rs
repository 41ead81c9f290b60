//! Run Info - metadata describing one executed run

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::config::RunConfig;
use super::registry::TypeRegistry;
use crate::store::RunDocument;
use crate::Result;

/// Information about a run on a dataset.
///
/// Created by `register_run` and kept until the run is deleted.
#[derive(Debug, Clone)]
pub struct RunInfo {
    key: String,
    version: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    config: Arc<dyn RunConfig>,
}

impl RunInfo {
    /// Create run info without version or timestamp.
    #[must_use]
    pub fn new(key: impl Into<String>, config: Arc<dyn RunConfig>) -> Self {
        Self {
            key: key.into(),
            version: None,
            timestamp: None,
            config,
        }
    }

    /// Set the library version the run was executed with.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the UTC time of the run.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Get the run key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get the library version, if recorded.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Get the run timestamp, if recorded.
    #[must_use]
    pub const fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    /// Get the run config.
    #[must_use]
    pub const fn config(&self) -> &Arc<dyn RunConfig> {
        &self.config
    }

    /// Rebuild run info from its persisted document.
    ///
    /// # Errors
    ///
    /// Returns error if the stored config cannot be resolved or decoded.
    pub fn from_document(doc: &RunDocument, registry: &TypeRegistry) -> Result<Self> {
        let config = registry.config_from_dict(doc.config.clone())?;
        Ok(Self {
            key: doc.key.clone(),
            version: doc.version.clone(),
            timestamp: doc.timestamp,
            config: Arc::from(config),
        })
    }

    /// Build the persisted document for this run.
    ///
    /// # Errors
    ///
    /// Returns error if the config cannot be serialized.
    pub fn to_document(
        &self,
        dataset_id: impl Into<String>,
        view_stages: Vec<String>,
    ) -> Result<RunDocument> {
        Ok(RunDocument {
            dataset_id: dataset_id.into(),
            key: self.key.clone(),
            version: self.version.clone(),
            timestamp: self.timestamp,
            config: self.config.serialize()?,
            view_stages,
            results: None,
        })
    }
}
