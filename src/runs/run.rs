//! Run - per-method hooks the lifecycle controller calls into

use serde_json::Value;

use super::config::RunConfig;
use super::info::RunInfo;
use crate::view::DatasetView;
use crate::{Error, Result};

/// Where a family of runs lives on the dataset document, and how log and
/// error messages refer to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunKind {
    runs_field: &'static str,
    run_str: &'static str,
}

impl RunKind {
    /// Generic runs.
    pub const RUNS: Self = Self::new("runs", "run");

    /// Evaluations of predictions against ground truth.
    pub const EVALUATIONS: Self = Self::new("evaluations", "evaluation");

    /// Brain methods (similarity, uniqueness, visualization...).
    pub const BRAIN_METHODS: Self = Self::new("brain_methods", "brain method");

    /// Define a run kind.
    #[must_use]
    pub const fn new(runs_field: &'static str, run_str: &'static str) -> Self {
        Self {
            runs_field,
            run_str,
        }
    }

    /// Dataset document field holding these runs.
    #[must_use]
    pub const fn runs_field(&self) -> &'static str {
        self.runs_field
    }

    /// Label used in messages ("evaluation", "brain method", ...).
    #[must_use]
    pub const fn run_str(&self) -> &'static str {
        self.run_str
    }
}

/// A method that can be run on a dataset.
///
/// The lifecycle controller ([`Runs`](super::Runs)) persists and validates
/// runs; implementations only describe what is specific to the method.
/// Every hook has a no-op default.
pub trait Run: Send + Sync {
    /// The config this run was built from.
    fn config(&self) -> &dyn RunConfig;

    /// Ensure everything needed to execute this run is available.
    ///
    /// # Errors
    ///
    /// Returns error if a requirement is missing.
    fn ensure_requirements(&self) -> Result<()> {
        Ok(())
    }

    /// Ensure everything needed to use existing results of this run is available.
    ///
    /// # Errors
    ///
    /// Returns error if a requirement is missing.
    fn ensure_usage_requirements(&self) -> Result<()> {
        Ok(())
    }

    /// Dataset fields involved in the run with the given key.
    ///
    /// # Errors
    ///
    /// Returns error if the fields cannot be determined.
    fn get_fields(&self, _samples: &DatasetView, _key: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    /// Rename any method-owned state from `key` to `new_key`.
    ///
    /// Failures are logged by the controller and do not stop the rename of
    /// the run record.
    ///
    /// # Errors
    ///
    /// Returns error if method-owned state could not be renamed.
    fn rename(&self, _samples: &DatasetView, _key: &str, _new_key: &str) -> Result<()> {
        Ok(())
    }

    /// Remove method-owned state of the run with the given key.
    ///
    /// Failures are logged by the controller and do not stop the deletion of
    /// the run record.
    ///
    /// # Errors
    ///
    /// Returns error if method-owned state could not be removed.
    fn cleanup(&self, _samples: &DatasetView, _key: &str) -> Result<()> {
        Ok(())
    }

    /// Extra checks before overwriting an existing run of the same config type.
    ///
    /// # Errors
    ///
    /// Returns error if the existing run must not be overwritten by this one.
    fn validate_existing(&self, _kind: RunKind, _key: &str, _existing: &RunInfo) -> Result<()> {
        Ok(())
    }
}

/// Whether `key` is a valid bare identifier.
///
/// Starts with an ASCII letter or underscore, followed by ASCII letters,
/// digits or underscores.
#[must_use]
pub fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Check that `field` has the same value on the new and the existing config.
///
/// Intended for [`Run::validate_existing`] implementations.
///
/// # Errors
///
/// Returns [`Error::FieldMismatch`] if the values differ.
pub fn validate_fields_match(
    kind: RunKind,
    key: &str,
    field: &str,
    new: &dyn RunConfig,
    existing: &dyn RunConfig,
) -> Result<()> {
    let new_value = new.field(field).unwrap_or(Value::Null);
    let existing_value = existing.field(field).unwrap_or(Value::Null);
    if new_value == existing_value {
        return Ok(());
    }

    Err(Error::FieldMismatch {
        run_str: kind.run_str().to_string(),
        key: key.to_string(),
        field: field.to_string(),
        existing: display_value(&existing_value),
        new: display_value(&new_value),
    })
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
