//! Error types for Trueno-Runs
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Trueno-Runs error types
#[derive(Error, Debug)]
pub enum Error {
    /// Run key is not a valid identifier
    #[error("Invalid {run_str} key '{key}'. Keys must be valid variable names")]
    InvalidKey {
        /// Label of the run kind ("run", "evaluation", ...)
        run_str: String,
        /// Offending key
        key: String,
    },

    /// A run with the key already exists and overwriting is not permitted
    #[error("A {run_str} with key '{key}' already exists")]
    RunExists {
        /// Label of the run kind
        run_str: String,
        /// Conflicting key
        key: String,
    },

    /// Existing run was produced by a different config type
    #[error("Cannot overwrite existing {run_str} '{key}' of type {existing} with one of type {new}; please choose a different key or delete the existing one first")]
    TypeMismatch {
        /// Label of the run kind
        run_str: String,
        /// Run key
        key: String,
        /// Config tag of the stored run
        existing: String,
        /// Config tag of the incoming run
        new: String,
    },

    /// Existing run differs in a field that must stay fixed across overwrites
    #[error("Cannot overwrite existing {run_str} '{key}' where {field}={existing} with one where {field}={new}. Please choose a different key or delete the existing one first")]
    FieldMismatch {
        /// Label of the run kind
        run_str: String,
        /// Run key
        key: String,
        /// Config field name
        field: String,
        /// Stored value
        existing: String,
        /// Incoming value
        new: String,
    },

    /// Results are already stored and overwriting is not permitted
    #[error("A {run_str} with key '{key}' already has results")]
    ResultsExist {
        /// Label of the run kind
        run_str: String,
        /// Run key
        key: String,
    },

    /// No run is stored under the key
    #[error("Dataset has no {run_str} key '{key}'")]
    NotFound {
        /// Label of the run kind
        run_str: String,
        /// Missing key
        key: String,
    },

    /// Type tag is not present in the registry
    #[error("Unknown {kind} type '{tag}'. Is it registered, and does the library version match?")]
    UnknownType {
        /// What was being resolved ("config", "results")
        kind: &'static str,
        /// Unresolved tag
        tag: String,
    },

    /// Persisted run was written by a different library version and no longer decodes
    #[error("Failed to load {what} for {run_str} with key '{key}'. The {run_str} used version {stored} but you are currently using version {current}. We recommend that you re-run the method with your current version")]
    VersionSkew {
        /// "info" or "results"
        what: &'static str,
        /// Label of the run kind
        run_str: String,
        /// Run key
        key: String,
        /// Version recorded on the run ("????" when absent)
        stored: String,
        /// Running library version
        current: String,
        /// Underlying decode failure
        #[source]
        source: Box<Error>,
    },

    /// Results are no longer attached to a run key (the run was deleted)
    #[error("Results are not attached to a run key; the run may have been deleted")]
    Detached,

    /// Invalid constructor or method argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Document store failure
    #[error("Storage error: {0}")]
    StorageError(String),

    /// JSON encode/decode failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error was caused by a library version mismatch.
    ///
    /// Callers can use this to advise re-running the method instead of
    /// reporting a bug.
    #[must_use]
    pub const fn is_version_skew(&self) -> bool {
        matches!(self, Self::VersionSkew { .. })
    }
}
