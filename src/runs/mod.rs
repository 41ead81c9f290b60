//! Runs - bookkeeping for methods executed on a dataset
//!
//! A *run* is a method (evaluation, brain method, ...) executed on a view of
//! a dataset under a key. The framework records:
//!
//! - the run's config, library version and timestamp ([`RunInfo`])
//! - the view stages the run was executed on
//! - optional results, persisted as a JSON blob ([`RunResults`])
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │ Runs (one per RunKind)                             │
//! │   register / validate / list / rename / delete     │
//! │   save + load results                              │
//! └──────┬──────────────────┬─────────────────┬────────┘
//!        │                  │                 │
//!  ┌─────▼──────┐   ┌───────▼───────┐  ┌──────▼───────┐
//!  │TypeRegistry│   │ DocumentStore │  │ ResultsCache │
//!  │cls → decode│   │ docs + blobs  │  │ Arc<Results> │
//!  └────────────┘   └───────────────┘  └──────────────┘
//! ```
//!
//! Configs and results are stored with a `cls` tag and resolved through the
//! [`TypeRegistry`] when loaded; there is no dynamic import.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use serde::{Deserialize, Serialize};
//! use trueno_runs::runs::{MethodConfig, Run, RunConfig, RunFilter, RunKind, Runs, TypeRegistry};
//! use trueno_runs::store::MemoryDocumentStore;
//! use trueno_runs::view::Dataset;
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct HardnessConfig {
//!     label_field: String,
//! }
//!
//! struct Hardness(HardnessConfig);
//!
//! impl Run for Hardness {
//!     fn config(&self) -> &dyn RunConfig {
//!         &self.0
//!     }
//! }
//!
//! impl MethodConfig for HardnessConfig {
//!     const CLS: &'static str = "brain.HardnessConfig";
//!
//!     fn method(&self) -> &str {
//!         "hardness"
//!     }
//!
//!     fn build(&self) -> Box<dyn Run> {
//!         Box::new(Hardness(self.clone()))
//!     }
//! }
//!
//! let mut registry = TypeRegistry::new();
//! registry.register_config::<HardnessConfig>();
//!
//! let runs = Runs::builder(RunKind::BRAIN_METHODS)
//!     .build(Arc::new(MemoryDocumentStore::new()), Arc::new(registry))?;
//!
//! let dataset = Dataset::new("quickstart");
//! let run = MethodConfig::build(&HardnessConfig { label_field: "predictions".into() });
//! runs.register_run(run.as_ref(), &dataset.view(), "hardness", false)?;
//!
//! assert_eq!(runs.list_runs(&dataset.view(), &RunFilter::new())?, vec!["hardness"]);
//! # Ok::<(), trueno_runs::Error>(())
//! ```

mod cache;
mod config;
mod info;
mod lifecycle;
mod registry;
mod results;
mod run;

pub use cache::ResultsCache;
pub use config::{AsAny, MethodConfig, RunConfig};
pub use info::RunInfo;
pub use lifecycle::{LoadOptions, RunFilter, Runs, RunsBuilder};
pub use registry::TypeRegistry;
pub use results::{ResultsContext, ResultsPayload, ResultsType, RunResults, SharedResults};
pub use run::{is_valid_key, validate_fields_match, Run, RunKind};
