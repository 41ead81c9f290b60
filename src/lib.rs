//! # Trueno-Runs: Run Bookkeeping for Datasets
//!
//! **Version**: 0.1.0
//!
//! Trueno-Runs records the methods executed on a dataset (evaluations,
//! brain methods, custom runs): their config, the library version and time
//! they ran with, the view they ran on, and their optional results. It also
//! provides the declarative 3D scene nodes rendered next to those datasets.
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Poka-Yoke safety**: Keys, config types and asset extensions are
//!   validated before anything is written
//! - **Jidoka**: Results written by another library version fail loudly with
//!   a version-skew error instead of decoding garbage
//! - **Muda elimination**: Loaded results are cached and shared by `Arc`
//! - **Genchi Genbutsu**: Run views are rebuilt from the stages that were
//!   actually recorded
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use trueno_runs::runs::{RunFilter, RunKind, Runs, TypeRegistry};
//! use trueno_runs::store::MemoryDocumentStore;
//! use trueno_runs::view::Dataset;
//!
//! let runs = Runs::builder(RunKind::EVALUATIONS)
//!     .version("0.1.0")
//!     .build(Arc::new(MemoryDocumentStore::new()), Arc::new(TypeRegistry::new()))?;
//!
//! let dataset = Dataset::new("quickstart");
//! assert!(runs.list_runs(&dataset.view(), &RunFilter::new())?.is_empty());
//! # Ok::<(), trueno_runs::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod error;
pub mod runs;
pub mod store;
pub mod threed;
pub mod view;

pub use error::{Error, Result};
