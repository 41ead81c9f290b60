//! Run Tracking Demo
//!
//! Walks through the lifecycle of an evaluation run on a dataset:
//! register, save results, load them back, rename, and delete.
//!
//! Run with: RUST_LOG=debug cargo run --example run_tracking

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use trueno_runs::runs::{
    validate_fields_match, LoadOptions, MethodConfig, ResultsType, Run, RunConfig, RunFilter,
    RunInfo, RunKind, RunResults, Runs, TypeRegistry,
};
use trueno_runs::store::MemoryDocumentStore;
use trueno_runs::view::{Dataset, DatasetView};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ClassificationConfig {
    pred_field: String,
    gt_field: String,
}

struct Classification(ClassificationConfig);

impl Run for Classification {
    fn config(&self) -> &dyn RunConfig {
        &self.0
    }

    fn get_fields(&self, _samples: &DatasetView, _key: &str) -> trueno_runs::Result<Vec<String>> {
        Ok(vec![self.0.pred_field.clone(), self.0.gt_field.clone()])
    }

    fn validate_existing(
        &self,
        kind: RunKind,
        key: &str,
        existing: &RunInfo,
    ) -> trueno_runs::Result<()> {
        validate_fields_match(kind, key, "gt_field", &self.0, existing.config().as_ref())
    }
}

impl MethodConfig for ClassificationConfig {
    const CLS: &'static str = "evaluation.ClassificationConfig";

    fn method(&self) -> &str {
        "simple"
    }

    fn build(&self) -> Box<dyn Run> {
        Box::new(Classification(self.clone()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ClassificationResults {
    accuracy: f64,
    per_class: Vec<(String, f64)>,
}

impl ResultsType for ClassificationResults {
    const CLS: &'static str = "evaluation.ClassificationResults";
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Trueno-Runs Run Tracking ===\n");

    let mut registry = TypeRegistry::new();
    registry
        .register_config::<ClassificationConfig>()
        .register_results::<ClassificationResults>();

    let runs = Runs::builder(RunKind::EVALUATIONS)
        .build(Arc::new(MemoryDocumentStore::new()), Arc::new(registry))?;

    let dataset = Dataset::new("cifar100");
    let test_view = dataset.view().select_fields(&["predictions", "ground_truth"]);

    // -------------------------------------------------------------------------
    // 1. List evaluations on the dataset
    // -------------------------------------------------------------------------
    println!("1. Evaluations: {:?}\n", runs.list_runs(&test_view, &RunFilter::new())?);

    // -------------------------------------------------------------------------
    // 2. Register an evaluation on the test view
    // -------------------------------------------------------------------------
    println!("2. Registering evaluation 'eval'...");

    let config = ClassificationConfig {
        pred_field: "predictions".to_string(),
        gt_field: "ground_truth".to_string(),
    };
    let run = MethodConfig::build(&config);
    runs.register_run(run.as_ref(), &test_view, "eval", false)?;

    let info = runs.get_run_info(&test_view, "eval")?;
    println!("   Key: {}", info.key());
    println!("   Version: {}", info.version().unwrap_or("????"));
    if let Some(timestamp) = info.timestamp() {
        println!("   Timestamp: {timestamp}");
    }
    println!("   Config: {}\n", RunConfig::serialize(info.config().as_ref())?);

    // -------------------------------------------------------------------------
    // 3. Save results
    // -------------------------------------------------------------------------
    println!("3. Saving results...");

    let results = RunResults::new(
        test_view.clone(),
        Arc::clone(info.config()),
        Some("eval".to_string()),
        Box::new(ClassificationResults {
            accuracy: 0.87,
            per_class: vec![("cat".to_string(), 0.91), ("dog".to_string(), 0.83)],
        }),
        None,
    )?;
    runs.save_run_results(&test_view, "eval", Some(Arc::new(results)), false, true)?;
    println!("   Cached: {}\n", runs.has_cached_run_results(&test_view, "eval"));

    // -------------------------------------------------------------------------
    // 4. Load results from the store, bound to the run's view
    // -------------------------------------------------------------------------
    println!("4. Loading results from the store...");

    let loaded = runs
        .load_run_results(&dataset.view(), "eval", &LoadOptions::new().cache(false))?
        .ok_or_else(|| anyhow::anyhow!("evaluation has no results"))?;
    if let Some(payload) = loaded.payload_as::<ClassificationResults>() {
        println!("   Accuracy: {:.2}", payload.accuracy);
        for (class, accuracy) in &payload.per_class {
            println!("   {class}: {accuracy:.2}");
        }
    }
    println!("   View fields: {:?}\n", loaded.samples().selected_fields());

    // -------------------------------------------------------------------------
    // 5. Rename, then delete
    // -------------------------------------------------------------------------
    println!("5. Renaming 'eval' to 'eval_v1'...");
    runs.update_run_key(&test_view, "eval", "eval_v1")?;
    println!("   Evaluations: {:?}", runs.list_runs(&test_view, &RunFilter::new())?);

    println!("\n6. Deleting 'eval_v1'...");
    runs.delete_run(&test_view, "eval_v1")?;
    println!("   Evaluations: {:?}", runs.list_runs(&test_view, &RunFilter::new())?);

    println!("\n=== Done ===");
    Ok(())
}
