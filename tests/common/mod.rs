//! Shared fixtures: a handful of run methods and results types

#![allow(dead_code)]

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use trueno_runs::runs::{
    validate_fields_match, MethodConfig, ResultsType, Run, RunConfig, RunInfo, RunKind, Runs,
    TypeRegistry,
};
use trueno_runs::store::MemoryDocumentStore;
use trueno_runs::view::DatasetView;
use trueno_runs::{Error, Result};

// =============================================================================
// Classification evaluation
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationConfig {
    pub pred_field: String,
    pub gt_field: String,
}

impl ClassificationConfig {
    pub fn new(pred_field: &str) -> Self {
        Self {
            pred_field: pred_field.to_string(),
            gt_field: "ground_truth".to_string(),
        }
    }
}

pub struct Classification(ClassificationConfig);

impl Run for Classification {
    fn config(&self) -> &dyn RunConfig {
        &self.0
    }

    fn get_fields(&self, _samples: &DatasetView, key: &str) -> Result<Vec<String>> {
        Ok(vec![
            self.0.pred_field.clone(),
            self.0.gt_field.clone(),
            format!("{}.{key}", self.0.pred_field),
        ])
    }

    fn validate_existing(&self, kind: RunKind, key: &str, existing: &RunInfo) -> Result<()> {
        let existing = existing.config().as_ref();
        validate_fields_match(kind, key, "pred_field", &self.0, existing)?;
        validate_fields_match(kind, key, "gt_field", &self.0, existing)
    }
}

impl MethodConfig for ClassificationConfig {
    const CLS: &'static str = "evaluation.ClassificationConfig";
    const RUN_LINEAGE: &'static [&'static str] = &["evaluation.Evaluation"];

    fn method(&self) -> &str {
        "simple"
    }

    fn build(&self) -> Box<dyn Run> {
        Box::new(Classification(self.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResults {
    pub accuracy: f64,
    pub classes: Vec<String>,
}

impl ResultsType for ClassificationResults {
    const CLS: &'static str = "evaluation.ClassificationResults";
}

// =============================================================================
// Detection evaluation
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    pub pred_field: String,
    pub iou: f64,
}

pub struct Detection(DetectionConfig);

impl Run for Detection {
    fn config(&self) -> &dyn RunConfig {
        &self.0
    }
}

impl MethodConfig for DetectionConfig {
    const CLS: &'static str = "evaluation.DetectionConfig";
    const RUN_LINEAGE: &'static [&'static str] = &["evaluation.Evaluation"];

    fn method(&self) -> &str {
        "coco"
    }

    fn build(&self) -> Box<dyn Run> {
        Box::new(Detection(self.clone()))
    }
}

// =============================================================================
// Method whose rename and cleanup hooks always fail
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrittleConfig {}

pub struct Brittle(BrittleConfig);

impl Run for Brittle {
    fn config(&self) -> &dyn RunConfig {
        &self.0
    }

    fn rename(&self, _samples: &DatasetView, _key: &str, _new_key: &str) -> Result<()> {
        Err(Error::Other("index is read-only".to_string()))
    }

    fn cleanup(&self, _samples: &DatasetView, _key: &str) -> Result<()> {
        Err(Error::Other("index is read-only".to_string()))
    }
}

impl MethodConfig for BrittleConfig {
    const CLS: &'static str = "tests.BrittleConfig";

    fn method(&self) -> &str {
        "brittle"
    }

    fn build(&self) -> Box<dyn Run> {
        Box::new(Brittle(self.clone()))
    }
}

// =============================================================================
// Method that needs credentials at load time
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub endpoint: String,
    #[serde(skip)]
    pub api_key: Option<String>,
}

pub struct Remote(RemoteConfig);

impl Run for Remote {
    fn config(&self) -> &dyn RunConfig {
        &self.0
    }
}

impl MethodConfig for RemoteConfig {
    const CLS: &'static str = "tests.RemoteConfig";

    fn method(&self) -> &str {
        "remote"
    }

    fn build(&self) -> Box<dyn Run> {
        Box::new(Remote(self.clone()))
    }

    fn load_credentials(&mut self, credentials: &Map<String, Value>) -> Result<()> {
        let key = credentials
            .get("api_key")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidArgument("api_key credential is required".to_string()))?;
        self.api_key = Some(key.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counts {
    pub total: u64,
}

impl ResultsType for Counts {
    const CLS: &'static str = "tests.Counts";
}

// =============================================================================
// Helpers
// =============================================================================

pub const VERSION: &str = "0.1.0";

pub fn registry() -> Arc<TypeRegistry> {
    let mut registry = TypeRegistry::new();
    registry
        .register_config::<ClassificationConfig>()
        .register_config::<DetectionConfig>()
        .register_config::<BrittleConfig>()
        .register_config::<RemoteConfig>()
        .register_results::<ClassificationResults>()
        .register_results::<Counts>();
    Arc::new(registry)
}

pub fn runs_with(store: Arc<MemoryDocumentStore>, kind: RunKind) -> Runs {
    Runs::builder(kind)
        .version(VERSION)
        .build(store, registry())
        .unwrap()
}

pub fn evaluations() -> Runs {
    runs_with(Arc::new(MemoryDocumentStore::new()), RunKind::EVALUATIONS)
}

pub fn classification(pred_field: &str) -> Box<dyn Run> {
    MethodConfig::build(&ClassificationConfig::new(pred_field))
}

pub fn detection(pred_field: &str) -> Box<dyn Run> {
    MethodConfig::build(&DetectionConfig {
        pred_field: pred_field.to_string(),
        iou: 0.5,
    })
}

pub fn accuracy(value: f64) -> Box<ClassificationResults> {
    Box::new(ClassificationResults {
        accuracy: value,
        classes: vec!["cat".to_string(), "dog".to_string()],
    })
}
