//! Datasets and views as seen by the runs framework
//!
//! A view is a dataset plus an ordered list of stage descriptors. The query
//! engine that evaluates stages lives outside this crate; here views only
//! need to be serialized into run documents and rebuilt from them.
//!
//! ## Stage Wire Format
//!
//! ```text
//! {"_cls": "SelectFields", "kwargs": {"field_names": ["ground_truth"]}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Stage tag for field selection.
pub const SELECT_FIELDS: &str = "SelectFields";

/// Stage tag for field exclusion.
pub const EXCLUDE_FIELDS: &str = "ExcludeFields";

/// Root dataset that runs are recorded on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    id: String,
    name: String,
}

impl Dataset {
    /// Create a dataset handle with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
        }
    }

    /// Create a dataset handle for an existing id.
    #[must_use]
    pub fn with_id(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Get the dataset ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the dataset name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The unfiltered view of this dataset.
    #[must_use]
    pub fn view(&self) -> DatasetView {
        DatasetView {
            dataset: self.clone(),
            stages: Vec::new(),
        }
    }
}

/// One step of a view pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewStage {
    #[serde(rename = "_cls")]
    kind: String,
    #[serde(default)]
    kwargs: Value,
}

impl ViewStage {
    /// Create a stage from its tag and keyword arguments.
    #[must_use]
    pub fn new(kind: impl Into<String>, kwargs: Value) -> Self {
        Self {
            kind: kind.into(),
            kwargs,
        }
    }

    /// Stage tag.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Stage keyword arguments.
    #[must_use]
    pub const fn kwargs(&self) -> &Value {
        &self.kwargs
    }

    fn field_names(&self) -> Vec<String> {
        self.kwargs
            .get("field_names")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A dataset together with the stages that filter it.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetView {
    dataset: Dataset,
    stages: Vec<ViewStage>,
}

impl DatasetView {
    /// Rebuild a view from serialized stage dicts.
    ///
    /// # Errors
    ///
    /// Returns error if a stage dict is not a `{"_cls", "kwargs"}` object.
    pub fn build(dataset: &Dataset, stage_dicts: Vec<Value>) -> crate::Result<Self> {
        let stages = stage_dicts
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<ViewStage>, _>>()?;

        Ok(Self {
            dataset: dataset.clone(),
            stages,
        })
    }

    /// The dataset this view filters.
    #[must_use]
    pub const fn root_dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Stages in application order.
    #[must_use]
    pub fn stages(&self) -> &[ViewStage] {
        &self.stages
    }

    /// Whether this view is the whole dataset.
    #[must_use]
    pub fn is_full_dataset(&self) -> bool {
        self.stages.is_empty()
    }

    /// Append an arbitrary stage.
    #[must_use]
    pub fn add_stage(mut self, stage: ViewStage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Restrict the view to the given fields.
    #[must_use]
    pub fn select_fields<S: AsRef<str>>(self, fields: &[S]) -> Self {
        let names: Vec<&str> = fields.iter().map(AsRef::as_ref).collect();
        self.add_stage(ViewStage::new(SELECT_FIELDS, json!({ "field_names": names })))
    }

    /// Hide the given fields from the view.
    #[must_use]
    pub fn exclude_fields<S: AsRef<str>>(self, fields: &[S]) -> Self {
        let names: Vec<&str> = fields.iter().map(AsRef::as_ref).collect();
        self.add_stage(ViewStage::new(EXCLUDE_FIELDS, json!({ "field_names": names })))
    }

    /// Fields named by `SelectFields` stages, in stage order.
    #[must_use]
    pub fn selected_fields(&self) -> Vec<String> {
        self.fields_of(SELECT_FIELDS)
    }

    /// Fields named by `ExcludeFields` stages, in stage order.
    #[must_use]
    pub fn excluded_fields(&self) -> Vec<String> {
        self.fields_of(EXCLUDE_FIELDS)
    }

    fn fields_of(&self, kind: &str) -> Vec<String> {
        self.stages
            .iter()
            .filter(|s| s.kind == kind)
            .flat_map(ViewStage::field_names)
            .collect()
    }

    /// Serialize the stages to JSON dicts.
    ///
    /// # Errors
    ///
    /// Returns error if a stage's kwargs cannot be encoded.
    pub fn serialize(&self) -> crate::Result<Vec<Value>> {
        self.stages
            .iter()
            .map(|s| serde_json::to_value(s).map_err(Into::into))
            .collect()
    }
}

/// Reduce field paths to their top-level fields, deduplicated, in first-seen order.
///
/// `"ground_truth.detections.label"` has root `"ground_truth"`.
#[must_use]
pub fn root_fields<S: AsRef<str>>(paths: &[S]) -> Vec<String> {
    let mut roots: Vec<String> = Vec::new();
    for path in paths {
        let root = path.as_ref().split('.').next().unwrap_or_default();
        if !root.is_empty() && !roots.iter().any(|r| r == root) {
            roots.push(root.to_string());
        }
    }
    roots
}

/// Whether `path` lies strictly under one of `roots` (dot-path containment).
#[must_use]
pub fn is_nested_under<S: AsRef<str>>(path: &str, roots: &[S]) -> bool {
    roots.iter().any(|r| {
        path.strip_prefix(r.as_ref())
            .is_some_and(|rest| rest.starts_with('.'))
    })
}
