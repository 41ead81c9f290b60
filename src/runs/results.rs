//! Run Results - optional payload produced by a run
//!
//! Results are persisted as a JSON blob `{"cls": <tag>, ...fields}` and
//! rehydrated through the [`TypeRegistry`](super::TypeRegistry).

use std::fmt;
use std::sync::Arc;

use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::config::{AsAny, RunConfig};
use super::lifecycle::Runs;
use super::registry::TypeRegistry;
use super::run::Run;
use crate::view::DatasetView;
use crate::{Error, Result};

/// Shared handle to results, as held by callers and the results cache.
pub type SharedResults = Arc<RunResults>;

/// What a results decoder can see besides the stored fields.
#[derive(Debug, Clone, Copy)]
pub struct ResultsContext<'a> {
    /// View the run was executed on
    pub samples: &'a DatasetView,
    /// Config of the run
    pub config: &'a dyn RunConfig,
    /// Run key
    pub key: &'a str,
}

/// Object-safe view of a results payload.
///
/// Implemented for every [`ResultsType`].
pub trait ResultsPayload: AsAny + fmt::Debug + Send + Sync {
    /// Stable type tag, stored as `cls`.
    fn cls(&self) -> &'static str;

    /// Serialized fields, excluding `cls`.
    ///
    /// # Errors
    ///
    /// Returns error if the payload does not serialize to a JSON object.
    fn fields(&self) -> Result<Map<String, Value>>;
}

/// A concrete, serde-serializable results payload.
pub trait ResultsType: Serialize + DeserializeOwned + fmt::Debug + Send + Sync + 'static {
    /// Stable type tag.
    const CLS: &'static str;

    /// Rebuild the payload from its stored fields.
    ///
    /// The default deserializes the fields directly; override to use the
    /// run's view or config while rebuilding.
    ///
    /// # Errors
    ///
    /// Returns error if the fields don't decode.
    fn from_fields(fields: Map<String, Value>, _ctx: &ResultsContext<'_>) -> Result<Self> {
        Ok(serde_json::from_value(Value::Object(fields))?)
    }
}

impl<T: ResultsType> ResultsPayload for T {
    fn cls(&self) -> &'static str {
        T::CLS
    }

    fn fields(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(mut fields) => {
                fields.shift_remove("cls");
                Ok(fields)
            }
            Value::Null => Ok(Map::new()),
            other => Err(Error::InvalidArgument(format!(
                "results {} must serialize to a JSON object, got {other}",
                T::CLS
            ))),
        }
    }
}

/// Results of a run, bound to the view, config, backend and key they belong to.
///
/// Key and payload can change after creation (rename, delete, in-place
/// edits), so they sit behind locks; the results cache and callers share the
/// same instance.
pub struct RunResults {
    samples: DatasetView,
    config: RwLock<Arc<dyn RunConfig>>,
    backend: Box<dyn Run>,
    key: RwLock<Option<String>>,
    payload: RwLock<Box<dyn ResultsPayload>>,
}

impl RunResults {
    /// Create results for a run.
    ///
    /// If `backend` is `None`, one is built from `config` and its usage
    /// requirements are checked.
    ///
    /// # Errors
    ///
    /// Returns error if a built backend's usage requirements are not met.
    pub fn new(
        samples: DatasetView,
        config: Arc<dyn RunConfig>,
        key: Option<String>,
        payload: Box<dyn ResultsPayload>,
        backend: Option<Box<dyn Run>>,
    ) -> Result<Self> {
        let backend = match backend {
            Some(backend) => backend,
            None => {
                let backend = config.build();
                backend.ensure_usage_requirements()?;
                backend
            }
        };

        Ok(Self {
            samples,
            config: RwLock::new(config),
            backend,
            key: RwLock::new(key),
            payload: RwLock::new(payload),
        })
    }

    /// Type tag of the payload.
    #[must_use]
    pub fn cls(&self) -> &'static str {
        self.payload.read().cls()
    }

    /// View these results belong to.
    #[must_use]
    pub const fn samples(&self) -> &DatasetView {
        &self.samples
    }

    /// Config of the run.
    #[must_use]
    pub fn config(&self) -> Arc<dyn RunConfig> {
        Arc::clone(&self.config.read())
    }

    /// Replace the config held by these results.
    ///
    /// Call [`save_config`](Self::save_config) to persist it.
    pub fn set_config(&self, config: Arc<dyn RunConfig>) {
        *self.config.write() = config;
    }

    /// The run these results belong to.
    #[must_use]
    pub fn backend(&self) -> &dyn Run {
        self.backend.as_ref()
    }

    /// Run key, or `None` once the run has been deleted.
    #[must_use]
    pub fn key(&self) -> Option<String> {
        self.key.read().clone()
    }

    pub(crate) fn set_key(&self, key: Option<String>) {
        *self.key.write() = key;
    }

    /// Borrow the payload.
    pub fn payload(&self) -> RwLockReadGuard<'_, Box<dyn ResultsPayload>> {
        self.payload.read()
    }

    /// Borrow the payload as a concrete type.
    #[must_use]
    pub fn payload_as<T: ResultsType>(&self) -> Option<MappedRwLockReadGuard<'_, T>> {
        RwLockReadGuard::try_map(self.payload.read(), |p| (**p).as_any().downcast_ref::<T>()).ok()
    }

    /// Mutably borrow the payload as a concrete type.
    ///
    /// Changes are persisted by [`save`](Self::save).
    #[must_use]
    pub fn payload_as_mut<T: ResultsType>(&self) -> Option<MappedRwLockWriteGuard<'_, T>> {
        RwLockWriteGuard::try_map(self.payload.write(), |p| {
            (**p).as_any_mut().downcast_mut::<T>()
        })
        .ok()
    }

    /// Serialize to `{"cls": <tag>, ...fields}`.
    ///
    /// # Errors
    ///
    /// Returns error if the payload cannot be serialized.
    pub fn serialize(&self) -> Result<Value> {
        let payload = self.payload.read();
        let mut d = Map::new();
        d.insert("cls".to_string(), Value::String(payload.cls().to_string()));
        d.extend(payload.fields()?);
        Ok(Value::Object(d))
    }

    /// Rebuild results from their serialized dict, dispatching on `cls`.
    ///
    /// Returns `Ok(None)` for a `null` dict.
    ///
    /// # Errors
    ///
    /// Returns error if the tag is unknown, the fields don't decode, or the
    /// backend's usage requirements are not met.
    pub fn from_dict(
        d: Value,
        samples: DatasetView,
        config: Arc<dyn RunConfig>,
        key: &str,
        registry: &TypeRegistry,
    ) -> Result<Option<Self>> {
        if d.is_null() {
            return Ok(None);
        }

        let payload = {
            let ctx = ResultsContext {
                samples: &samples,
                config: config.as_ref(),
                key,
            };
            registry.results_from_dict(d, &ctx)?
        };

        Self::new(samples, config, Some(key.to_string()), payload, None).map(Some)
    }

    /// Save these results under their key, replacing any stored results.
    ///
    /// They stay cached only if they were cached before.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Detached`] if the run was deleted, or any error from
    /// [`Runs::save_run_results`].
    pub fn save(self: &Arc<Self>, runs: &Runs) -> Result<()> {
        let key = self.key().ok_or(Error::Detached)?;
        let cache = runs.has_cached_run_results(&self.samples, &key);
        runs.save_run_results(&self.samples, &key, Some(Arc::clone(self)), true, cache)
    }

    /// Persist the current config of these results.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Detached`] if the run was deleted, or any error from
    /// [`Runs::update_run_config`].
    pub fn save_config(&self, runs: &Runs) -> Result<()> {
        let key = self.key().ok_or(Error::Detached)?;
        let config = self.config();
        runs.update_run_config(&self.samples, &key, config.as_ref())
    }
}

impl fmt::Debug for RunResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunResults")
            .field("key", &*self.key.read())
            .field("config", &*self.config.read())
            .field("payload", &*self.payload.read())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runs::MethodConfig;
    use crate::view::Dataset;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct ClassificationConfig {
        pred_field: String,
    }

    struct Classification(ClassificationConfig);

    impl Run for Classification {
        fn config(&self) -> &dyn RunConfig {
            &self.0
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

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct ClassificationResults {
        accuracy: f64,
        classes: Vec<String>,
    }

    impl ResultsType for ClassificationResults {
        const CLS: &'static str = "evaluation.ClassificationResults";
    }

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry
            .register_config::<ClassificationConfig>()
            .register_results::<ClassificationResults>();
        registry
    }

    fn config() -> Arc<dyn RunConfig> {
        Arc::new(ClassificationConfig {
            pred_field: "predictions".to_string(),
        })
    }

    fn results() -> RunResults {
        RunResults::new(
            Dataset::new("ds").view(),
            config(),
            Some("eval".to_string()),
            Box::new(ClassificationResults {
                accuracy: 0.9,
                classes: vec!["cat".to_string(), "dog".to_string()],
            }),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_serialize_tags_payload() {
        let d = results().serialize().unwrap();
        assert_eq!(
            d,
            json!({
                "cls": "evaluation.ClassificationResults",
                "accuracy": 0.9,
                "classes": ["cat", "dog"]
            })
        );
    }

    #[test]
    fn test_from_dict_dispatches_on_cls() {
        let original = results();
        let d = original.serialize().unwrap();

        let samples = original.samples().clone();
        let restored = RunResults::from_dict(d, samples, config(), "eval", &registry())
            .unwrap()
            .unwrap();

        assert_eq!(restored.key().as_deref(), Some("eval"));
        assert_eq!(restored.cls(), "evaluation.ClassificationResults");
        assert_eq!(
            *restored.payload_as::<ClassificationResults>().unwrap(),
            *original.payload_as::<ClassificationResults>().unwrap()
        );
        assert_eq!(restored.backend().config().cls(), "evaluation.ClassificationConfig");
    }

    #[test]
    fn test_from_dict_null_is_none() {
        let view = Dataset::new("ds").view();
        let restored =
            RunResults::from_dict(Value::Null, view, config(), "eval", &registry()).unwrap();
        assert!(restored.is_none());
    }

    #[test]
    fn test_from_dict_unknown_cls() {
        let err = RunResults::from_dict(
            json!({"cls": "evaluation.MissingResults"}),
            Dataset::new("ds").view(),
            config(),
            "eval",
            &registry(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownType { kind: "results", .. }));
    }

    #[test]
    fn test_payload_mutation_in_place() {
        let results = results();
        results.payload_as_mut::<ClassificationResults>().unwrap().accuracy = 0.95;
        assert_eq!(results.serialize().unwrap()["accuracy"], 0.95);
    }

    #[test]
    fn test_payload_wrong_type_is_none() {
        #[derive(Debug, Serialize, Deserialize)]
        struct Other;
        impl ResultsType for Other {
            const CLS: &'static str = "Other";
        }

        assert!(results().payload_as::<Other>().is_none());
    }

    #[test]
    fn test_detached_results_cannot_save() {
        let runs = Runs::builder(crate::runs::RunKind::EVALUATIONS)
            .build(
                Arc::new(crate::store::MemoryDocumentStore::new()),
                Arc::new(registry()),
            )
            .unwrap();

        let results = Arc::new(results());
        results.set_key(None);
        assert!(matches!(results.save(&runs), Err(Error::Detached)));
        assert!(matches!(results.save_config(&runs), Err(Error::Detached)));
    }
}
