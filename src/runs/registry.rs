//! Type Registry - resolves stored type tags to concrete config and results types
//!
//! Persisted configs and results carry a `cls` tag. Loading them looks the
//! tag up here instead of resolving a type by name at runtime, so every
//! method and results type must be registered once at startup.

use std::collections::HashMap;
use std::fmt;

use serde_json::{json, Map, Value};
use tracing::warn;

use super::config::{MethodConfig, RunConfig};
use super::results::{ResultsContext, ResultsPayload, ResultsType};
use crate::{Error, Result};

type ConfigDecoder = fn(Map<String, Value>) -> Result<Box<dyn RunConfig>>;
type ResultsDecoder =
    fn(Map<String, Value>, &ResultsContext<'_>) -> Result<Box<dyn ResultsPayload>>;

/// Registry of known config and results types, keyed by their `cls` tag.
///
/// ## Example
///
/// ```rust
/// use trueno_runs::runs::TypeRegistry;
///
/// let registry = TypeRegistry::new();
/// assert!(registry.is_empty());
/// assert!(!registry.has_config("brain.SimilarityConfig"));
/// ```
#[derive(Default)]
pub struct TypeRegistry {
    configs: HashMap<&'static str, ConfigDecoder>,
    results: HashMap<&'static str, ResultsDecoder>,
}

impl TypeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if no types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty() && self.results.is_empty()
    }

    /// Register a config type under its `CLS` tag.
    ///
    /// Registering the same tag again replaces the previous entry.
    pub fn register_config<C: MethodConfig>(&mut self) -> &mut Self {
        self.configs.insert(C::CLS, decode_config::<C>);
        self
    }

    /// Register a results type under its `CLS` tag.
    pub fn register_results<R: ResultsType>(&mut self) -> &mut Self {
        self.results.insert(R::CLS, decode_results::<R>);
        self
    }

    /// Check if a config tag is registered.
    #[must_use]
    pub fn has_config(&self, cls: &str) -> bool {
        self.configs.contains_key(cls)
    }

    /// Check if a results tag is registered.
    #[must_use]
    pub fn has_results(&self, cls: &str) -> bool {
        self.results.contains_key(cls)
    }

    /// Reconstruct a config from its serialized dict.
    ///
    /// `method` and `cls` are consumed; the remaining fields are handed to the
    /// registered type.
    ///
    /// # Errors
    ///
    /// Returns error if the dict has no `cls`, the tag is unknown, or the
    /// fields don't decode.
    pub fn config_from_dict(&self, d: Value) -> Result<Box<dyn RunConfig>> {
        let mut fields = into_object(d, "config")?;
        fields.shift_remove("method");
        let cls = take_cls(&mut fields, "config")?;

        let decode = self.configs.get(cls.as_str()).ok_or(Error::UnknownType {
            kind: "config",
            tag: cls,
        })?;
        decode(fields)
    }

    /// Reconstruct a results payload from its serialized dict.
    ///
    /// # Errors
    ///
    /// Returns error if the dict has no `cls`, the tag is unknown, or the
    /// fields don't decode.
    pub fn results_from_dict(
        &self,
        d: Value,
        ctx: &ResultsContext<'_>,
    ) -> Result<Box<dyn ResultsPayload>> {
        let mut fields = into_object(d, "results")?;
        let cls = take_cls(&mut fields, "results")?;

        let decode = self.results.get(cls.as_str()).ok_or(Error::UnknownType {
            kind: "results",
            tag: cls,
        })?;
        decode(fields, ctx)
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut configs: Vec<_> = self.configs.keys().collect();
        configs.sort();
        let mut results: Vec<_> = self.results.keys().collect();
        results.sort();
        f.debug_struct("TypeRegistry")
            .field("configs", &configs)
            .field("results", &results)
            .finish()
    }
}

fn into_object(d: Value, what: &str) -> Result<Map<String, Value>> {
    match d {
        Value::Object(fields) => Ok(fields),
        other => Err(Error::InvalidArgument(format!(
            "serialized {what} must be a JSON object, got {other}"
        ))),
    }
}

fn take_cls(fields: &mut Map<String, Value>, what: &str) -> Result<String> {
    match fields.shift_remove("cls") {
        Some(Value::String(cls)) => Ok(cls),
        _ => Err(Error::InvalidArgument(format!(
            "serialized {what} has no 'cls' type tag"
        ))),
    }
}

fn decode_config<C: MethodConfig>(fields: Map<String, Value>) -> Result<Box<dyn RunConfig>> {
    let config: C = serde_json::from_value(Value::Object(fields.clone()))?;

    let ignored = ignored_parameters(&config, &fields)?;
    if !ignored.is_empty() {
        warn!("Ignoring unsupported parameters {:?} for {}", ignored, C::CLS);
    }

    Ok(Box::new(config))
}

/// Input keys that decoding `config` from `fields` did not read.
///
/// Keys missing from the re-serialized config may still have been read (a
/// field skipped on serialization), so each one is checked by swapping its
/// value for one no plain field type accepts: a read key then fails to
/// decode or changes the decoded config.
fn ignored_parameters<C: MethodConfig>(
    config: &C,
    fields: &Map<String, Value>,
) -> Result<Vec<String>> {
    let known = config.fields()?;

    Ok(fields
        .keys()
        .filter(|key| !known.contains_key(*key))
        .filter(|key| {
            let mut swapped = fields.clone();
            swapped.insert((*key).clone(), json!({ "\u{0}": [null] }));
            match serde_json::from_value::<C>(Value::Object(swapped)) {
                Ok(decoded) => decoded.fields().is_ok_and(|f| f == known),
                Err(_) => false,
            }
        })
        .cloned()
        .collect())
}

fn decode_results<R: ResultsType>(
    fields: Map<String, Value>,
    ctx: &ResultsContext<'_>,
) -> Result<Box<dyn ResultsPayload>> {
    Ok(Box::new(R::from_fields(fields, ctx)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runs::Run;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct HardnessConfig {
        label_field: String,
    }

    struct Hardness(HardnessConfig);

    impl Run for Hardness {
        fn config(&self) -> &dyn RunConfig {
            &self.0
        }
    }

    impl MethodConfig for HardnessConfig {
        const CLS: &'static str = "brain.HardnessConfig";

        fn method(&self) -> &str {
            "hardness"
        }

        fn build(&self) -> Box<dyn Run> {
            Box::new(Hardness(self.clone()))
        }
    }

    #[test]
    fn test_config_round_trip() {
        let mut registry = TypeRegistry::new();
        registry.register_config::<HardnessConfig>();

        let config = HardnessConfig {
            label_field: "predictions".to_string(),
        };
        let d = RunConfig::serialize(&config).unwrap();
        let restored = registry.config_from_dict(d.clone()).unwrap();

        assert_eq!(restored.cls(), "brain.HardnessConfig");
        assert_eq!(RunConfig::serialize(&*restored).unwrap(), d);
    }

    #[test]
    fn test_unknown_config_tag() {
        let registry = TypeRegistry::new();
        let err = registry
            .config_from_dict(json!({"method": "x", "cls": "missing.XConfig"}))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownType { kind: "config", .. }));
    }

    #[test]
    fn test_missing_cls_tag() {
        let registry = TypeRegistry::new();
        let err = registry.config_from_dict(json!({"method": "x"})).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_extra_parameters_are_ignored() {
        let mut registry = TypeRegistry::new();
        registry.register_config::<HardnessConfig>();

        let restored = registry
            .config_from_dict(json!({
                "method": "hardness",
                "cls": "brain.HardnessConfig",
                "label_field": "gt",
                "legacy_flag": true
            }))
            .unwrap();

        assert_eq!(restored.field("label_field"), Some(json!("gt")));
        assert_eq!(restored.field("legacy_flag"), None);
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct MistakennessConfig {
        label_field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        copy_missing: Option<bool>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        classes: Vec<String>,
    }

    struct Mistakenness(MistakennessConfig);

    impl Run for Mistakenness {
        fn config(&self) -> &dyn RunConfig {
            &self.0
        }
    }

    impl MethodConfig for MistakennessConfig {
        const CLS: &'static str = "brain.MistakennessConfig";

        fn method(&self) -> &str {
            "mistakenness"
        }

        fn build(&self) -> Box<dyn Run> {
            Box::new(Mistakenness(self.clone()))
        }
    }

    fn ignored_in(d: &Value) -> Vec<String> {
        let fields = d.as_object().unwrap().clone();
        let config: MistakennessConfig = serde_json::from_value(d.clone()).unwrap();
        ignored_parameters(&config, &fields).unwrap()
    }

    #[test]
    fn test_skipped_fields_are_not_reported_ignored() {
        let d = json!({"label_field": "gt", "copy_missing": null, "classes": []});
        assert!(ignored_in(&d).is_empty());
    }

    #[test]
    fn test_unknown_fields_are_reported_ignored() {
        let d = json!({"label_field": "gt", "classes": [], "legacy_flag": true, "stale": null});
        assert_eq!(ignored_in(&d), vec!["legacy_flag", "stale"]);
    }

    #[test]
    fn test_debug_lists_tags() {
        let mut registry = TypeRegistry::new();
        registry.register_config::<HardnessConfig>();
        let debug = format!("{registry:?}");
        assert!(debug.contains("brain.HardnessConfig"));
    }
}
