//! Run Config - serializable description of a run method and its parameters

use std::any::Any;
use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::registry::TypeRegistry;
use super::run::Run;
use crate::{Error, Result};

/// Upcast to [`Any`] for typed access through trait objects.
pub trait AsAny: Any {
    /// Borrow as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Borrow as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Object-safe view of a run configuration.
///
/// Implemented for every [`MethodConfig`]; the runs framework stores and
/// passes configs as `Arc<dyn RunConfig>`.
pub trait RunConfig: AsAny + Debug + Send + Sync {
    /// The name of the method.
    fn method(&self) -> &str;

    /// Stable type tag of this config, used to resolve it at load time.
    fn cls(&self) -> &'static str;

    /// Type tag of the run this config builds.
    fn run_type(&self) -> &'static str;

    /// Broader run types this run also counts as when filtering.
    fn run_lineage(&self) -> &'static [&'static str];

    /// Build the [`Run`] bound to a copy of this config.
    fn build(&self) -> Box<dyn Run>;

    /// Load any credentials the run needs from the given parameters.
    ///
    /// # Errors
    ///
    /// Returns error if required credentials are missing or malformed.
    fn load_credentials(&mut self, credentials: &Map<String, Value>) -> Result<()>;

    /// Method-specific fields, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns error if the config does not serialize to a JSON object.
    fn fields(&self) -> Result<Map<String, Value>>;

    /// Clone into a new boxed config.
    fn clone_config(&self) -> Box<dyn RunConfig>;

    /// Names of the serialized attributes: `method`, `cls`, then the fields.
    ///
    /// # Errors
    ///
    /// Returns error if the fields cannot be serialized.
    fn attributes(&self) -> Result<Vec<String>> {
        let mut attrs = vec!["method".to_string(), "cls".to_string()];
        attrs.extend(self.fields()?.into_iter().map(|(name, _)| name));
        Ok(attrs)
    }

    /// Serialize to a JSON dict in [`attributes`](Self::attributes) order.
    ///
    /// # Errors
    ///
    /// Returns error if the fields cannot be serialized.
    fn serialize(&self) -> Result<Value> {
        let mut d = Map::new();
        d.insert("method".to_string(), Value::String(self.method().to_string()));
        d.insert("cls".to_string(), Value::String(self.cls().to_string()));
        d.extend(self.fields()?);
        Ok(Value::Object(d))
    }

    /// Look up a serialized attribute by name.
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "method" => Some(Value::String(self.method().to_string())),
            "cls" => Some(Value::String(self.cls().to_string())),
            _ => self.fields().ok()?.remove(name),
        }
    }

    /// Whether the built run is of type `run_type` or declares it as an ancestor.
    fn is_run_type(&self, run_type: &str) -> bool {
        self.run_type() == run_type || self.run_lineage().contains(&run_type)
    }
}

impl dyn RunConfig {
    /// Reconstruct a config from its serialized dict.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownType`] if `cls` is not registered, or a
    /// decode error if the fields don't fit the registered type.
    pub fn from_dict(d: Value, registry: &TypeRegistry) -> Result<Box<Self>> {
        registry.config_from_dict(d)
    }

    /// Downcast to a concrete config type.
    #[must_use]
    pub fn downcast_ref<T: MethodConfig>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// A concrete, serde-serializable run configuration.
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use trueno_runs::runs::{MethodConfig, Run, RunConfig};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct UniquenessConfig {
///     embeddings_field: Option<String>,
/// }
///
/// struct Uniqueness(UniquenessConfig);
///
/// impl Run for Uniqueness {
///     fn config(&self) -> &dyn RunConfig {
///         &self.0
///     }
/// }
///
/// impl MethodConfig for UniquenessConfig {
///     const CLS: &'static str = "brain.UniquenessConfig";
///
///     fn method(&self) -> &str {
///         "uniqueness"
///     }
///
///     fn build(&self) -> Box<dyn Run> {
///         Box::new(Uniqueness(self.clone()))
///     }
/// }
///
/// let config = UniquenessConfig { embeddings_field: None };
/// assert_eq!(config.run_type(), "brain.Uniqueness");
/// assert_eq!(
///     config.attributes().unwrap(),
///     vec!["method", "cls", "embeddings_field"]
/// );
/// ```
pub trait MethodConfig: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    /// Stable type tag. By convention it ends in `Config`; the run type is
    /// the tag with that suffix removed.
    const CLS: &'static str;

    /// Broader run types this run counts as when filtering.
    const RUN_LINEAGE: &'static [&'static str] = &[];

    /// The name of the method.
    fn method(&self) -> &str;

    /// Build the run bound to a copy of this config.
    fn build(&self) -> Box<dyn Run>;

    /// Load credentials; the default needs none.
    ///
    /// # Errors
    ///
    /// Returns error if required credentials are missing or malformed.
    fn load_credentials(&mut self, _credentials: &Map<String, Value>) -> Result<()> {
        Ok(())
    }
}

impl<T: MethodConfig> RunConfig for T {
    fn method(&self) -> &str {
        MethodConfig::method(self)
    }

    fn cls(&self) -> &'static str {
        T::CLS
    }

    fn run_type(&self) -> &'static str {
        T::CLS.strip_suffix("Config").unwrap_or(T::CLS)
    }

    fn run_lineage(&self) -> &'static [&'static str] {
        T::RUN_LINEAGE
    }

    fn build(&self) -> Box<dyn Run> {
        MethodConfig::build(self)
    }

    fn load_credentials(&mut self, credentials: &Map<String, Value>) -> Result<()> {
        MethodConfig::load_credentials(self, credentials)
    }

    fn fields(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(mut fields) => {
                fields.shift_remove("method");
                fields.shift_remove("cls");
                Ok(fields)
            }
            Value::Null => Ok(Map::new()),
            other => Err(Error::InvalidArgument(format!(
                "config {} must serialize to a JSON object, got {other}",
                T::CLS
            ))),
        }
    }

    fn clone_config(&self) -> Box<dyn RunConfig> {
        Box::new(self.clone())
    }
}
