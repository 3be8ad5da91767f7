//! Top-level configuration structure and profile merging.
//!
//! For file discovery see the `discovery` module; for layered loading see
//! `loading`.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use skein_graph::{Entry, Mode};

use crate::error::{ConfigError, Result as ConfigResult};
use crate::settings::GlobalSettings;
use crate::types::{CommandLoaderConfig, ModuleConfig, OneOrMany, OutputConfig, ResolveConfig};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkeinConfig {
    #[serde(default)]
    pub mode: Mode,

    /// Base directory for entries and module ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<PathBuf>,

    /// Entry name → root specifiers
    #[serde(default)]
    pub entry: IndexMap<String, OneOrMany<String>>,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub module: ModuleConfig,

    #[serde(default)]
    pub resolve: ResolveConfig,

    /// External commands available to rules by name
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub loaders: IndexMap<String, CommandLoaderConfig>,

    #[serde(default)]
    pub settings: GlobalSettings,

    /// Empty the output directory before writing
    #[serde(default)]
    pub clean: bool,

    /// Named partial configs merged over the base
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub profiles: IndexMap<String, Value>,
}

impl SkeinConfig {
    /// Create from a JSON value.
    ///
    /// # Example
    ///
    /// ```
    /// use skein_config::SkeinConfig;
    /// use serde_json::json;
    ///
    /// let config = SkeinConfig::from_value(json!({
    ///     "mode": "development",
    ///     "entry": { "main": ["./src/index.js"] },
    ///     "output": { "filename": "[name].js" }
    /// }))
    /// .unwrap();
    ///
    /// assert_eq!(config.entries()[0].name, "main");
    /// ```
    pub fn from_value(value: Value) -> ConfigResult<Self> {
        serde_json::from_value(value).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            hint: Some(e.to_string()),
        })
    }

    pub fn to_value(&self) -> ConfigResult<Value> {
        serde_json::to_value(self).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            hint: Some(e.to_string()),
        })
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> Vec<Entry> {
        self.entry
            .iter()
            .map(|(name, specifiers)| Entry::new(name.clone(), specifiers.iter().cloned()))
            .collect()
    }

    /// Merge the named profile over this config.
    pub fn materialize_profile(self, profile: Option<&str>) -> ConfigResult<Self> {
        let Some(name) = profile else {
            return Ok(self);
        };
        let mut base = self.to_value()?;
        apply_profile(&mut base, name)?;
        serde_json::from_value(base).map_err(|err| ConfigError::InvalidProfileOverride {
            message: err.to_string(),
        })
    }
}

/// Merge `profiles.<name>` of a raw config value into the value itself.
pub fn apply_profile(config: &mut Value, name: &str) -> ConfigResult<()> {
    let profiles = config.get("profiles").and_then(Value::as_object);
    let Some(overrides) = profiles.and_then(|p| p.get(name)).cloned() else {
        let available = profiles
            .map(|p| p.keys().cloned().collect())
            .unwrap_or_default();
        return Err(ConfigError::UnknownProfile {
            name: name.to_string(),
            available,
        });
    };

    if !overrides.is_null() && !overrides.is_object() {
        return Err(ConfigError::InvalidProfileOverride {
            message: format!("profile '{name}' must be a table"),
        });
    }

    merge_values(config, &overrides);
    Ok(())
}

/// Deep-merge objects; any other update replaces the target.
pub(crate) fn merge_values(target: &mut Value, update: &Value) {
    match (target, update) {
        (Value::Object(target_map), Value::Object(update_map)) => {
            for (key, value) in update_map {
                merge_values(target_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (_, Value::Null) => {}
        (target_slot, _) => {
            *target_slot = update.clone();
        }
    }
}
