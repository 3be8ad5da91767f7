//! Layered configuration loading.
//!
//! Priority, lowest first: built-in defaults, the config file, the selected
//! profile, `SKEIN_*` environment variables, then explicit overrides (CLI
//! flags). Nested keys in environment variables use `__`, so
//! `SKEIN_OUTPUT__PATH=build` sets `output.path`.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Serialized};
use path_clean::PathClean;
use serde::Serialize;
use serde_json::Value;
use skein_graph::Mode;
use tracing::debug;

use crate::config::{SkeinConfig, apply_profile, merge_values};
use crate::discovery::ConfigDiscovery;
use crate::error::{ConfigError, Result};

/// Default environment variable prefix.
pub const ENV_PREFIX: &str = "SKEIN_";

/// Values that take precedence over every other source.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub clean: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputOverrides>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutputOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl ConfigOverrides {
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn clean(mut self, clean: bool) -> Self {
        self.clean = Some(clean);
        self
    }

    pub fn out_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(OutputOverrides {
            path: Some(path.into()),
        });
        self
    }
}

/// A loaded config together with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: SkeinConfig,
    /// Config file, if one was read
    pub source: Option<PathBuf>,
    /// Directory relative paths in the config are resolved against
    pub base_dir: PathBuf,
}

impl LoadedConfig {
    /// Absolute build context.
    pub fn context(&self) -> PathBuf {
        match &self.config.context {
            Some(context) => self.base_dir.join(context).clean(),
            None => self.base_dir.clone(),
        }
    }

    /// Absolute output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.base_dir.join(&self.config.output.path).clean()
    }
}

/// Builder for layered config loading.
///
/// ```no_run
/// use skein_config::{ConfigLoader, ConfigOverrides};
///
/// let loaded = ConfigLoader::new(".")
///     .profile(Some("production"))
///     .overrides(ConfigOverrides::default().clean(true))
///     .load()
///     .unwrap();
/// println!("building into {}", loaded.output_dir().display());
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    root: PathBuf,
    file: Option<PathBuf>,
    profile: Option<String>,
    env_prefix: String,
    overrides: ConfigOverrides,
}

impl ConfigLoader {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            file: None,
            profile: None,
            env_prefix: ENV_PREFIX.to_string(),
            overrides: ConfigOverrides::default(),
        }
    }

    /// Use this file instead of searching the root.
    pub fn file(mut self, path: Option<impl Into<PathBuf>>) -> Self {
        self.file = path.map(Into::into);
        self
    }

    pub fn profile(mut self, profile: Option<impl Into<String>>) -> Self {
        self.profile = profile.map(Into::into);
        self
    }

    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Locate, read and merge every source.
    ///
    /// # Errors
    ///
    /// `ConfigError::NotFound` if no file was given and none was discovered.
    pub fn load(&self) -> Result<LoadedConfig> {
        let source = match &self.file {
            Some(file) => {
                let path = if file.is_absolute() {
                    file.clone()
                } else {
                    self.root.join(file)
                };
                path.clean()
            }
            None => ConfigDiscovery::new(&self.root)
                .find()
                .ok_or_else(|| ConfigError::NotFound(self.root.clone()))?,
        };
        debug!(path = %source.display(), "Loading config");

        let mut value = ConfigDiscovery::read_value(&source)?;
        if let Some(profile) = &self.profile {
            apply_profile(&mut value, profile)?;
            debug!(profile = %profile, "Applied config profile");
        }

        let config = self.extract(value)?;
        let base_dir = source
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());

        Ok(LoadedConfig {
            config,
            source: Some(source),
            base_dir,
        })
    }

    /// Merge env and overrides over an in-memory config value.
    pub fn load_value(&self, mut value: Value) -> Result<LoadedConfig> {
        if let Some(profile) = &self.profile {
            apply_profile(&mut value, profile)?;
        }
        Ok(LoadedConfig {
            config: self.extract(value)?,
            source: None,
            base_dir: self.root.clone(),
        })
    }

    fn extract(&self, mut value: Value) -> Result<SkeinConfig> {
        let layered: Value = Figment::new()
            .merge(Env::prefixed(&self.env_prefix).split("__"))
            .merge(Serialized::defaults(&self.overrides))
            .extract()
            .map_err(|e| ConfigError::InvalidValue {
                field: "configuration".to_string(),
                hint: Some(e.to_string()),
            })?;

        merge_layer(&mut value, &layered);
        SkeinConfig::from_value(value)
    }
}

/// Merge an env/override layer. Environment keys arrive lowercased, so an
/// existing key is matched case-insensitively before a new one is added.
fn merge_layer(target: &mut Value, update: &Value) {
    match (target, update) {
        (Value::Object(target_map), Value::Object(update_map)) => {
            for (key, value) in update_map {
                let existing = target_map
                    .keys()
                    .find(|k| k.eq_ignore_ascii_case(key))
                    .cloned()
                    .unwrap_or_else(|| key.clone());
                merge_layer(target_map.entry(existing).or_insert(Value::Null), value);
            }
        }
        (target, update) => merge_values(target, update),
    }
}
