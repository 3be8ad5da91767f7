//! File-based config discovery for CLI use
//!
//! Handles finding and reading skein configuration files from the filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{ConfigError, Result};

/// Config file names, in search order. `package.json` is tried last.
pub const CONFIG_FILES: &[&str] = &["skein.toml", "skein.json"];

/// Field holding the config inside `package.json`.
pub const PACKAGE_JSON_FIELD: &str = "skein";

/// File-based configuration discovery
///
/// # Example
///
/// ```no_run
/// use skein_config::ConfigDiscovery;
///
/// let discovery = ConfigDiscovery::new(".");
/// if let Some(path) = discovery.find() {
///     let raw = ConfigDiscovery::read_value(&path).unwrap();
///     println!("{raw}");
/// }
/// ```
pub struct ConfigDiscovery {
    root: PathBuf,
}

impl ConfigDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Find a config file in the root directory
    ///
    /// Searches in this order:
    /// 1. `skein.toml`
    /// 2. `skein.json`
    /// 3. `package.json` with a non-null `skein` field
    pub fn find(&self) -> Option<PathBuf> {
        for name in CONFIG_FILES {
            let path = self.root.join(name);
            if path.is_file() {
                return Some(path);
            }
        }

        let pkg_path = self.root.join("package.json");
        let content = fs::read_to_string(&pkg_path).ok()?;
        let parsed = serde_json::from_str::<Value>(&content).ok()?;
        match parsed.get(PACKAGE_JSON_FIELD) {
            Some(field) if !field.is_null() => Some(pkg_path),
            _ => None,
        }
    }

    /// Read a config file into a JSON value, by file type.
    pub fn read_value(path: &Path) -> Result<Value> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let parse_error = |message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        };

        if path.file_name() == Some(std::ffi::OsStr::new("package.json")) {
            let parsed: Value =
                serde_json::from_str(&content).map_err(|e| parse_error(format!("Invalid JSON: {e}")))?;
            return match parsed.get(PACKAGE_JSON_FIELD) {
                Some(value) if value.is_object() => Ok(value.clone()),
                _ => Err(ConfigError::InvalidValue {
                    field: PACKAGE_JSON_FIELD.to_string(),
                    hint: Some("Add a 'skein' object to your package.json".to_string()),
                }),
            };
        }

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => {
                let toml_val: toml::Value = toml::from_str(&content)
                    .map_err(|e| parse_error(format!("Invalid TOML syntax: {e}")))?;
                serde_json::to_value(toml_val)
                    .map_err(|e| parse_error(format!("TOML to JSON conversion failed: {e}")))
            }
            Some("json") => {
                serde_json::from_str(&content).map_err(|e| parse_error(format!("Invalid JSON: {e}")))
            }
            other => Err(ConfigError::InvalidValue {
                field: "config".to_string(),
                hint: Some(format!(
                    "unsupported config format {}; use .toml or .json",
                    other.unwrap_or("(none)")
                )),
            }),
        }
    }
}
