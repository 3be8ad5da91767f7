//! Schema validation (no filesystem checks).

use crate::config::SkeinConfig;
use crate::error::{ConfigError, Result};

/// Check a config for structural problems before a build starts.
///
/// Patterns and loader strings are compiled here so a malformed rule is
/// reported before any file is read.
///
/// # Example
///
/// ```
/// use skein_config::{SkeinConfig, validate};
/// use serde_json::json;
///
/// let config = SkeinConfig::from_value(json!({
///     "entry": { "main": "./src/index.js" },
///     "module": { "rules": [{ "test": "\\.html$", "use": "file-loader?name=[name].[ext]" }] }
/// }))
/// .unwrap();
/// validate(&config).unwrap();
/// ```
pub fn validate(config: &SkeinConfig) -> Result<()> {
    if config.entry.is_empty() {
        return Err(ConfigError::NoEntries);
    }

    for (name, specifiers) in &config.entry {
        if name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "entry".to_string(),
                hint: Some("entry names cannot be empty".to_string()),
            });
        }
        if specifiers.is_empty() || specifiers.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: format!("entry.{name}"),
                hint: Some("each entry needs at least one non-empty specifier".to_string()),
            });
        }
    }

    if config.output.filename.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "output.filename".to_string(),
            hint: Some("use a template such as \"[name].js\"".to_string()),
        });
    }

    config.module.rule_set()?;
    config.module.no_parse_set()?;

    for (name, loader) in &config.loaders {
        if loader.command.trim().is_empty() {
            return Err(ConfigError::InvalidLoader {
                name: name.clone(),
                message: "command cannot be empty".to_string(),
            });
        }
    }

    if config.settings.parallel_jobs == Some(0) {
        return Err(ConfigError::InvalidValue {
            field: "settings.parallelJobs".to_string(),
            hint: Some("must be at least 1".to_string()),
        });
    }

    Ok(())
}
