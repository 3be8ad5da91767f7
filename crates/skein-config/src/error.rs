//! Error types for configuration loading and validation.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no skein config found in {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read config '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config '{}': {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid config value '{field}'{}", .hint.as_ref().map(|h| format!(": {h}")).unwrap_or_default())]
    InvalidValue { field: String, hint: Option<String> },

    #[error("unknown profile '{name}' (available: {})", .available.join(", "))]
    UnknownProfile { name: String, available: Vec<String> },

    #[error("invalid profile override: {message}")]
    InvalidProfileOverride { message: String },

    #[error("no entries specified")]
    NoEntries,

    #[error("invalid rule #{index}: {message}")]
    InvalidRule { index: usize, message: String },

    #[error("invalid loader definition '{name}': {message}")]
    InvalidLoader { name: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
