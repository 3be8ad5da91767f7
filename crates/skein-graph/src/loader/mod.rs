//! Loader contract.
//!
//! A loader is an opaque transform `content → content`. Skein never looks
//! inside a loader: stylesheet compilers, compiled-language toolchains and
//! module wrappers all plug in through the same [`Loader`] trait and are
//! bound to rules by identifier via a [`LoaderRegistry`].

mod chain;
mod spec;

pub use chain::{BoundStage, LoaderChain};
pub use spec::{LoaderOptions, LoaderSpec};

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Build mode. Affects optimisation only, never which modules are included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Development,
    Production,
}

impl Mode {
    pub fn is_production(self) -> bool {
        matches!(self, Mode::Production)
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Mode::Development),
            "production" | "prod" => Ok(Mode::Production),
            other => Err(format!("Invalid mode: {}", other)),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Development => write!(f, "development"),
            Mode::Production => write!(f, "production"),
        }
    }
}

/// Error returned by a loader stage.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct LoaderError {
    pub message: String,
}

impl LoaderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for LoaderError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// A file produced by a loader as a side output, such as a copied template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedAsset {
    /// Output file name relative to the output directory
    pub file_name: String,
    pub content: Vec<u8>,
    /// Module whose transform emitted the asset
    pub source: PathBuf,
}

/// Per-stage view of the module being transformed.
pub struct LoaderContext<'a> {
    /// Canonical path of the module
    pub resource: &'a Path,
    /// Build context directory (the base for module ids)
    pub context: &'a Path,
    pub mode: Mode,
    /// Identifier the stage was declared with
    pub identifier: &'a str,
    /// Options attached to this stage
    pub options: &'a LoaderOptions,
    emitted: &'a Mutex<Vec<EmittedAsset>>,
}

impl<'a> LoaderContext<'a> {
    pub fn new(
        resource: &'a Path,
        context: &'a Path,
        mode: Mode,
        identifier: &'a str,
        options: &'a LoaderOptions,
        emitted: &'a Mutex<Vec<EmittedAsset>>,
    ) -> Self {
        Self {
            resource,
            context,
            mode,
            identifier,
            options,
            emitted,
        }
    }

    /// Emit an extra output file alongside the bundle.
    pub fn emit_file(&self, file_name: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.emitted.lock().push(EmittedAsset {
            file_name: file_name.into(),
            content: content.into(),
            source: self.resource.to_path_buf(),
        });
    }

    /// String option lookup.
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(|v| v.as_str())
    }

    /// Path of the resource relative to the build context.
    pub fn relative_resource(&self) -> &Path {
        self.resource
            .strip_prefix(self.context)
            .unwrap_or(self.resource)
    }
}

/// A pluggable content transform.
#[async_trait]
pub trait Loader: Send + Sync + fmt::Debug {
    /// Transform `content` and return the next stage's input.
    async fn transform(
        &self,
        content: Vec<u8>,
        ctx: &LoaderContext<'_>,
    ) -> Result<Vec<u8>, LoaderError>;
}

/// Loaders available to rules, keyed by identifier.
///
/// Lookups ignore a trailing `-loader` so `file-loader` and `file` name the
/// same registration.
#[derive(Debug, Clone, Default)]
pub struct LoaderRegistry {
    loaders: FxHashMap<String, Arc<dyn Loader>>,
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a loader. A later registration under the same key replaces
    /// the earlier one.
    pub fn register(&mut self, identifier: impl AsRef<str>, loader: Arc<dyn Loader>) {
        let key = spec::loader_key(identifier.as_ref()).to_string();
        self.loaders.insert(key, loader);
    }

    pub fn with(mut self, identifier: impl AsRef<str>, loader: Arc<dyn Loader>) -> Self {
        self.register(identifier, loader);
        self
    }

    pub fn get(&self, identifier: &str) -> Option<Arc<dyn Loader>> {
        self.loaders.get(spec::loader_key(identifier)).cloned()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.loaders.contains_key(spec::loader_key(identifier))
    }

    /// Registered keys, sorted.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.loaders.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Identity;

    #[async_trait]
    impl Loader for Identity {
        async fn transform(
            &self,
            content: Vec<u8>,
            _ctx: &LoaderContext<'_>,
        ) -> Result<Vec<u8>, LoaderError> {
            Ok(content)
        }
    }

    #[test]
    fn registry_ignores_loader_suffix() {
        let registry = LoaderRegistry::new().with("file-loader", Arc::new(Identity));
        assert!(registry.contains("file"));
        assert!(registry.contains("file-loader"));
        assert!(!registry.contains("css"));
        assert_eq!(registry.identifiers(), vec!["file"]);
    }

    #[test]
    fn mode_parsing() {
        assert_eq!("production".parse::<Mode>().unwrap(), Mode::Production);
        assert_eq!("DEV".parse::<Mode>().unwrap(), Mode::Development);
        assert!("fast".parse::<Mode>().is_err());
        assert_eq!(Mode::default(), Mode::Development);
    }

    #[test]
    fn context_emits_assets() {
        let emitted = Mutex::new(Vec::new());
        let options = LoaderOptions::new();
        let ctx = LoaderContext::new(
            Path::new("/app/src/index.html"),
            Path::new("/app"),
            Mode::Development,
            "file",
            &options,
            &emitted,
        );

        ctx.emit_file("index.html", b"<html>".to_vec());
        assert_eq!(ctx.relative_resource(), Path::new("src/index.html"));

        let assets = emitted.into_inner();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].file_name, "index.html");
        assert_eq!(assets[0].source, PathBuf::from("/app/src/index.html"));
    }
}
