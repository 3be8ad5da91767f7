//! # skein-config
//!
//! Declarative build configuration for skein: the serde model, file
//! discovery (`skein.toml`, `skein.json`, or a `"skein"` field in
//! `package.json`), layered loading through figment, profile merging and
//! schema validation.

pub mod config;
pub mod discovery;
pub mod error;
pub mod loading;
pub mod settings;
pub mod types;
pub mod validation;

pub use config::SkeinConfig;
pub use error::*;
pub use settings::GlobalSettings;
pub use types::*;

pub use discovery::ConfigDiscovery;
pub use loading::{ConfigLoader, ConfigOverrides, ENV_PREFIX, LoadedConfig};
pub use validation::validate;
