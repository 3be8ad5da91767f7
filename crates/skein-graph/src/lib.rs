//! # skein-graph
//!
//! Rule matching, loader-chain composition and module graph resolution for
//! the skein asset pipeline.
//!
//! A build starts from named entries. Every discovered file is dispatched to
//! the first [`Rule`] that claims it, transformed by that rule's
//! [`LoaderChain`] (right to left), scanned for further import specifiers
//! unless it is opaque, and recorded exactly once in the module graph.
//!
//! ```no_run
//! use std::sync::Arc;
//! use skein_graph::{
//!     Entry, GraphOptions, GraphResolver, LoaderRegistry, NativeRuntime,
//! };
//!
//! # async fn run() -> skein_graph::Result<()> {
//! let options = GraphOptions::new("/path/to/project");
//! let resolver = GraphResolver::new(options, &LoaderRegistry::new(), Arc::new(NativeRuntime))?;
//!
//! let graph = resolver
//!     .resolve(&[Entry::new("main", ["./src/index.js"])])
//!     .await?;
//! for module in graph.entry("main").map(|e| e.modules()).unwrap_or_default() {
//!     println!("{}", module.id);
//! }
//! # Ok(())
//! # }
//! ```

pub mod graph;
pub mod loader;
pub mod pattern;
pub mod resolver;
pub mod rule;
pub mod runtime;
pub mod scan;

use std::path::PathBuf;

pub use graph::{
    Entry, EntryClosure, GraphLimits, GraphOptions, GraphResolver, ModuleNode, ResolvedGraph,
    UnresolvedSpecifierError,
};
pub use loader::{
    BoundStage, EmittedAsset, Loader, LoaderChain, LoaderContext, LoaderError, LoaderOptions,
    LoaderRegistry, LoaderSpec, Mode,
};
pub use pattern::{NoParseSet, Pattern, PatternSet};
pub use resolver::{ModuleResolver, ResolveError};
pub use rule::{AmbiguousRuleError, Rule, RuleMatch, RuleSet};
pub use runtime::native::NativeRuntime;
pub use runtime::{FileMetadata, Runtime, RuntimeError, RuntimeResult};
pub use scan::scan_specifiers;

#[cfg(any(test, feature = "test-utils"))]
pub use runtime::test_utils::TestRuntime;

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while composing chains or resolving the module graph.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid loader '{spec}': {reason}")]
    InvalidLoaderSpec { spec: String, reason: String },

    #[error("Rule #{rule} uses unknown loader '{loader}'")]
    UnknownLoader { rule: usize, loader: String },

    #[error(transparent)]
    Unresolved(#[from] UnresolvedSpecifierError),

    #[error("Loader '{loader}' failed on '{}': {message}", .path.display())]
    TransformFailed {
        path: PathBuf,
        loader: String,
        message: String,
    },

    #[error("Module '{}' is not valid UTF-8 after transformation", .path.display())]
    NonUtf8Module { path: PathBuf },

    #[error("Failed to read file '{}': {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: RuntimeError,
    },

    #[error("Too many modules processed: {count} modules (max: {max} allowed)")]
    TooManyModules { count: usize, max: usize },

    #[error("File too large: {} is {size} bytes (max: {max} bytes)", .path.display())]
    FileTooLarge { path: PathBuf, size: u64, max: u64 },

    #[error(transparent)]
    Ambiguous(#[from] AmbiguousRuleError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("Resolver task failed: {0}")]
    TaskFailed(String),
}
