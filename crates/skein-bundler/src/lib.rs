//! # skein-bundler
//!
//! Turns a resolved module graph into deployable artifacts: one bundle per
//! entry plus any files loaders emitted along the way.
//!
//! This crate owns the built-in loaders (`raw`, `file`, `css`, `style`, and
//! external commands declared in config), the entry/output mapper, and the
//! atomic artifact writer. Graph resolution itself lives in `skein-graph`.
//!
//! ```no_run
//! use skein_bundler::Bundler;
//! use skein_config::ConfigLoader;
//!
//! # async fn run() -> skein_bundler::Result<()> {
//! let loaded = ConfigLoader::new(".").load()?;
//! let output = Bundler::from_config(&loaded)?.build().await?;
//! for artifact in &output.artifacts {
//!     println!("{} ({} bytes)", artifact.file_name, artifact.size());
//! }
//! # Ok(())
//! # }
//! ```

pub mod build;
pub mod loaders;
pub mod output;

#[cfg(feature = "logging")]
pub mod logging;

pub use build::{BuildOutput, Bundler};
pub use output::{Artifact, ArtifactKind, AssetRegistry, FilenameTemplate};

// Re-export the graph layer for consumers that only depend on the bundler
pub use skein_graph;

/// Error type for skein-bundler operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] skein_config::ConfigError),

    /// Rule, loader or graph resolution failure.
    #[error(transparent)]
    Graph(#[from] skein_graph::Error),

    /// Output filename template names an unknown placeholder.
    #[error("Invalid filename template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    /// Two different files were mapped to the same output name.
    #[error("Conflicting output '{name}': produced by {first} and {second} with different contents")]
    ConflictingAsset {
        name: String,
        first: String,
        second: String,
    },

    /// Invalid output path (e.g., directory traversal attempt).
    #[error("Invalid output path: {0}")]
    InvalidOutputPath(String),

    /// File write operation failed.
    #[error("Write failure: {0}")]
    WriteFailure(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for skein-bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        use skein_graph::Error as G;

        Some(Box::new(match self {
            Error::Config(_) => "INVALID_CONFIG",
            Error::Graph(inner) => match inner {
                G::Unresolved(_) => "UNRESOLVED_SPECIFIER",
                G::UnknownLoader { .. } => "UNKNOWN_LOADER",
                G::TransformFailed { .. } => "TRANSFORM_FAILED",
                G::InvalidPattern { .. } | G::InvalidLoaderSpec { .. } => "MALFORMED_RULE",
                G::Ambiguous(_) => "AMBIGUOUS_RULE",
                G::NonUtf8Module { .. } => "NON_UTF8_MODULE",
                G::ReadFile { .. } | G::Runtime(_) => "READ_FAILURE",
                G::TooManyModules { .. } | G::FileTooLarge { .. } => "LIMIT_EXCEEDED",
                G::TaskFailed(_) => "TASK_FAILED",
            },
            Error::InvalidTemplate { .. } => "INVALID_TEMPLATE",
            Error::ConflictingAsset { .. } => "CONFLICTING_ASSET",
            Error::InvalidOutputPath(_) => "INVALID_OUTPUT_PATH",
            Error::WriteFailure(_) => "WRITE_FAILURE",
            Error::Io(_) => "IO_ERROR",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        use skein_graph::Error as G;

        match self {
            Error::Config(_) => Some(Box::new(
                "Check skein.toml (or skein.json / package.json \"skein\") for syntax errors and field types.",
            )),
            Error::Graph(G::Unresolved(e)) => Some(Box::new(format!(
                "'{}' was imported from '{}'. Check that the file exists, or add its extension to resolve.extensions.",
                e.specifier,
                e.from.display()
            ))),
            Error::Graph(G::UnknownLoader { loader, .. }) => Some(Box::new(format!(
                "No loader named '{loader}' is registered. Built-in loaders are raw, file, css and style; declare others under [loaders.{loader}] with a command."
            ))),
            Error::Graph(G::TransformFailed { loader, .. }) => Some(Box::new(format!(
                "The '{loader}' stage rejected its input. Its message is shown above."
            ))),
            Error::Graph(G::InvalidPattern { .. } | G::InvalidLoaderSpec { .. }) => Some(Box::new(
                "Rule patterns are regular expressions; loader strings look like \"name\" or \"name?key=value\".",
            )),
            Error::Graph(G::NonUtf8Module { .. }) => Some(Box::new(
                "Binary files need a rule (for example the file loader) that turns them into a text module.",
            )),
            Error::InvalidTemplate { .. } => Some(Box::new(
                "Supported placeholders are [name] and [contenthash].",
            )),
            Error::ConflictingAsset { name, .. } => Some(Box::new(format!(
                "Give one of the files a distinct name template so '{name}' is produced only once."
            ))),
            Error::InvalidOutputPath(path) => Some(Box::new(format!(
                "The output path '{path}' is invalid. Ensure it stays within the output directory and doesn't contain '..' components."
            ))),
            Error::WriteFailure(msg) => Some(Box::new(format!(
                "Failed to write file. Check disk space and permissions.\nError: {msg}"
            ))),
            _ => None,
        }
    }
}
