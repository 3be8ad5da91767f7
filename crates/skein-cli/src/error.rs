//! Error types for the skein CLI.
//!
//! Library errors are wrapped in [`CliError`] and turned into a
//! [`miette::Report`] in `main`. Errors that already carry a diagnostic keep
//! their code and help text.

use std::path::PathBuf;

use miette::Report;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// Config discovery, parsing or validation failed
    #[error(transparent)]
    Config(#[from] skein_config::ConfigError),

    /// Rule or loader chain could not be composed
    #[error(transparent)]
    Graph(#[from] skein_graph::Error),

    /// Bundling or writing failed
    #[error(transparent)]
    Build(#[from] skein_bundler::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// `skein check` found paths claimed by conflicting rules
    #[error("{count} path(s) are claimed by rules with different loader chains")]
    AmbiguousRules { count: usize },

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convert a [`CliError`] into a report for display.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Build(e) => Report::new(e),
        CliError::Config(e) => Report::new(skein_bundler::Error::Config(e)),
        CliError::Graph(e) => Report::new(skein_bundler::Error::Graph(e)),
        CliError::AmbiguousRules { count } => miette::miette!(
            code = "AMBIGUOUS_RULE",
            help = "Reorder the rules or tighten their `test`/`exclude` patterns; the first match always wins",
            "{count} path(s) are claimed by rules with different loader chains"
        ),
        other => miette::miette!("{other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Diagnostic;

    #[test]
    fn bundler_diagnostic_code_is_kept() {
        let err = CliError::Config(skein_config::ConfigError::NoEntries);
        let report = cli_error_to_miette(err);
        let code = report.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("INVALID_CONFIG"));
    }

    #[test]
    fn plain_errors_keep_message() {
        let report = cli_error_to_miette(CliError::FileNotFound(PathBuf::from("/nope")));
        assert!(report.to_string().contains("/nope"));
    }
}
