//! Command-line interface definitions.

mod commands;

pub use commands::*;

use clap::Parser;

/// Skein - rule-driven asset bundler.
///
/// Routes every module through the loader chain of the first rule that
/// matches it, follows its dependencies, and writes one bundle per entry.
#[derive(Parser, Debug)]
#[command(name = "skein")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only show errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}
