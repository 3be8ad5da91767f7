use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use skein_graph::Mode;

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bundle every entry and write the artifacts
    ///
    /// Loads the nearest skein.toml, skein.json or package.json "skein"
    /// field, resolves each entry's dependency graph, and writes one bundle
    /// per entry plus every file the loaders emitted. Any failure aborts the
    /// build before anything is written.
    ///
    /// Examples:
    ///   skein build
    ///   skein build --mode production --profile release
    ///   skein build --out-dir public --clean
    ///   skein build --watch
    Build(BuildArgs),

    /// Validate the config and show how paths would be processed
    ///
    /// Checks every rule pattern and loader reference. For each PATH, prints
    /// the rule that governs it, its loaders in execution order, and whether
    /// it is exempt from dependency scanning. Exits non-zero if a path is
    /// claimed by rules with different loader chains.
    ///
    /// Examples:
    ///   skein check
    ///   skein check src/style.css src/Main.elm
    Check(CheckArgs),
}

/// Arguments for `skein build`.
#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Config file to use instead of searching the working directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory to search for the config file
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Build mode, overriding the config
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Output directory, overriding `output.path`
    #[arg(short = 'd', long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Named profile from the config's `profiles` table
    #[arg(short, long, value_name = "NAME")]
    pub profile: Option<String>,

    /// Empty the output directory before writing
    #[arg(long)]
    pub clean: bool,

    /// Rebuild whenever a file in the build context changes
    #[arg(short, long)]
    pub watch: bool,
}

/// Arguments for `skein check`.
#[derive(Args, Debug, Clone, Default)]
pub struct CheckArgs {
    /// Config file to use instead of searching the working directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory to search for the config file
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Named profile from the config's `profiles` table
    #[arg(short, long, value_name = "NAME")]
    pub profile: Option<String>,

    /// Paths to explain, relative to the build context
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,
}

/// Build mode as accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    #[value(alias = "dev")]
    Development,
    #[value(alias = "prod")]
    Production,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Development => Mode::Development,
            ModeArg::Production => Mode::Production,
        }
    }
}
