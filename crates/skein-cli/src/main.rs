//! Skein CLI entry point.
//!
//! Parses arguments, installs logging, and dispatches to a command.

use clap::Parser;
use miette::Result;
use skein_cli::{cli, commands, error, logger, ui};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    let result = match args.command {
        cli::Command::Build(build_args) => commands::build_execute(build_args).await,
        cli::Command::Check(check_args) => commands::check_execute(check_args).await,
    };

    // Keep the bundler's diagnostic codes and help text in the report
    result.map_err(error::cli_error_to_miette)
}
