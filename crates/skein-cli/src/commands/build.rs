//! Build command implementation.

use std::path::{Path, PathBuf};

use path_clean::PathClean;
use skein_bundler::{BuildOutput, Bundler};
use skein_config::{ConfigLoader, ConfigOverrides, LoadedConfig};
use tracing::debug;

use crate::cli::BuildArgs;
use crate::commands::watch;
use crate::error::{CliError, Result};
use crate::{logger, ui};

/// Execute the build command.
///
/// With `--watch`, builds once and then keeps rebuilding on change until
/// interrupted.
///
/// # Errors
///
/// Any config, graph or write failure. Nothing is written unless every
/// entry bundled successfully.
pub async fn execute(args: BuildArgs) -> Result<()> {
    if args.watch {
        return watch::run(args).await;
    }

    let loaded = load_config(&args)?;
    let bundler = Bundler::from_config(&loaded)?;
    build_once(&bundler).await?;
    Ok(())
}

/// Load the config with CLI flags layered on top.
pub(crate) fn load_config(args: &BuildArgs) -> Result<LoadedConfig> {
    let root = project_root(args.cwd.as_deref())?;

    let mut overrides = ConfigOverrides::default();
    if let Some(mode) = args.mode {
        overrides = overrides.mode(mode.into());
    }
    if let Some(out_dir) = &args.out_dir {
        // Relative to where the command runs, not to the config file
        overrides = overrides.out_dir(root.join(out_dir).clean());
    }
    if args.clean {
        overrides = overrides.clean(true);
    }

    let loaded = ConfigLoader::new(&root)
        .file(args.config.clone())
        .profile(args.profile.clone())
        .overrides(overrides)
        .load()?;
    logger::apply_config_level(loaded.config.settings.log_level.as_deref());
    debug!(
        source = ?loaded.source,
        mode = %loaded.config.mode,
        "Loaded config"
    );
    Ok(loaded)
}

/// Directory the config is searched from.
pub(crate) fn project_root(cwd: Option<&Path>) -> Result<PathBuf> {
    let current = std::env::current_dir()?;
    match cwd {
        Some(dir) => {
            let dir = current.join(dir).clean();
            if !dir.is_dir() {
                return Err(CliError::FileNotFound(dir));
            }
            Ok(dir)
        }
        None => Ok(current),
    }
}

/// Run one build and print what was written.
pub(crate) async fn build_once(bundler: &Bundler) -> Result<BuildOutput> {
    let entries = bundler.entries().len();
    ui::info(&format!(
        "Building {entries} {} in {} mode",
        if entries == 1 { "entry" } else { "entries" },
        bundler.mode()
    ));

    let output = bundler.build().await?;

    let rows: Vec<_> = output
        .artifacts
        .iter()
        .map(|artifact| {
            (
                artifact.file_name.clone(),
                artifact.size() as u64,
                artifact.origin(),
            )
        })
        .collect();
    ui::print_build_summary(&rows, output.duration);
    ui::success(&format!(
        "Bundled {} modules into {}",
        output.graph.len(),
        output.output_dir.display()
    ));
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ModeArg;
    use skein_graph::Mode;
    use std::fs;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("skein.toml"),
            "[entry]\nmain = \"./index.js\"\n\n[output]\npath = \"dist\"\n",
        )
        .unwrap();
        fs::write(dir.path().join("index.js"), "module.exports = 1;\n").unwrap();
        dir
    }

    #[test]
    fn flags_override_config() {
        let dir = project();
        let args = BuildArgs {
            cwd: Some(dir.path().to_path_buf()),
            mode: Some(ModeArg::Production),
            out_dir: Some(PathBuf::from("public")),
            clean: true,
            ..Default::default()
        };

        let loaded = load_config(&args).unwrap();
        assert_eq!(loaded.config.mode, Mode::Production);
        assert!(loaded.config.clean);
        assert_eq!(loaded.output_dir(), dir.path().join("public"));
    }

    #[test]
    fn missing_cwd_is_reported() {
        let dir = TempDir::new().unwrap();
        let err = project_root(Some(&dir.path().join("nope"))).unwrap_err();
        assert!(matches!(err, CliError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn builds_into_output_dir() {
        let dir = project();
        let args = BuildArgs {
            cwd: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        execute(args).await.unwrap();

        let bundle = fs::read_to_string(dir.path().join("dist/main.js")).unwrap();
        assert!(bundle.contains("module.exports = 1;"));
    }
}
