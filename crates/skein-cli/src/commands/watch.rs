//! `skein build --watch`: rebuild when the build context changes.
//!
//! The whole context is watched recursively. Events under the output
//! directory, `node_modules` or hidden directories are dropped so that
//! writing a build never triggers another one. The config file is watched
//! too, even when it lives outside the context.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use skein_bundler::Bundler;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::cli::BuildArgs;
use crate::commands::build::{build_once, load_config};
use crate::error::{CliError, Result, cli_error_to_miette};
use crate::ui;

/// Quiet period that must pass after the last change before rebuilding.
pub const DEBOUNCE: Duration = Duration::from_millis(150);

/// Directory names never worth rebuilding for.
const IGNORED_DIRS: &[&str] = &["node_modules"];

/// Recursive watcher that forwards relevant changed paths over a channel.
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    root: PathBuf,
    files: Arc<RwLock<Vec<PathBuf>>>,
}

impl FileWatcher {
    /// Watch `root`, skipping anything under one of `ignore`.
    ///
    /// # Errors
    ///
    /// [`CliError::FileNotFound`] if `root` does not exist, or the notify
    /// error if the platform watcher could not be set up.
    pub fn new(root: PathBuf, ignore: Vec<PathBuf>) -> Result<(Self, mpsc::Receiver<PathBuf>)> {
        if !root.exists() {
            return Err(CliError::FileNotFound(root));
        }

        let (tx, rx) = mpsc::channel(256);
        let filter_root = root.clone();
        let files: Arc<RwLock<Vec<PathBuf>>> = Arc::default();
        let watched_files = Arc::clone(&files);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    debug!(error = %e, "Watcher error");
                    return;
                }
            };
            if !matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            ) {
                return;
            }
            for path in event.paths {
                let watched_file = watched_files.read().contains(&path);
                if !watched_file && Self::should_ignore(&path, &filter_root, &ignore) {
                    trace!(path = %path.display(), "Ignoring change");
                    continue;
                }
                // A full channel already guarantees a pending rebuild
                let _ = tx.try_send(path);
            }
        })?;

        watcher.watch(&root, RecursiveMode::Recursive)?;

        Ok((
            Self {
                watcher,
                root,
                files,
            },
            rx,
        ))
    }

    /// Also report changes to `file`, wherever it lives.
    ///
    /// The parent directory is watched rather than the file itself, so
    /// editors that save by renaming over the file are still seen.
    pub fn watch_file(&mut self, file: &Path) -> Result<()> {
        let file = file.canonicalize().unwrap_or_else(|_| file.to_path_buf());
        let root = self.root.canonicalize().unwrap_or_else(|_| self.root.clone());
        if let Some(parent) = file.parent().filter(|dir| !dir.starts_with(&root)) {
            self.watcher.watch(parent, RecursiveMode::NonRecursive)?;
        }
        self.files.write().push(file);
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn should_ignore(path: &Path, root: &Path, ignore: &[PathBuf]) -> bool {
        let Ok(relative) = path.strip_prefix(root) else {
            return true;
        };
        if ignore.iter().any(|dir| path.starts_with(dir)) {
            return true;
        }

        relative.components().any(|component| {
            let name = component.as_os_str().to_string_lossy();
            (name.starts_with('.') && name != "." && name != "..")
                || IGNORED_DIRS.contains(&name.as_ref())
        })
    }
}

/// Wait until no change has arrived for `quiet`, returning how many
/// further changes were absorbed.
pub(crate) async fn settle(rx: &mut mpsc::Receiver<PathBuf>, quiet: Duration) -> usize {
    let mut absorbed = 0;
    while let Ok(Some(_)) = tokio::time::timeout(quiet, rx.recv()).await {
        absorbed += 1;
    }
    absorbed
}

/// Build, then rebuild on every settled batch of changes until Ctrl+C.
///
/// Build failures are reported and watching continues. The config is
/// reloaded before every rebuild.
pub async fn run(args: BuildArgs) -> Result<()> {
    let loaded = load_config(&args)?;
    let bundler = Bundler::from_config(&loaded)?;
    report(build_once(&bundler).await.map(drop));

    let context = bundler.context().to_path_buf();
    let out_dir = bundler.output_dir().to_path_buf();
    let ignore = vec![out_dir.canonicalize().unwrap_or_else(|_| out_dir.clone()), out_dir];
    let (mut watcher, mut changes) = FileWatcher::new(context, ignore)?;
    if let Some(source) = &loaded.source {
        watcher.watch_file(source)?;
    }
    ui::info(&format!(
        "Watching {} for changes (Ctrl+C to stop)",
        watcher.root().display()
    ));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                ui::info("Stopped watching");
                return Ok(());
            }
            change = changes.recv() => {
                let Some(path) = change else {
                    return Ok(());
                };
                let absorbed = settle(&mut changes, DEBOUNCE).await;
                debug!(path = %path.display(), absorbed, "Change detected");

                let shown = path
                    .strip_prefix(watcher.root())
                    .or_else(|_| path.strip_prefix(&loaded.base_dir))
                    .unwrap_or(path.as_path());
                ui::info(&format!("{} changed, rebuilding", shown.display()));
                report(rebuild(&args).await);
            }
        }
    }
}

async fn rebuild(args: &BuildArgs) -> Result<()> {
    let loaded = load_config(args)?;
    let bundler = Bundler::from_config(&loaded)?;
    build_once(&bundler).await?;
    Ok(())
}

fn report(result: Result<()>) {
    if let Err(e) = result {
        ui::error("Build failed");
        eprintln!("{:?}", cli_error_to_miette(e));
    }
}
