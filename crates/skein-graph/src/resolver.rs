//! Specifier resolution.
//!
//! Turns an import specifier into the canonical path of a file:
//!
//! - `./x` and `../x` are relative to the importing module's directory
//! - `/x` is absolute
//! - anything else is a bare package specifier searched in the module
//!   directories (`node_modules` by default), walking up from the importer
//!
//! Every candidate is tried as an exact file, then with each configured
//! extension appended, then as a directory (its `package.json` `main` field,
//! then `index` with each extension).

use std::path::{Path, PathBuf};

use path_clean::PathClean;
use tracing::trace;

use crate::runtime::Runtime;

/// Default extensions tried when a specifier names no existing file.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".js", ".json"];

/// Default directories searched for bare specifiers.
pub const DEFAULT_MODULE_DIRS: &[&str] = &["node_modules"];

/// A specifier that names no file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Cannot resolve '{specifier}' from '{}'", .base_dir.display())]
pub struct ResolveError {
    pub specifier: String,
    /// Directory the search started from
    pub base_dir: PathBuf,
}

/// Node-style module resolver.
#[derive(Debug, Clone)]
pub struct ModuleResolver {
    extensions: Vec<String>,
    module_dirs: Vec<String>,
}

impl Default for ModuleResolver {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            module_dirs: DEFAULT_MODULE_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ModuleResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extensions in priority order. A missing leading dot is added.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|ext| {
                let ext = ext.into();
                if ext.is_empty() || ext.starts_with('.') {
                    ext
                } else {
                    format!(".{ext}")
                }
            })
            .collect();
        self
    }

    pub fn with_module_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.module_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn module_dirs(&self) -> &[String] {
        &self.module_dirs
    }

    /// Resolve `specifier` as imported from a module in `base_dir`.
    ///
    /// The returned path is canonical: absolute, cleaned, and with symlinks
    /// resolved when the runtime supports it.
    pub async fn resolve(
        &self,
        specifier: &str,
        base_dir: &Path,
        runtime: &dyn Runtime,
    ) -> Result<PathBuf, ResolveError> {
        let found = if is_path_specifier(specifier) {
            self.resolve_file_or_dir(&base_dir.join(specifier).clean(), runtime)
                .await
        } else {
            self.resolve_bare(specifier, base_dir, runtime).await
        };

        let Some(path) = found else {
            return Err(ResolveError {
                specifier: specifier.to_string(),
                base_dir: base_dir.to_path_buf(),
            });
        };

        trace!(specifier, resolved = %path.display(), "Resolved specifier");
        Ok(runtime.canonicalize(&path).unwrap_or(path))
    }

    async fn resolve_bare(
        &self,
        specifier: &str,
        base_dir: &Path,
        runtime: &dyn Runtime,
    ) -> Option<PathBuf> {
        for dir in base_dir.ancestors() {
            for module_dir in &self.module_dirs {
                let root = dir.join(module_dir);
                if !runtime.exists(&root) {
                    continue;
                }
                let candidate = root.join(specifier).clean();
                if let Some(found) = self.resolve_file_or_dir(&candidate, runtime).await {
                    return Some(found);
                }
            }
        }
        None
    }

    async fn resolve_file_or_dir(&self, candidate: &Path, runtime: &dyn Runtime) -> Option<PathBuf> {
        if let Some(found) = self.try_extensions(candidate, runtime).await {
            return Some(found);
        }
        self.try_directory(candidate, runtime).await
    }

    async fn try_extensions(&self, candidate: &Path, runtime: &dyn Runtime) -> Option<PathBuf> {
        if is_file(candidate, runtime).await {
            return Some(candidate.to_path_buf());
        }

        for ext in &self.extensions {
            let mut with_ext = candidate.as_os_str().to_owned();
            with_ext.push(ext);
            let with_ext = PathBuf::from(with_ext);
            if is_file(&with_ext, runtime).await {
                return Some(with_ext);
            }
        }

        None
    }

    async fn try_directory(&self, dir: &Path, runtime: &dyn Runtime) -> Option<PathBuf> {
        let Ok(metadata) = runtime.metadata(dir).await else {
            return None;
        };
        if !metadata.is_dir {
            return None;
        }

        if let Some(main) = package_main(dir, runtime).await {
            let main = dir.join(main).clean();
            if let Some(found) = self.try_extensions(&main, runtime).await {
                return Some(found);
            }
            if let Some(found) = self.try_index(&main, runtime).await {
                return Some(found);
            }
        }

        self.try_index(dir, runtime).await
    }

    async fn try_index(&self, dir: &Path, runtime: &dyn Runtime) -> Option<PathBuf> {
        for ext in &self.extensions {
            let index = dir.join(format!("index{ext}"));
            if is_file(&index, runtime).await {
                return Some(index);
            }
        }
        None
    }
}

fn is_path_specifier(specifier: &str) -> bool {
    specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier == "."
        || specifier == ".."
        || Path::new(specifier).is_absolute()
}

async fn is_file(path: &Path, runtime: &dyn Runtime) -> bool {
    if !runtime.exists(path) {
        return false;
    }
    matches!(runtime.metadata(path).await, Ok(meta) if meta.is_file)
}

/// The `main` field of `dir/package.json`, if present.
async fn package_main(dir: &Path, runtime: &dyn Runtime) -> Option<String> {
    let manifest = dir.join("package.json");
    if !runtime.exists(&manifest) {
        return None;
    }
    let bytes = runtime.read_file(&manifest).await.ok()?;
    let json: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    json.get("main")?.as_str().map(str::to_string)
}
