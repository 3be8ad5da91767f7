//! In-memory runtime for tests and virtual builds.

use async_trait::async_trait;
use parking_lot::RwLock;
use path_clean::PathClean;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{FileMetadata, Runtime, RuntimeError, RuntimeResult};

/// Runtime that serves files from an in-memory map.
///
/// Directories are implied by the files beneath them. Every `read_file`
/// call is counted per path so tests can assert how often a module was
/// loaded.
#[derive(Debug, Clone)]
pub struct TestRuntime {
    cwd: PathBuf,
    files: Arc<RwLock<FxHashMap<PathBuf, Vec<u8>>>>,
    reads: Arc<RwLock<FxHashMap<PathBuf, usize>>>,
    total_reads: Arc<AtomicUsize>,
}

impl TestRuntime {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            files: Arc::default(),
            reads: Arc::default(),
            total_reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Add a file; relative paths are taken relative to the runtime's cwd.
    pub fn with_file(self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) -> Self {
        self.add_file(path, content);
        self
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = self.absolute(path.as_ref());
        self.files.write().insert(path, content.into());
    }

    /// Number of times `path` has been read.
    pub fn read_count(&self, path: impl AsRef<Path>) -> usize {
        let path = self.absolute(path.as_ref());
        self.reads.read().get(&path).copied().unwrap_or(0)
    }

    pub fn total_reads(&self) -> usize {
        self.total_reads.load(Ordering::SeqCst)
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.clean()
        } else {
            self.cwd.join(path).clean()
        }
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .read()
            .keys()
            .any(|file| file != path && file.starts_with(path))
    }
}

#[async_trait]
impl Runtime for TestRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        let path = self.absolute(path);
        self.total_reads.fetch_add(1, Ordering::SeqCst);
        *self.reads.write().entry(path.clone()).or_insert(0) += 1;

        self.files
            .read()
            .get(&path)
            .cloned()
            .ok_or(RuntimeError::FileNotFound(path))
    }

    async fn metadata(&self, path: &Path) -> RuntimeResult<FileMetadata> {
        let path = self.absolute(path);
        if let Some(content) = self.files.read().get(&path) {
            return Ok(FileMetadata {
                size: content.len() as u64,
                is_dir: false,
                is_file: true,
            });
        }

        if self.is_dir(&path) {
            return Ok(FileMetadata {
                size: 0,
                is_dir: true,
                is_file: false,
            });
        }

        Err(RuntimeError::FileNotFound(path))
    }

    fn exists(&self, path: &Path) -> bool {
        let path = self.absolute(path);
        self.files.read().contains_key(&path) || self.is_dir(&path)
    }

    fn get_cwd(&self) -> RuntimeResult<PathBuf> {
        Ok(self.cwd.clone())
    }
}
