//! Platform runtime abstraction for skein
//!
//! This module defines the `Runtime` trait that abstracts the filesystem
//! operations the resolver needs. The native implementation reads from disk;
//! the in-memory `TestRuntime` backs unit tests and embedders that build from
//! virtual sources.

pub mod native;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use async_trait::async_trait;
use path_clean::PathClean;
use std::path::{Path, PathBuf};

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during runtime operations
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// Other runtime error
    #[error("Runtime error: {0}")]
    Other(String),
}

/// File metadata
#[derive(Debug, Clone)]
pub struct FileMetadata {
    /// File size in bytes
    pub size: u64,
    /// Whether this is a directory
    pub is_dir: bool,
    /// Whether this is a file
    pub is_file: bool,
}

/// Platform runtime trait
///
/// The resolver only ever reads: artifacts are written by the bundler's
/// output writer once the whole graph has resolved.
#[async_trait]
pub trait Runtime: Send + Sync + std::fmt::Debug {
    /// Read a file from the filesystem
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>>;

    /// Get file metadata
    async fn metadata(&self, path: &Path) -> RuntimeResult<FileMetadata>;

    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Turn an absolute path into its canonical form.
    ///
    /// The default implementation is purely lexical. Runtimes backed by a
    /// real filesystem also resolve symlinks so two spellings of the same
    /// file share one canonical path.
    fn canonicalize(&self, path: &Path) -> RuntimeResult<PathBuf> {
        Ok(path.clean())
    }

    /// Get the current working directory
    fn get_cwd(&self) -> RuntimeResult<PathBuf>;
}
