//! Native filesystem runtime.

use async_trait::async_trait;
use path_clean::PathClean;
use std::path::{Path, PathBuf};

use super::{FileMetadata, Runtime, RuntimeError, RuntimeResult};

/// Runtime backed by the host filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeRuntime;

fn map_io(path: &Path, err: std::io::Error) -> RuntimeError {
    if err.kind() == std::io::ErrorKind::NotFound {
        RuntimeError::FileNotFound(path.to_path_buf())
    } else {
        RuntimeError::Io(format!("{}: {}", path.display(), err))
    }
}

#[async_trait]
impl Runtime for NativeRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        tokio::fs::read(path).await.map_err(|e| map_io(path, e))
    }

    async fn metadata(&self, path: &Path) -> RuntimeResult<FileMetadata> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| map_io(path, e))?;

        Ok(FileMetadata {
            size: metadata.len(),
            is_dir: metadata.is_dir(),
            is_file: metadata.is_file(),
        })
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn canonicalize(&self, path: &Path) -> RuntimeResult<PathBuf> {
        let cleaned = path.clean();
        // Paths that don't exist yet keep their lexical form
        match cleaned.canonicalize() {
            Ok(canonical) => Ok(canonical),
            Err(_) => Ok(cleaned),
        }
    }

    fn get_cwd(&self) -> RuntimeResult<PathBuf> {
        std::env::current_dir().map_err(|e| RuntimeError::Io(e.to_string()))
    }
}
