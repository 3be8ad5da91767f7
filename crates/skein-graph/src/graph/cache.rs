//! The build's visited-set.

use std::path::{Path, PathBuf};

use dashmap::DashSet;

/// Concurrent set of canonical paths already handed to a worker.
///
/// A path is claimed exactly once: the caller whose [`claim`](Self::claim)
/// returns `true` owns its read and transform. Finished nodes are collected
/// by the resolver as tasks join, not stored here.
#[derive(Debug, Default)]
pub struct ModuleCache {
    claimed: DashSet<PathBuf>,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claim `path`. Returns `false` if it was already claimed.
    pub fn claim(&self, path: &Path) -> bool {
        self.claimed.insert(path.to_path_buf())
    }

    /// Number of claimed paths, finished or not.
    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}
