//! Output name registry.
//!
//! Collects every artifact of a build keyed by output file name so two
//! producers can never silently overwrite each other.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::Artifact;
use crate::{Error, Result};

/// Thread-safe registry of build artifacts.
///
/// A name registered twice with identical contents is kept once; different
/// contents under one name is [`Error::ConflictingAsset`].
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    inner: Arc<RwLock<AssetRegistryInner>>,
}

#[derive(Debug, Default)]
struct AssetRegistryInner {
    /// Artifacts in registration order
    artifacts: Vec<Artifact>,

    /// Output name → index into `artifacts`
    by_name: FxHashMap<String, usize>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an artifact. Returns `false` when an identical artifact was
    /// already registered under the same name.
    pub fn insert(&self, artifact: Artifact) -> Result<bool> {
        let mut inner = self.inner.write();

        if let Some(&index) = inner.by_name.get(&artifact.file_name) {
            let existing = &inner.artifacts[index];
            if existing.content == artifact.content {
                return Ok(false);
            }
            let second = artifact.origin();
            return Err(Error::ConflictingAsset {
                name: artifact.file_name,
                first: existing.origin(),
                second,
            });
        }

        let index = inner.artifacts.len();
        inner.by_name.insert(artifact.file_name.clone(), index);
        inner.artifacts.push(artifact);
        Ok(true)
    }

    pub fn get(&self, file_name: &str) -> Option<Artifact> {
        let inner = self.inner.read();
        let index = *inner.by_name.get(file_name)?;
        inner.artifacts.get(index).cloned()
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.inner.read().by_name.contains_key(file_name)
    }

    /// All artifacts in registration order.
    pub fn artifacts(&self) -> Vec<Artifact> {
        self.inner.read().artifacts.clone()
    }

    /// Take every artifact, leaving the registry empty.
    pub fn drain(&self) -> Vec<Artifact> {
        let mut inner = self.inner.write();
        inner.by_name.clear();
        std::mem::take(&mut inner.artifacts)
    }

    pub fn len(&self) -> usize {
        self.inner.read().artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().artifacts.is_empty()
    }
}
