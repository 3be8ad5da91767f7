//! Entry/output mapping: naming, bundle rendering and writing.

pub mod container;
pub mod registry;
pub mod template;
pub mod writer;

pub use registry::AssetRegistry;
pub use template::FilenameTemplate;

use std::path::PathBuf;

/// What produced an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactKind {
    /// The bundle for the named entry
    Bundle { entry: String },
    /// A file emitted by a loader while transforming `source`
    Asset { source: PathBuf },
}

/// One file of build output, named relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub content: Vec<u8>,
    pub kind: ArtifactKind,
}

impl Artifact {
    pub fn bundle(entry: impl Into<String>, file_name: String, content: Vec<u8>) -> Self {
        Self {
            file_name,
            content,
            kind: ArtifactKind::Bundle {
                entry: entry.into(),
            },
        }
    }

    pub fn asset(file_name: String, content: Vec<u8>, source: PathBuf) -> Self {
        Self {
            file_name,
            content,
            kind: ArtifactKind::Asset { source },
        }
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }

    pub fn is_bundle(&self) -> bool {
        matches!(self.kind, ArtifactKind::Bundle { .. })
    }

    /// Human-readable producer, for diagnostics.
    pub fn origin(&self) -> String {
        match &self.kind {
            ArtifactKind::Bundle { entry } => format!("entry '{entry}'"),
            ArtifactKind::Asset { source } => format!("'{}'", source.display()),
        }
    }

    /// Entry name, for bundles.
    pub fn entry(&self) -> Option<&str> {
        match &self.kind {
            ArtifactKind::Bundle { entry } => Some(entry),
            ArtifactKind::Asset { .. } => None,
        }
    }
}
