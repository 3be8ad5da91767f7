//! Module graph resolution.
//!
//! [`GraphResolver`] walks the dependency graph from every entry, fanning out
//! one task per newly discovered module. The shared [`ModuleCache`] is the
//! only mutable state; workers claim canonical paths through it so each file
//! is read and transformed at most once per build. Once every task has
//! finished, per-entry closures are computed by a depth-first walk that does
//! not depend on worker scheduling.

mod cache;
mod walk;

pub use cache::ModuleCache;
pub use walk::{GraphLimits, GraphOptions, GraphResolver};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::loader::EmittedAsset;

/// A named entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    /// Root specifiers, resolved against the build context in order.
    pub specifiers: Vec<String>,
}

impl Entry {
    pub fn new<I, S>(name: impl Into<String>, specifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            specifiers: specifiers.into_iter().map(Into::into).collect(),
        }
    }
}

/// A resolved, transformed module.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleNode {
    /// Canonical path; unique within a build
    pub path: PathBuf,
    /// Path relative to the build context, with forward slashes
    pub id: String,
    /// Output of the module's loader chain
    pub body: String,
    /// Import specifiers found in `body`, first-appearance order
    pub specifiers: Vec<String>,
    /// `specifier → canonical path`, in `specifiers` order
    pub dependencies: Vec<(String, PathBuf)>,
    /// Files emitted by loaders while transforming this module
    pub assets: Vec<EmittedAsset>,
    /// Index of the governing rule; `None` for raw assets
    pub rule: Option<usize>,
    /// Matched the no-parse set and was not scanned
    pub opaque: bool,
}

impl ModuleNode {
    pub fn new(path: PathBuf, id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            path,
            id: id.into(),
            body: body.into(),
            specifiers: Vec::new(),
            dependencies: Vec::new(),
            assets: Vec::new(),
            rule: None,
            opaque: false,
        }
    }

    /// Canonical path a specifier of this module resolved to.
    pub fn dependency(&self, specifier: &str) -> Option<&Path> {
        self.dependencies
            .iter()
            .find(|(s, _)| s == specifier)
            .map(|(_, path)| path.as_path())
    }
}

/// A specifier that resolved to no file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "Cannot resolve '{specifier}' from '{}' (entry '{entry}': {})",
    .from.display(),
    .chain.join(" -> ")
)]
pub struct UnresolvedSpecifierError {
    pub entry: String,
    /// Specifiers followed from the entry, ending with the unresolved one
    pub chain: Vec<String>,
    pub specifier: String,
    /// Module (or context directory, for entry roots) that named it
    pub from: PathBuf,
}

/// Transitive closure of one entry.
#[derive(Debug, Clone)]
pub struct EntryClosure {
    pub name: String,
    /// Canonical paths of the entry's root specifiers, in declaration order
    pub roots: Vec<PathBuf>,
    modules: Vec<Arc<ModuleNode>>,
}

impl EntryClosure {
    /// Modules in depth-first pre-order; each appears once.
    pub fn modules(&self) -> &[Arc<ModuleNode>] {
        &self.modules
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.modules.iter().any(|m| m.path == path)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Result of resolving every entry.
#[derive(Debug, Clone, Default)]
pub struct ResolvedGraph {
    modules: FxHashMap<PathBuf, Arc<ModuleNode>>,
    entries: Vec<EntryClosure>,
}

impl ResolvedGraph {
    pub(crate) fn new(
        modules: impl IntoIterator<Item = Arc<ModuleNode>>,
        roots: Vec<(String, Vec<PathBuf>)>,
    ) -> Self {
        let modules: FxHashMap<PathBuf, Arc<ModuleNode>> = modules
            .into_iter()
            .map(|node| (node.path.clone(), node))
            .collect();

        let entries = roots
            .into_iter()
            .map(|(name, roots)| {
                let closure = closure(&modules, &roots);
                EntryClosure {
                    name,
                    roots,
                    modules: closure,
                }
            })
            .collect();

        Self { modules, entries }
    }

    /// Closures in entry declaration order.
    pub fn entries(&self) -> &[EntryClosure] {
        &self.entries
    }

    pub fn entry(&self, name: &str) -> Option<&EntryClosure> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn module(&self, path: &Path) -> Option<&Arc<ModuleNode>> {
        self.modules.get(path)
    }

    /// Every module, sorted by id.
    pub fn modules(&self) -> Vec<&Arc<ModuleNode>> {
        let mut modules: Vec<_> = self.modules.values().collect();
        modules.sort_by(|a, b| a.id.cmp(&b.id));
        modules
    }

    /// Every emitted asset, ordered by the id of the module that emitted it.
    pub fn assets(&self) -> Vec<&EmittedAsset> {
        self.modules()
            .into_iter()
            .flat_map(|m| m.assets.iter())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Depth-first pre-order from `roots`, following dependencies in specifier
/// order.
fn closure(
    modules: &FxHashMap<PathBuf, Arc<ModuleNode>>,
    roots: &[PathBuf],
) -> Vec<Arc<ModuleNode>> {
    let mut seen: FxHashSet<&Path> = FxHashSet::default();
    let mut order = Vec::new();
    let mut stack: Vec<&Path> = roots.iter().rev().map(PathBuf::as_path).collect();

    while let Some(path) = stack.pop() {
        if !seen.insert(path) {
            continue;
        }
        let Some(node) = modules.get(path) else {
            continue;
        };
        order.push(Arc::clone(node));
        stack.extend(node.dependencies.iter().rev().map(|(_, dep)| dep.as_path()));
    }

    order
}

/// Module id for `path`: relative to `context` when inside it.
pub(crate) fn module_id(path: &Path, context: &Path) -> String {
    let relative = path.strip_prefix(context).unwrap_or(path);
    crate::pattern::normalize(relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(path: &str, deps: &[&str]) -> Arc<ModuleNode> {
        let mut node = ModuleNode::new(PathBuf::from(path), path.trim_start_matches('/'), "");
        node.dependencies = deps
            .iter()
            .map(|d| (d.to_string(), PathBuf::from(d)))
            .collect();
        Arc::new(node)
    }

    #[test]
    fn closure_is_pre_order_and_handles_cycles() {
        let graph = ResolvedGraph::new(
            vec![
                node("/a", &["/b", "/c"]),
                node("/b", &["/a", "/d"]),
                node("/c", &["/d"]),
                node("/d", &[]),
            ],
            vec![("main".to_string(), vec![PathBuf::from("/a")])],
        );

        let ids: Vec<_> = graph.entry("main").unwrap().modules().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "d", "c"]);
    }

    #[test]
    fn shared_module_is_the_same_node() {
        let graph = ResolvedGraph::new(
            vec![node("/x", &["/s"]), node("/y", &["/s"]), node("/s", &[])],
            vec![
                ("one".to_string(), vec![PathBuf::from("/x")]),
                ("two".to_string(), vec![PathBuf::from("/y")]),
            ],
        );

        let one = &graph.entry("one").unwrap().modules()[1];
        let two = &graph.entry("two").unwrap().modules()[1];
        assert!(Arc::ptr_eq(one, two));
    }

    #[test]
    fn ids_are_context_relative() {
        assert_eq!(
            module_id(Path::new("/app/src/index.js"), Path::new("/app")),
            "src/index.js"
        );
        assert_eq!(
            module_id(Path::new("/other/x.js"), Path::new("/app")),
            "/other/x.js"
        );
    }

    #[test]
    fn unresolved_message_names_entry_and_chain() {
        let err = UnresolvedSpecifierError {
            entry: "main".to_string(),
            chain: vec!["./src/index.js".into(), "./Main.elm".into(), "./Missing".into()],
            specifier: "./Missing".to_string(),
            from: PathBuf::from("/app/src/Main.elm"),
        };
        let message = err.to_string();
        assert!(message.contains("entry 'main'"));
        assert!(message.contains("./src/index.js -> ./Main.elm -> ./Missing"));
    }
}
