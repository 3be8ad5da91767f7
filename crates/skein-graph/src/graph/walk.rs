//! Parallel graph walk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::cache::ModuleCache;
use super::{Entry, ModuleNode, ResolvedGraph, UnresolvedSpecifierError, module_id};
use crate::loader::{LoaderChain, LoaderRegistry, Mode};
use crate::pattern::NoParseSet;
use crate::resolver::ModuleResolver;
use crate::rule::RuleSet;
use crate::runtime::{Runtime, RuntimeError};
use crate::scan::scan_specifiers;
use crate::{Error, Result};

/// Maximum file size read as a module (10 MiB).
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default cap on modules per build.
pub const DEFAULT_MAX_MODULES: usize = 100_000;

/// Safety limits for a single build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphLimits {
    pub max_modules: usize,
    pub max_file_size: u64,
}

impl Default for GraphLimits {
    fn default() -> Self {
        Self {
            max_modules: DEFAULT_MAX_MODULES,
            max_file_size: MAX_FILE_SIZE,
        }
    }
}

/// Everything the resolver needs besides loaders and a runtime.
#[derive(Debug, Clone)]
pub struct GraphOptions {
    /// Base directory for entry specifiers and module ids
    pub context: PathBuf,
    pub mode: Mode,
    pub rules: RuleSet,
    pub no_parse: NoParseSet,
    pub resolver: ModuleResolver,
    pub limits: GraphLimits,
    /// Maximum transforms running at once; `None` uses the CPU count
    pub parallel_jobs: Option<usize>,
}

impl GraphOptions {
    pub fn new(context: impl Into<PathBuf>) -> Self {
        Self {
            context: context.into(),
            mode: Mode::default(),
            rules: RuleSet::default(),
            no_parse: NoParseSet::default(),
            resolver: ModuleResolver::default(),
            limits: GraphLimits::default(),
            parallel_jobs: None,
        }
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn no_parse(mut self, no_parse: NoParseSet) -> Self {
        self.no_parse = no_parse;
        self
    }

    pub fn resolver(mut self, resolver: ModuleResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn limits(mut self, limits: GraphLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn parallel_jobs(mut self, jobs: usize) -> Self {
        self.parallel_jobs = Some(jobs.max(1));
        self
    }
}

#[derive(Debug)]
struct Inner {
    options: GraphOptions,
    /// One composed chain per rule, by rule index
    chains: Vec<LoaderChain>,
    runtime: Arc<dyn Runtime>,
}

/// Resolves entries into per-entry module closures.
///
/// Construction binds every rule's loaders, so an unknown loader fails here
/// before any file is read.
#[derive(Debug, Clone)]
pub struct GraphResolver {
    inner: Arc<Inner>,
}

/// A claimed module waiting to be processed.
struct Job {
    path: PathBuf,
    entry: Arc<str>,
    /// Specifiers followed from the entry to reach `path`
    chain: Vec<String>,
}

struct Processed {
    node: ModuleNode,
    claimed: Vec<Job>,
}

impl GraphResolver {
    pub fn new(
        options: GraphOptions,
        registry: &LoaderRegistry,
        runtime: Arc<dyn Runtime>,
    ) -> Result<Self> {
        let chains = options
            .rules
            .rules()
            .iter()
            .enumerate()
            .map(|(index, rule)| LoaderChain::compose(index, rule, registry))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            inner: Arc::new(Inner {
                options,
                chains,
                runtime,
            }),
        })
    }

    pub fn options(&self) -> &GraphOptions {
        &self.inner.options
    }

    /// Chain bound to the rule at `index`.
    pub fn chain(&self, index: usize) -> Option<&LoaderChain> {
        self.inner.chains.get(index)
    }

    /// Resolve every entry. Fails on the first hard error, after aborting
    /// all in-flight work.
    pub async fn resolve(&self, entries: &[Entry]) -> Result<ResolvedGraph> {
        let inner = &self.inner;
        let cache = Arc::new(ModuleCache::new());
        let jobs = inner.options.parallel_jobs.unwrap_or_else(num_cpus::get).max(1);
        let semaphore = Arc::new(Semaphore::new(jobs));

        let context = inner.options.context.as_path();
        let mut roots = Vec::with_capacity(entries.len());
        let mut pending = Vec::new();

        for entry in entries {
            let name: Arc<str> = Arc::from(entry.name.as_str());
            let mut entry_roots = Vec::with_capacity(entry.specifiers.len());

            for specifier in &entry.specifiers {
                let path = inner
                    .options
                    .resolver
                    .resolve(specifier, context, inner.runtime.as_ref())
                    .await
                    .map_err(|_| UnresolvedSpecifierError {
                        entry: entry.name.clone(),
                        chain: vec![specifier.clone()],
                        specifier: specifier.clone(),
                        from: context.to_path_buf(),
                    })?;

                if cache.claim(&path) {
                    pending.push(Job {
                        path: path.clone(),
                        entry: Arc::clone(&name),
                        chain: vec![specifier.clone()],
                    });
                }
                entry_roots.push(path);
            }

            roots.push((entry.name.clone(), entry_roots));
        }

        let mut modules = Vec::with_capacity(pending.len());
        let mut tasks: JoinSet<Result<Processed>> = JoinSet::new();
        for job in pending {
            spawn(&mut tasks, Arc::clone(inner), Arc::clone(&cache), Arc::clone(&semaphore), job);
        }

        while let Some(joined) = tasks.join_next().await {
            let processed = match joined {
                Ok(Ok(processed)) => processed,
                Ok(Err(err)) => {
                    tasks.abort_all();
                    return Err(err);
                }
                Err(join_err) => {
                    tasks.abort_all();
                    return Err(Error::TaskFailed(join_err.to_string()));
                }
            };

            modules.push(Arc::new(processed.node));
            for job in processed.claimed {
                spawn(&mut tasks, Arc::clone(inner), Arc::clone(&cache), Arc::clone(&semaphore), job);
            }
        }

        let graph = ResolvedGraph::new(modules, roots);
        debug!(modules = graph.len(), entries = graph.entries().len(), "Resolved module graph");
        Ok(graph)
    }
}

fn spawn(
    tasks: &mut JoinSet<Result<Processed>>,
    inner: Arc<Inner>,
    cache: Arc<ModuleCache>,
    semaphore: Arc<Semaphore>,
    job: Job,
) {
    tasks.spawn(async move {
        let _permit = semaphore
            .acquire_owned()
            .await
            .map_err(|e| Error::TaskFailed(e.to_string()))?;
        process(&inner, &cache, job).await
    });
}

/// Read, transform and scan one module, then claim its dependencies.
async fn process(inner: &Inner, cache: &ModuleCache, job: Job) -> Result<Processed> {
    let options = &inner.options;
    let runtime = inner.runtime.as_ref();
    let path = job.path.as_path();
    let id = module_id(path, &options.context);

    let raw = read_module(runtime, path, options.limits.max_file_size).await?;

    let matched = options.rules.find(path);
    if let Err(ambiguity) = options.rules.check_unambiguous(path) {
        warn!(module = %id, "{ambiguity}; using rule #{}", ambiguity.first);
    }

    let emitted = Mutex::new(Vec::new());
    let transformed = match matched {
        Some(m) => match inner.chains.get(m.index) {
            Some(chain) => {
                chain
                    .run(raw, path, &options.context, options.mode, &emitted)
                    .await?
            }
            None => raw,
        },
        None => raw,
    };

    let body = String::from_utf8(transformed).map_err(|_| Error::NonUtf8Module {
        path: path.to_path_buf(),
    })?;

    let opaque = options.no_parse.is_match(path);
    let specifiers = if opaque {
        Vec::new()
    } else {
        scan_specifiers(&body)
    };

    let base_dir = path.parent().unwrap_or(&options.context);
    let mut dependencies = Vec::with_capacity(specifiers.len());
    let mut claimed = Vec::new();

    for specifier in &specifiers {
        let resolved = options
            .resolver
            .resolve(specifier, base_dir, runtime)
            .await
            .map_err(|_| {
                let mut chain = job.chain.clone();
                chain.push(specifier.clone());
                UnresolvedSpecifierError {
                    entry: job.entry.to_string(),
                    chain,
                    specifier: specifier.clone(),
                    from: path.to_path_buf(),
                }
            })?;

        if cache.claim(&resolved) {
            if cache.len() > options.limits.max_modules {
                return Err(Error::TooManyModules {
                    count: cache.len(),
                    max: options.limits.max_modules,
                });
            }
            let mut chain = job.chain.clone();
            chain.push(specifier.clone());
            claimed.push(Job {
                path: resolved.clone(),
                entry: Arc::clone(&job.entry),
                chain,
            });
        }
        dependencies.push((specifier.clone(), resolved));
    }

    debug!(
        module = %id,
        rule = ?matched.map(|m| m.index),
        opaque,
        dependencies = dependencies.len(),
        "Transformed module"
    );

    let mut node = ModuleNode::new(job.path.clone(), id, body);
    node.specifiers = specifiers;
    node.dependencies = dependencies;
    node.assets = emitted.into_inner();
    node.rule = matched.map(|m| m.index);
    node.opaque = opaque;

    Ok(Processed { node, claimed })
}

async fn read_module(runtime: &dyn Runtime, path: &Path, max_size: u64) -> Result<Vec<u8>> {
    let read_error = |source: RuntimeError| Error::ReadFile {
        path: path.to_path_buf(),
        source,
    };

    let metadata = runtime.metadata(path).await.map_err(read_error)?;
    if metadata.size > max_size {
        return Err(Error::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.size,
            max: max_size,
        });
    }

    runtime.read_file(path).await.map_err(read_error)
}
