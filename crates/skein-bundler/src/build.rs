//! Build driver: config → graph → artifacts → disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use skein_config::{LoadedConfig, validate};
use skein_graph::{
    Entry, GraphOptions, GraphResolver, Loader, LoaderRegistry, Mode, NativeRuntime,
    ResolvedGraph, Runtime,
};
use tracing::{debug, info};

use crate::loaders::{builtin_registry, register_commands};
use crate::output::{Artifact, AssetRegistry, FilenameTemplate, container, writer};
use crate::{Error, Result};

/// Everything a build produced, before or after writing.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// Bundles in entry order, then emitted assets
    pub artifacts: Vec<Artifact>,
    pub graph: ResolvedGraph,
    pub output_dir: PathBuf,
    pub duration: Duration,
}

impl BuildOutput {
    pub fn bundles(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter().filter(|a| a.is_bundle())
    }

    pub fn assets(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter().filter(|a| !a.is_bundle())
    }

    pub fn artifact(&self, file_name: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.file_name == file_name)
    }

    pub fn total_size(&self) -> usize {
        self.artifacts.iter().map(Artifact::size).sum()
    }
}

/// Runs builds for one configuration.
///
/// ```no_run
/// use skein_bundler::Bundler;
/// use skein_config::ConfigLoader;
///
/// # async fn run() -> skein_bundler::Result<()> {
/// let loaded = ConfigLoader::new(".").load()?;
/// let bundler = Bundler::from_config(&loaded)?;
/// let output = bundler.bundle().await?;
/// bundler.write(&output)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Bundler {
    options: GraphOptions,
    registry: LoaderRegistry,
    runtime: Arc<dyn Runtime>,
    entries: Vec<Entry>,
    template: FilenameTemplate,
    output_dir: PathBuf,
    clean: bool,
}

impl Bundler {
    /// Validate `loaded` and prepare a bundler for it.
    pub fn from_config(loaded: &LoadedConfig) -> Result<Self> {
        let config = &loaded.config;
        validate(config)?;

        let context = loaded.context();
        let context = context.canonicalize().unwrap_or(context);

        let mut options = GraphOptions::new(context)
            .mode(config.mode)
            .rules(config.module.rule_set()?)
            .no_parse(config.module.no_parse_set()?)
            .resolver(config.resolve.to_resolver());
        if let Some(jobs) = config.settings.parallel_jobs {
            options = options.parallel_jobs(jobs);
        }

        let mut registry = builtin_registry();
        register_commands(&mut registry, &config.loaders, &loaded.base_dir);

        let entries = config.entries();
        let template = FilenameTemplate::parse(&config.output.filename)?;
        if entries.len() > 1 && !template.has_name() {
            return Err(Error::InvalidTemplate {
                template: template.to_string(),
                reason: "multiple entries need [name] in the filename".to_string(),
            });
        }

        Ok(Self {
            options,
            registry,
            runtime: Arc::new(NativeRuntime),
            entries,
            template,
            output_dir: loaded.output_dir(),
            clean: config.clean,
        })
    }

    /// Register an extra loader, replacing any loader of the same name.
    pub fn loader(mut self, identifier: impl AsRef<str>, loader: Arc<dyn Loader>) -> Self {
        self.registry.register(identifier, loader);
        self
    }

    pub fn runtime(mut self, runtime: Arc<dyn Runtime>) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn mode(&self) -> Mode {
        self.options.mode
    }

    pub fn context(&self) -> &Path {
        &self.options.context
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn registry(&self) -> &LoaderRegistry {
        &self.registry
    }

    /// Resolve the graph and render every artifact in memory.
    ///
    /// Nothing is written; any failure means no output at all.
    pub async fn bundle(&self) -> Result<BuildOutput> {
        let start = Instant::now();
        let resolver = GraphResolver::new(
            self.options.clone(),
            &self.registry,
            Arc::clone(&self.runtime),
        )?;
        let graph = resolver.resolve(&self.entries).await?;
        debug!(modules = graph.len(), "Resolved module graph");

        let registry = AssetRegistry::new();
        for closure in graph.entries() {
            let content = container::render(closure, self.options.mode).into_bytes();
            let file_name = self.template.render(&closure.name, &content);
            registry.insert(Artifact::bundle(closure.name.clone(), file_name, content))?;
        }
        for asset in graph.assets() {
            registry.insert(Artifact::asset(
                asset.file_name.clone(),
                asset.content.clone(),
                asset.source.clone(),
            ))?;
        }

        Ok(BuildOutput {
            artifacts: registry.drain(),
            graph,
            output_dir: self.output_dir.clone(),
            duration: start.elapsed(),
        })
    }

    /// Write a bundled output atomically.
    pub fn write(&self, output: &BuildOutput) -> Result<Vec<PathBuf>> {
        if self.clean {
            let dir = output
                .output_dir
                .canonicalize()
                .unwrap_or_else(|_| output.output_dir.clone());
            if self.options.context.starts_with(&dir) {
                return Err(Error::InvalidOutputPath(format!(
                    "Refusing to clean '{}': it contains the build context",
                    dir.display()
                )));
            }
        }

        let paths = writer::write_artifacts(&output.artifacts, &output.output_dir, self.clean)?;
        for artifact in &output.artifacts {
            match artifact.entry() {
                Some(entry) => info!(
                    entry = %entry,
                    file = %artifact.file_name,
                    size = artifact.size(),
                    "Emitted bundle"
                ),
                None => info!(
                    file = %artifact.file_name,
                    size = artifact.size(),
                    "Emitted asset"
                ),
            }
        }
        Ok(paths)
    }

    /// Bundle, then write.
    pub async fn build(&self) -> Result<BuildOutput> {
        let output = self.bundle().await?;
        self.write(&output)?;
        Ok(output)
    }
}
