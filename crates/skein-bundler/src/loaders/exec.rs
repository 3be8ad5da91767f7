use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::Context;
use async_trait::async_trait;
use path_clean::PathClean;
use skein_config::CommandLoaderConfig;
use skein_graph::{Loader, LoaderContext, LoaderError};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Environment variable carrying the stage options as JSON.
pub const OPTIONS_ENV: &str = "SKEIN_LOADER_OPTIONS";

/// Largest stdout accepted from a command.
const MAX_OUTPUT_SIZE: usize = 64 * 1024 * 1024;

/// An external program used as a loader stage.
///
/// The stage input is written to the program's stdin and its stdout becomes
/// the stage output. A non-zero exit fails the build with the program's
/// stderr. The child sees:
///
/// - `SKEIN_LOADER_OPTIONS`: the stage options as a JSON object
/// - `SKEIN_RESOURCE`: absolute path of the module
/// - `SKEIN_MODE`: `development` or `production`
///
/// `{path}` in an argument expands to the module path. The working directory
/// is the stage's `cwd` option, else the configured `cwd`, else the build
/// context; relative values are resolved against the build context.
#[derive(Debug, Clone)]
pub struct CommandLoader {
    name: String,
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    env: Vec<(String, String)>,
}

impl CommandLoader {
    /// `base_dir` resolves a relative program path such as
    /// `./node_modules/.bin/sass`; bare names are looked up on `PATH`.
    pub fn new(name: impl Into<String>, config: &CommandLoaderConfig, base_dir: &Path) -> Self {
        let command = Path::new(&config.command);
        let program = if command.is_relative() && command.components().count() > 1 {
            base_dir.join(command).clean()
        } else {
            command.to_path_buf()
        };

        Self {
            name: name.into(),
            program,
            args: config.args.clone(),
            cwd: config.cwd.clone(),
            env: config
                .env
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn working_dir(&self, ctx: &LoaderContext<'_>) -> PathBuf {
        let configured = ctx
            .option_str("cwd")
            .map(PathBuf::from)
            .or_else(|| self.cwd.clone());
        match configured {
            Some(dir) => ctx.context.join(dir).clean(),
            None => ctx.context.to_path_buf(),
        }
    }

    async fn run(&self, content: Vec<u8>, ctx: &LoaderContext<'_>) -> anyhow::Result<Vec<u8>> {
        let resource = ctx.resource.to_string_lossy();
        let cwd = self.working_dir(ctx);
        let options = serde_json::to_string(ctx.options).context("serializing loader options")?;

        let mut cmd = Command::new(&self.program);
        cmd.args(self.args.iter().map(|arg| arg.replace("{path}", &resource)))
            .current_dir(&cwd)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .env(OPTIONS_ENV, options)
            .env("SKEIN_RESOURCE", ctx.resource)
            .env("SKEIN_MODE", ctx.mode.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            loader = %self.name,
            program = %self.program.display(),
            cwd = %cwd.display(),
            "Running command loader"
        );

        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to start '{}'", self.program.display()))?;

        let mut stdin = child.stdin.take().context("failed to capture stdin")?;
        // Feed stdin from a separate task so a chatty child cannot block on a full stdout pipe.
        let writer = tokio::spawn(async move {
            let result = stdin.write_all(&content).await;
            drop(stdin);
            result
        });

        let output = child
            .wait_with_output()
            .await
            .with_context(|| format!("failed to wait for '{}'", self.program.display()))?;

        match writer.await {
            Ok(Ok(())) => {}
            // The child may exit without reading all input; its status decides.
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => return Err(e).context("failed to write stdin"),
            Err(e) => anyhow::bail!("stdin writer task failed: {e}"),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output
                .status
                .code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            anyhow::bail!(
                "'{}' exited with {code}: {}",
                self.program.display(),
                stderr.trim()
            );
        }

        if output.stdout.len() > MAX_OUTPUT_SIZE {
            anyhow::bail!(
                "'{}' produced {} bytes of output (max {MAX_OUTPUT_SIZE})",
                self.program.display(),
                output.stdout.len()
            );
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl Loader for CommandLoader {
    async fn transform(
        &self,
        content: Vec<u8>,
        ctx: &LoaderContext<'_>,
    ) -> Result<Vec<u8>, LoaderError> {
        self.run(content, ctx)
            .await
            .map_err(|e| LoaderError::new(format!("{e:#}")))
    }
}
