use std::path::Path;

use async_trait::async_trait;
use skein_graph::{Loader, LoaderContext, LoaderError};

use super::js_string;

/// Name template used when a rule gives no `name` option.
pub const DEFAULT_FILE_NAME: &str = "[hash].[ext]";

/// Copies the resource into the output directory and exports its file name.
///
/// The `name` option is a template over `[name]` (file stem), `[ext]`
/// (extension without the dot), `[hash]` (first 8 hex chars of the BLAKE3
/// digest of the contents) and `[path]` (directory relative to the build
/// context, with a trailing slash, empty at the root).
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

impl FileLoader {
    /// Output name for `content` read from `relative` (a context-relative path).
    pub fn output_name(template: &str, relative: &Path, content: &[u8]) -> String {
        let name = relative
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = relative
            .extension()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir = relative
            .parent()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .filter(|p| !p.is_empty())
            .map(|p| format!("{p}/"))
            .unwrap_or_default();

        let hash = blake3::hash(content).to_hex();

        template
            .replace("[name]", &name)
            .replace("[ext]", &ext)
            .replace("[hash]", &hash.as_str()[..8])
            .replace("[path]", &dir)
    }
}

#[async_trait]
impl Loader for FileLoader {
    async fn transform(
        &self,
        content: Vec<u8>,
        ctx: &LoaderContext<'_>,
    ) -> Result<Vec<u8>, LoaderError> {
        let template = ctx.option_str("name").unwrap_or(DEFAULT_FILE_NAME);
        let file_name = Self::output_name(template, ctx.relative_resource(), &content);
        if file_name.is_empty() {
            return Err(LoaderError::new(format!(
                "name template '{template}' produced an empty file name"
            )));
        }

        let body = format!("module.exports = {};\n", js_string(&file_name));
        ctx.emit_file(file_name, content);
        Ok(body.into_bytes())
    }
}
