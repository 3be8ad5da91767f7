use async_trait::async_trait;
use skein_graph::{Loader, LoaderContext, LoaderError};

use super::{js_string, utf8};

/// Exports the file's text as the module value.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawLoader;

#[async_trait]
impl Loader for RawLoader {
    async fn transform(
        &self,
        content: Vec<u8>,
        _ctx: &LoaderContext<'_>,
    ) -> Result<Vec<u8>, LoaderError> {
        let text = utf8(content, "raw").map_err(|e| LoaderError::new(format!("{e:#}")))?;
        Ok(format!("module.exports = {};\n", js_string(&text)).into_bytes())
    }
}
