use async_trait::async_trait;
use skein_graph::{Loader, LoaderContext, LoaderError};

use super::{js_string, utf8};

/// Turns stylesheet text into a module whose value is the stylesheet.
///
/// A leading byte-order mark is dropped. Production builds also strip
/// `/* ... */` comments and blank lines; development output is unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct CssLoader;

impl CssLoader {
    fn process_css(&self, source: &str, minify: bool) -> String {
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);
        if !minify {
            return source.to_string();
        }

        let mut out = String::with_capacity(source.len());
        let mut rest = source;
        while let Some(start) = rest.find("/*") {
            out.push_str(&rest[..start]);
            match rest[start + 2..].find("*/") {
                Some(end) => rest = &rest[start + 2 + end + 2..],
                None => {
                    rest = "";
                    break;
                }
            }
        }
        out.push_str(rest);

        out.lines()
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl Loader for CssLoader {
    async fn transform(
        &self,
        content: Vec<u8>,
        ctx: &LoaderContext<'_>,
    ) -> Result<Vec<u8>, LoaderError> {
        let source = utf8(content, "css").map_err(|e| LoaderError::new(format!("{e:#}")))?;
        let css = self.process_css(&source, ctx.mode.is_production());
        Ok(format!("module.exports = {};\n", js_string(&css)).into_bytes())
    }
}
