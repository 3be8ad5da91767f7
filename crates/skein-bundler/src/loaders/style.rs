use async_trait::async_trait;
use skein_graph::{Loader, LoaderContext, LoaderError};

use super::{js_string, utf8};

/// Appends code that injects the module's exported stylesheet into the page.
///
/// Expects a module body whose `module.exports` is stylesheet text, such as
/// the output of the `css` loader. Injection is skipped where `document` is
/// undefined so the bundle still loads outside a browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct StyleLoader;

#[async_trait]
impl Loader for StyleLoader {
    async fn transform(
        &self,
        content: Vec<u8>,
        ctx: &LoaderContext<'_>,
    ) -> Result<Vec<u8>, LoaderError> {
        let mut body = utf8(content, "style").map_err(|e| LoaderError::new(format!("{e:#}")))?;
        if !body.ends_with('\n') {
            body.push('\n');
        }

        let source = ctx.relative_resource().to_string_lossy().replace('\\', "/");
        body.push_str(&format!(
            concat!(
                "if (typeof document !== \"undefined\") {{\n",
                "  var style = document.createElement(\"style\");\n",
                "  style.setAttribute(\"data-skein\", {source});\n",
                "  style.textContent = String(module.exports);\n",
                "  document.head.appendChild(style);\n",
                "}}\n",
            ),
            source = js_string(&source),
        ));
        Ok(body.into_bytes())
    }
}
