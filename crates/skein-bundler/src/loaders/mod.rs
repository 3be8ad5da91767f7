//! Built-in loaders and command loaders declared in config.
//!
//! | identifier | input            | output                                        |
//! |------------|------------------|-----------------------------------------------|
//! | `raw`      | any text         | module exporting the text                     |
//! | `file`     | any bytes        | emits a renamed copy, exports its file name   |
//! | `css`      | stylesheet text  | module exporting the stylesheet               |
//! | `style`    | module body      | same module, plus `<style>` injection         |
//!
//! Anything else (stylesheet compilers, compiled-language toolchains) is an
//! external program registered under `[loaders.<name>]`; see [`CommandLoader`].

mod css;
mod exec;
mod file;
mod raw;
mod style;

pub use css::CssLoader;
pub use exec::CommandLoader;
pub use file::{DEFAULT_FILE_NAME, FileLoader};
pub use raw::RawLoader;
pub use style::StyleLoader;

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use skein_config::CommandLoaderConfig;
use skein_graph::LoaderRegistry;

/// Registry holding the built-in loaders.
pub fn builtin_registry() -> LoaderRegistry {
    LoaderRegistry::new()
        .with("raw", Arc::new(RawLoader))
        .with("file", Arc::new(FileLoader))
        .with("css", Arc::new(CssLoader))
        .with("style", Arc::new(StyleLoader))
}

/// Register every command loader from config. A command loader may shadow a
/// built-in of the same name.
pub fn register_commands(
    registry: &mut LoaderRegistry,
    commands: &IndexMap<String, CommandLoaderConfig>,
    base_dir: &Path,
) {
    for (name, config) in commands {
        registry.register(name, Arc::new(CommandLoader::new(name, config, base_dir)));
    }
}

/// Quote text as a JavaScript string literal.
pub(crate) fn js_string(text: &str) -> String {
    // JSON string syntax is valid JavaScript apart from the two line terminators.
    serde_json::Value::from(text)
        .to_string()
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

/// Decode a stage input as UTF-8 text.
pub(crate) fn utf8(content: Vec<u8>, loader: &str) -> anyhow::Result<String> {
    String::from_utf8(content)
        .map_err(|_| anyhow::anyhow!("{loader} loader expects UTF-8 input"))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    use parking_lot::Mutex;
    use skein_graph::{EmittedAsset, Loader, LoaderContext, LoaderOptions, Mode};

    /// Run a loader against a resource under `/app`.
    pub async fn run(
        loader: &dyn Loader,
        resource: &str,
        options: LoaderOptions,
        content: &[u8],
    ) -> (Result<Vec<u8>, skein_graph::LoaderError>, Vec<EmittedAsset>) {
        let emitted = Mutex::new(Vec::new());
        let result = {
            let ctx = LoaderContext::new(
                Path::new(resource),
                Path::new("/app"),
                Mode::Development,
                "test",
                &options,
                &emitted,
            );
            loader.transform(content.to_vec(), &ctx).await
        };
        (result, emitted.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered() {
        let registry = builtin_registry();
        assert_eq!(registry.identifiers(), vec!["css", "file", "raw", "style"]);
        assert!(registry.contains("file-loader"));
    }

    #[test]
    fn command_loader_shadows_builtin() {
        let mut registry = builtin_registry();
        let mut commands = IndexMap::new();
        commands.insert(
            "css".to_string(),
            CommandLoaderConfig {
                command: "postcss".to_string(),
                ..Default::default()
            },
        );
        register_commands(&mut registry, &commands, Path::new("/app"));
        assert_eq!(registry.len(), 4);
        assert!(format!("{:?}", registry.get("css").unwrap()).contains("postcss"));
    }

    #[test]
    fn js_string_escapes_line_separators() {
        assert_eq!(js_string("a\"b\n"), r#""a\"b\n""#);
        assert_eq!(js_string("x\u{2028}y"), r#""x\u2028y""#);
    }
}
