//! Loader chain composition.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{EmittedAsset, Loader, LoaderContext, LoaderRegistry, LoaderSpec, Mode};
use crate::rule::Rule;
use crate::{Error, Result};

/// A declared loader bound to its implementation.
#[derive(Clone)]
pub struct BoundStage {
    pub spec: LoaderSpec,
    pub loader: Arc<dyn Loader>,
}

impl fmt::Debug for BoundStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundStage")
            .field("identifier", &self.spec.identifier)
            .field("options", &self.spec.options)
            .finish()
    }
}

/// The ordered transform stages for one rule.
///
/// Stages are stored in execution order: the last-declared loader first.
#[derive(Debug, Clone, Default)]
pub struct LoaderChain {
    stages: Vec<BoundStage>,
}

impl LoaderChain {
    /// Bind every loader of `rule` against `registry`.
    ///
    /// `rule_index` is only used to name the rule in errors.
    pub fn compose(rule_index: usize, rule: &Rule, registry: &LoaderRegistry) -> Result<Self> {
        let stages = rule
            .loaders
            .iter()
            .rev()
            .map(|spec| {
                let loader = registry
                    .get(&spec.identifier)
                    .ok_or_else(|| Error::UnknownLoader {
                        rule: rule_index,
                        loader: spec.identifier.clone(),
                    })?;
                Ok(BoundStage {
                    spec: spec.clone(),
                    loader,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { stages })
    }

    /// Chain with no stages; content passes through unchanged.
    pub fn passthrough() -> Self {
        Self::default()
    }

    pub fn stages(&self) -> &[BoundStage] {
        &self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Identifiers in the order they run.
    pub fn execution_order(&self) -> Vec<&str> {
        self.stages
            .iter()
            .map(|stage| stage.spec.identifier.as_str())
            .collect()
    }

    /// Thread `content` through every stage.
    pub async fn run(
        &self,
        content: Vec<u8>,
        resource: &Path,
        context: &Path,
        mode: Mode,
        emitted: &Mutex<Vec<EmittedAsset>>,
    ) -> Result<Vec<u8>> {
        let mut content = content;
        for stage in &self.stages {
            let ctx = LoaderContext::new(
                resource,
                context,
                mode,
                &stage.spec.identifier,
                &stage.spec.options,
                emitted,
            );

            content = stage
                .loader
                .transform(content, &ctx)
                .await
                .map_err(|e| Error::TransformFailed {
                    path: resource.to_path_buf(),
                    loader: stage.spec.identifier.clone(),
                    message: e.message,
                })?;
        }
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::LoaderError;
    use crate::pattern::Pattern;
    use async_trait::async_trait;

    /// Appends its own name so the output records the order stages ran in.
    #[derive(Debug)]
    struct Tag(&'static str);

    #[async_trait]
    impl Loader for Tag {
        async fn transform(
            &self,
            mut content: Vec<u8>,
            _ctx: &LoaderContext<'_>,
        ) -> std::result::Result<Vec<u8>, LoaderError> {
            content.extend_from_slice(format!("|{}", self.0).as_bytes());
            Ok(content)
        }
    }

    #[derive(Debug)]
    struct Failing;

    #[async_trait]
    impl Loader for Failing {
        async fn transform(
            &self,
            _content: Vec<u8>,
            _ctx: &LoaderContext<'_>,
        ) -> std::result::Result<Vec<u8>, LoaderError> {
            Err(LoaderError::new("syntax error on line 3"))
        }
    }

    fn registry() -> LoaderRegistry {
        LoaderRegistry::new()
            .with("style", Arc::new(Tag("style")))
            .with("css", Arc::new(Tag("css")))
            .with("sass", Arc::new(Tag("sass")))
            .with("broken", Arc::new(Failing))
    }

    fn stylesheet_rule() -> Rule {
        Rule::new(Pattern::new(r"\.s[ca]ss$").unwrap()).loaders([
            LoaderSpec::new("style-loader"),
            LoaderSpec::new("css-loader"),
            LoaderSpec::new("sass-loader"),
        ])
    }

    #[tokio::test]
    async fn stages_run_right_to_left() {
        let chain = LoaderChain::compose(0, &stylesheet_rule(), &registry()).unwrap();
        assert_eq!(
            chain.execution_order(),
            vec!["sass-loader", "css-loader", "style-loader"]
        );

        let emitted = Mutex::new(Vec::new());
        let out = chain
            .run(
                b"raw".to_vec(),
                Path::new("/app/src/style.scss"),
                Path::new("/app"),
                Mode::Development,
                &emitted,
            )
            .await
            .unwrap();
        assert_eq!(out, b"raw|sass|css|style");
    }

    #[test]
    fn unknown_loader_names_rule_and_identifier() {
        let rule = Rule::new(Pattern::new(r"\.elm$").unwrap()).loader(LoaderSpec::new("elm"));
        let err = LoaderChain::compose(2, &rule, &registry()).unwrap_err();
        match err {
            Error::UnknownLoader { rule, loader } => {
                assert_eq!(rule, 2);
                assert_eq!(loader, "elm");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn stage_failure_is_wrapped() {
        let rule = Rule::new(Pattern::new(r"\.scss$").unwrap())
            .loaders([LoaderSpec::new("css"), LoaderSpec::new("broken")]);
        let chain = LoaderChain::compose(0, &rule, &registry()).unwrap();

        let emitted = Mutex::new(Vec::new());
        let err = chain
            .run(
                Vec::new(),
                Path::new("/app/a.scss"),
                Path::new("/app"),
                Mode::Development,
                &emitted,
            )
            .await
            .unwrap_err();

        let Error::TransformFailed { loader, message, .. } = err else {
            panic!("expected TransformFailed");
        };
        assert_eq!(loader, "broken");
        assert_eq!(message, "syntax error on line 3");
    }

    #[tokio::test]
    async fn passthrough_keeps_content() {
        let emitted = Mutex::new(Vec::new());
        let out = LoaderChain::passthrough()
            .run(
                b"body".to_vec(),
                Path::new("/app/a.js"),
                Path::new("/app"),
                Mode::Production,
                &emitted,
            )
            .await
            .unwrap();
        assert_eq!(out, b"body");
    }
}
