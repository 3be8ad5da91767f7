//! Check command implementation.
//!
//! Validates the config without building and explains, for each given path,
//! which rule governs it and which loaders run on it.

use std::fmt;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use skein_bundler::Bundler;
use skein_config::ConfigLoader;
use skein_graph::{AmbiguousRuleError, LoaderChain, NoParseSet, RuleSet};

use crate::cli::CheckArgs;
use crate::commands::build::project_root;
use crate::error::{CliError, Result};
use crate::{logger, ui};

/// How one path would be processed.
#[derive(Debug, Clone, PartialEq)]
pub struct PathReport {
    pub path: PathBuf,
    /// Governing rule index and its test pattern
    pub rule: Option<(usize, String)>,
    /// Loader identifiers in the order they run
    pub execution_order: Vec<String>,
    /// Later rules that also match
    pub shadowed: Vec<usize>,
    pub no_parse: bool,
    pub ambiguity: Option<AmbiguousRuleError>,
}

/// Describe how `absolute` would be handled.
///
/// `chains[i]` must be the composed chain of rule `i`.
pub fn explain(
    display: &Path,
    absolute: &Path,
    rules: &RuleSet,
    chains: &[LoaderChain],
    no_parse: &NoParseSet,
) -> PathReport {
    let matches = rules.matching_rules(absolute);
    let rule = matches
        .first()
        .map(|m| (m.index, m.rule.test.as_str().to_string()));
    let execution_order = matches
        .first()
        .and_then(|m| chains.get(m.index))
        .map(|chain| chain.execution_order().into_iter().map(String::from).collect())
        .unwrap_or_default();

    PathReport {
        path: display.to_path_buf(),
        rule,
        execution_order,
        shadowed: matches.iter().skip(1).map(|m| m.index).collect(),
        no_parse: no_parse.is_match(absolute),
        ambiguity: rules.check_unambiguous(absolute).err(),
    }
}

impl fmt::Display for PathReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.path.display())?;
        match &self.rule {
            Some((index, test)) => {
                writeln!(f, "  rule:    #{index} ({test})")?;
                if self.execution_order.is_empty() {
                    writeln!(f, "  loaders: (none)")?;
                } else {
                    writeln!(f, "  loaders: {}", self.execution_order.join(" -> "))?;
                }
            }
            None => writeln!(f, "  rule:    none (passed through unchanged)")?,
        }
        if !self.shadowed.is_empty() {
            let shadowed: Vec<_> = self.shadowed.iter().map(|i| format!("#{i}")).collect();
            writeln!(f, "  shadows: {}", shadowed.join(", "))?;
        }
        write!(
            f,
            "  scan:    {}",
            if self.no_parse { "skipped (noParse)" } else { "dependencies followed" }
        )
    }
}

/// Execute the check command.
///
/// # Errors
///
/// Config, pattern or loader errors, and [`CliError::AmbiguousRules`] if
/// any path is claimed by rules with different loader chains.
pub async fn execute(args: CheckArgs) -> Result<()> {
    let root = project_root(args.cwd.as_deref())?;
    let loaded = ConfigLoader::new(&root)
        .file(args.config.clone())
        .profile(args.profile.clone())
        .load()?;
    logger::apply_config_level(loaded.config.settings.log_level.as_deref());
    if let Some(source) = &loaded.source {
        ui::info(&format!("Checking {}", source.display()));
    }

    let bundler = Bundler::from_config(&loaded)?;
    let rules = loaded.config.module.rule_set()?;
    let no_parse = loaded.config.module.no_parse_set()?;
    let chains = rules
        .rules()
        .iter()
        .enumerate()
        .map(|(index, rule)| LoaderChain::compose(index, rule, bundler.registry()))
        .collect::<skein_graph::Result<Vec<_>>>()?;

    ui::success(&format!(
        "Configuration is valid: {} {}, {} {}",
        bundler.entries().len(),
        plural(bundler.entries().len(), "entry", "entries"),
        rules.len(),
        plural(rules.len(), "rule", "rules"),
    ));

    let mut ambiguous = 0;
    for path in &args.paths {
        let absolute = if path.is_absolute() {
            path.clean()
        } else {
            bundler.context().join(path).clean()
        };
        let report = explain(path, &absolute, &rules, &chains, &no_parse);
        println!("{report}");
        if let Some(err) = &report.ambiguity {
            ui::warning(&err.to_string());
            ambiguous += 1;
        }
    }

    if ambiguous > 0 {
        return Err(CliError::AmbiguousRules { count: ambiguous });
    }
    Ok(())
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skein_graph::{LoaderSpec, Pattern, PatternSet, Rule};

    fn rules() -> RuleSet {
        RuleSet::new(vec![
            Rule::new(Pattern::new(r"\.css$").unwrap())
                .exclude(PatternSet::compile(["node_modules"]).unwrap())
                .loaders([LoaderSpec::new("style-loader"), LoaderSpec::new("css-loader")]),
            Rule::new(Pattern::new(r"\.(css|html)$").unwrap()).loader(LoaderSpec::new("file-loader")),
        ])
    }

    fn chains(rules: &RuleSet) -> Vec<LoaderChain> {
        let registry = skein_bundler::loaders::builtin_registry();
        rules
            .rules()
            .iter()
            .enumerate()
            .map(|(i, rule)| LoaderChain::compose(i, rule, &registry).unwrap())
            .collect()
    }

    #[test]
    fn reports_execution_order_and_ambiguity() {
        let rules = rules();
        let chains = chains(&rules);
        let no_parse = NoParseSet::default();

        let report = explain(
            Path::new("src/a.css"),
            Path::new("/app/src/a.css"),
            &rules,
            &chains,
            &no_parse,
        );
        assert_eq!(report.rule.as_ref().map(|r| r.0), Some(0));
        assert_eq!(report.execution_order, vec!["css-loader", "style-loader"]);
        assert_eq!(report.shadowed, vec![1]);
        assert!(report.ambiguity.is_some());

        let text = report.to_string();
        assert!(text.contains("css-loader -> style-loader"));
        assert!(text.contains("shadows: #1"));
    }

    #[test]
    fn exclude_falls_through_to_later_rule() {
        let rules = rules();
        let chains = chains(&rules);
        let report = explain(
            Path::new("node_modules/x.css"),
            Path::new("/app/node_modules/x.css"),
            &rules,
            &chains,
            &NoParseSet::default(),
        );
        assert_eq!(report.rule.as_ref().map(|r| r.0), Some(1));
        assert_eq!(report.execution_order, vec!["file-loader"]);
        assert!(report.ambiguity.is_none());
    }

    #[test]
    fn unmatched_path_passes_through() {
        let rules = rules();
        let chains = chains(&rules);
        let no_parse = NoParseSet::compile([r"\.min\.js$"]).unwrap();
        let report = explain(
            Path::new("vendor.min.js"),
            Path::new("/app/vendor.min.js"),
            &rules,
            &chains,
            &no_parse,
        );
        assert!(report.rule.is_none());
        assert!(report.no_parse);
        assert!(report.to_string().contains("passed through unchanged"));
        assert!(report.to_string().contains("skipped (noParse)"));
    }
}
