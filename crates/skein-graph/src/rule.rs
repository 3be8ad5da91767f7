//! Rule matching.
//!
//! Rules form an ordered dispatch table. For any path the first rule whose
//! test pattern matches and whose exclude patterns do not is the one that
//! governs it; reordering rules changes which chain runs.

use std::path::{Path, PathBuf};

use crate::loader::LoaderSpec;
use crate::pattern::{Pattern, PatternSet};

/// Binding of a path pattern to a loader chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub test: Pattern,
    pub exclude: PatternSet,
    /// Loaders in declaration order (executed right to left).
    pub loaders: Vec<LoaderSpec>,
}

impl Rule {
    pub fn new(test: Pattern) -> Self {
        Self {
            test,
            exclude: PatternSet::default(),
            loaders: Vec::new(),
        }
    }

    pub fn exclude(mut self, exclude: PatternSet) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn loader(mut self, spec: LoaderSpec) -> Self {
        self.loaders.push(spec);
        self
    }

    pub fn loaders(mut self, specs: impl IntoIterator<Item = LoaderSpec>) -> Self {
        self.loaders.extend(specs);
        self
    }

    /// True iff `path` matches the test pattern and none of the excludes.
    pub fn matches(&self, path: &Path) -> bool {
        self.test.is_match(path) && !self.exclude.is_match(path)
    }
}

/// A rule selected for a path, with its declaration index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleMatch<'a> {
    pub index: usize,
    pub rule: &'a Rule,
}

/// Two matching rules that bind different chains to the same path.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error(
    "Ambiguous rules for '{}': rule #{first} and rule #{second} both match with different loader chains",
    .path.display()
)]
pub struct AmbiguousRuleError {
    pub path: PathBuf,
    pub first: usize,
    pub second: usize,
}

/// Ordered rule list evaluated with first-match-wins semantics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Select the governing rule for `path`, or `None` for a raw asset.
    pub fn find(&self, path: &Path) -> Option<RuleMatch<'_>> {
        self.rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matches(path))
            .map(|(index, rule)| RuleMatch { index, rule })
    }

    /// Every rule that matches `path`, in declaration order.
    pub fn matching_rules(&self, path: &Path) -> Vec<RuleMatch<'_>> {
        self.rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.matches(path))
            .map(|(index, rule)| RuleMatch { index, rule })
            .collect()
    }

    /// Report paths that more than one rule would claim with different
    /// chains. The build itself always follows the first match.
    pub fn check_unambiguous(&self, path: &Path) -> Result<(), AmbiguousRuleError> {
        let matches = self.matching_rules(path);
        let Some((first, rest)) = matches.split_first() else {
            return Ok(());
        };

        match rest
            .iter()
            .find(|other| other.rule.loaders != first.rule.loaders)
        {
            Some(other) => Err(AmbiguousRuleError {
                path: path.to_path_buf(),
                first: first.index,
                second: other.index,
            }),
            None => Ok(()),
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(test: &str, exclude: &[&str], loaders: &[&str]) -> Rule {
        Rule::new(Pattern::new(test).unwrap())
            .exclude(PatternSet::compile(exclude.iter().copied()).unwrap())
            .loaders(loaders.iter().map(|l| LoaderSpec::new(*l)))
    }

    fn webpack_rules() -> RuleSet {
        RuleSet::new(vec![
            rule(r"\.elm$", &["elm-stuff", "node_modules"], &["elm"]),
            rule(r"\.s[ca]ss$", &["node_modules"], &["style", "css", "sass"]),
            rule(r"\.html$", &["node_modules"], &["file"]),
        ])
    }

    #[test]
    fn first_match_wins() {
        let rules = RuleSet::new(vec![
            rule(r"\.js$", &[], &["first"]),
            rule(r"\.js$", &[], &["second"]),
        ]);

        let found = rules.find(Path::new("/app/a.js")).unwrap();
        assert_eq!(found.index, 0);
        assert_eq!(found.rule.loaders[0].identifier, "first");
    }

    #[test]
    fn no_rule_means_raw_asset() {
        assert!(webpack_rules().find(Path::new("/app/src/index.js")).is_none());
    }

    #[test]
    fn exclude_blocks_match() {
        let rules = webpack_rules();
        assert_eq!(rules.find(Path::new("/app/src/Main.elm")).unwrap().index, 0);
        assert!(
            rules
                .find(Path::new("/app/elm-stuff/packages/Main.elm"))
                .is_none()
        );
        assert!(
            rules
                .find(Path::new("/app/node_modules/theme/style.scss"))
                .is_none()
        );
    }

    #[test]
    fn excluded_path_falls_through_to_later_rule() {
        let rules = RuleSet::new(vec![
            rule(r"\.js$", &["vendor"], &["app"]),
            rule(r"\.js$", &[], &["vendor"]),
        ]);

        let found = rules.find(Path::new("/app/vendor/lib.js")).unwrap();
        assert_eq!(found.index, 1);
    }

    #[test]
    fn matching_is_deterministic() {
        let rules = webpack_rules();
        let paths = [
            "/app/src/style.scss",
            "/app/src/style.sass",
            "/app/src/index.html",
            "/app/src/index.js",
        ];

        for path in paths {
            let first = rules.find(Path::new(path)).map(|m| m.index);
            for _ in 0..10 {
                assert_eq!(rules.find(Path::new(path)).map(|m| m.index), first);
            }
        }
    }

    #[test]
    fn ambiguity_detection() {
        let rules = RuleSet::new(vec![
            rule(r"\.css$", &[], &["style", "css"]),
            rule(r"\.css$", &[], &["style", "css"]),
            rule(r"\.s?css$", &[], &["raw"]),
        ]);

        let err = rules
            .check_unambiguous(Path::new("/app/site.css"))
            .unwrap_err();
        assert_eq!((err.first, err.second), (0, 2));

        assert!(webpack_rules()
            .check_unambiguous(Path::new("/app/src/style.scss"))
            .is_ok());
        assert!(rules.check_unambiguous(Path::new("/app/a.js")).is_ok());
    }
}
