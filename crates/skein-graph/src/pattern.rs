//! Path patterns.
//!
//! A pattern is a regular expression evaluated with search semantics against
//! the forward-slash form of a path, so `\.elm$` matches any path ending in
//! `.elm` and `node_modules` matches any path containing that segment text.

use std::fmt;
use std::path::Path;

use regex::Regex;

use crate::{Error, Result};

/// A compiled path pattern.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile a pattern from its source text.
    pub fn new(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let regex = Regex::new(&source).map_err(|e| Error::InvalidPattern {
            pattern: source.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { source, regex })
    }

    /// Source text the pattern was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Test the pattern against a path.
    pub fn is_match(&self, path: &Path) -> bool {
        self.regex.is_match(&normalize(path))
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.source)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

/// Render a path with forward slashes regardless of platform.
pub(crate) fn normalize(path: &Path) -> String {
    let text = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        text.into_owned()
    } else {
        text.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

/// A set of patterns; a path is in the set if any pattern matches it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    pub fn new(patterns: Vec<Pattern>) -> Self {
        Self { patterns }
    }

    /// Compile every source, failing on the first invalid pattern.
    pub fn compile<I, S>(sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns = sources
            .into_iter()
            .map(Pattern::new)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_match(&self, path: &Path) -> bool {
        self.patterns.iter().any(|p| p.is_match(path))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }
}

/// Modules exempt from dependency scanning.
pub type NoParseSet = PatternSet;
