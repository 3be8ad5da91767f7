//! The flags payload and how it is resolved before initialisation.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Line separating sections of a literal payload.
pub const SECTION_DELIMITER: &str = "---";

/// Opaque flags handed to the application.
///
/// The variant only records what the text looks like; the text itself is
/// never altered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FlagsPayload {
    /// Literal content, usually `---`-delimited sections
    Literal(String),
    /// A single `http://` or `https://` locator
    Locator(String),
}

impl Default for FlagsPayload {
    fn default() -> Self {
        FlagsPayload::Literal(String::new())
    }
}

impl FlagsPayload {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        if is_locator(&text) {
            FlagsPayload::Locator(text)
        } else {
            FlagsPayload::Literal(text)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FlagsPayload::Literal(text) | FlagsPayload::Locator(text) => text,
        }
    }

    pub fn is_locator(&self) -> bool {
        matches!(self, FlagsPayload::Locator(_))
    }

    pub fn into_string(self) -> String {
        match self {
            FlagsPayload::Literal(text) | FlagsPayload::Locator(text) => text,
        }
    }

    /// Split literal text into sections.
    ///
    /// A delimiter is a line holding exactly `---` followed by one or more
    /// blank lines (or the end of the text). Text before the first delimiter
    /// counts as a section only when it is non-blank. A locator has no
    /// sections.
    ///
    /// ```
    /// use skein_bootstrap::FlagsPayload;
    ///
    /// let flags = FlagsPayload::new("---\n\n---\n\n---\n\n");
    /// assert_eq!(flags.sections(), vec!["", "", ""]);
    ///
    /// let flags = FlagsPayload::new("# Title\n---\n\nbody\n");
    /// assert_eq!(flags.sections(), vec!["# Title", "body"]);
    /// ```
    pub fn sections(&self) -> Vec<&str> {
        let FlagsPayload::Literal(text) = self else {
            return Vec::new();
        };

        let mut lines = Vec::new();
        let mut offset = 0;
        for line in text.split_inclusive('\n') {
            lines.push((offset, line));
            offset += line.len();
        }

        let is_blank = |line: &str| line.trim().is_empty();
        let mut sections = Vec::new();
        let mut start = 0;
        let mut delimited = false;
        let mut i = 0;

        while i < lines.len() {
            let (line_start, line) = lines[i];
            let is_delimiter = line.trim_end_matches(['\n', '\r']) == SECTION_DELIMITER
                && lines.get(i + 1).is_none_or(|(_, next)| is_blank(next));
            if !is_delimiter {
                i += 1;
                continue;
            }

            let body = &text[start..line_start];
            if delimited || !is_blank(body) {
                sections.push(trim_section(body));
            }
            delimited = true;

            i += 1;
            while i < lines.len() && is_blank(lines[i].1) {
                i += 1;
            }
            start = lines.get(i).map_or(text.len(), |(line_start, _)| *line_start);
        }

        let body = &text[start..];
        if delimited || !is_blank(body) {
            sections.push(trim_section(body));
        }
        sections
    }
}

fn trim_section(body: &str) -> &str {
    body.trim_end_matches(['\n', '\r'])
}

fn is_locator(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.contains(char::is_whitespace)
        && ["http://", "https://"].iter().any(|scheme| {
            trimmed.len() > scheme.len()
                && trimmed
                    .get(..scheme.len())
                    .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
        })
}

impl From<String> for FlagsPayload {
    fn from(text: String) -> Self {
        FlagsPayload::new(text)
    }
}

impl From<&str> for FlagsPayload {
    fn from(text: &str) -> Self {
        FlagsPayload::new(text)
    }
}

impl From<FlagsPayload> for String {
    fn from(payload: FlagsPayload) -> Self {
        payload.into_string()
    }
}

impl fmt::Display for FlagsPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fetches the payload a locator points at.
///
/// Futures need not be `Send`, so a browser `fetch` binding can implement
/// this directly.
#[async_trait(?Send)]
pub trait FlagsFetcher {
    async fn fetch(&self, locator: &str) -> Result<String, FetchError>;
}

/// How the payload is prepared before initialisation.
#[derive(Clone, Copy, Default)]
pub enum FlagsPolicy<'a> {
    /// Hand the payload over unchanged, locator or not
    #[default]
    Verbatim,
    /// Replace a locator with the text it points at
    Dereference(&'a dyn FlagsFetcher),
}

impl fmt::Debug for FlagsPolicy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagsPolicy::Verbatim => f.write_str("Verbatim"),
            FlagsPolicy::Dereference(_) => f.write_str("Dereference(..)"),
        }
    }
}
