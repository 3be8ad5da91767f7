//! Output filename templates.

use std::fmt;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Name,
    ContentHash,
}

/// A parsed bundle filename template such as `[name].[contenthash].js`.
///
/// `[name]` is the entry name and `[contenthash]` the first 8 hex chars of
/// the BLAKE3 digest of the rendered bundle. Any other bracketed word is
/// rejected at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl FilenameTemplate {
    pub fn parse(template: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidTemplate {
            template: template.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        let mut rest = template;
        while let Some(open) = rest.find('[') {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after
                .find(']')
                .ok_or_else(|| invalid("unclosed '['".to_string()))?;
            segments.push(match &after[..close] {
                "name" => Segment::Name,
                "contenthash" => Segment::ContentHash,
                other => return Err(invalid(format!("unknown placeholder [{other}]"))),
            });
            rest = &after[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        if segments.is_empty() {
            return Err(invalid("template is empty".to_string()));
        }

        Ok(Self {
            raw: template.to_string(),
            segments,
        })
    }

    /// True when the template contains the entry name; without it every
    /// entry maps to the same file.
    pub fn has_name(&self) -> bool {
        self.segments.contains(&Segment::Name)
    }

    pub fn has_content_hash(&self) -> bool {
        self.segments.contains(&Segment::ContentHash)
    }

    pub fn render(&self, name: &str, content: &[u8]) -> String {
        let hash = self
            .has_content_hash()
            .then(|| blake3::hash(content).to_hex());

        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Name => out.push_str(name),
                Segment::ContentHash => {
                    if let Some(hash) = &hash {
                        out.push_str(&hash.as_str()[..8]);
                    }
                }
            }
        }
        out
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for FilenameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
