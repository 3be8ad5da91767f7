//! Import specifier scanning.
//!
//! Transformed bodies are never parsed. The scanner only looks for the
//! static shapes a module uses to name its dependencies:
//!
//! - `import x from "s"`, `import { a, b } from "s"`, `import "s"`
//! - `export { a } from "s"`, `export * from "s"`
//! - `import("s")` and `require("s")`
//!
//! Comments are removed first, and so is every string literal that is not
//! in specifier position (right after `import`, `from`, `require(` or
//! `import(`). Import-looking text inside comments or ordinary strings is
//! never followed.

use std::sync::LazyLock;

use regex::Regex;

static SPECIFIER: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?:^|[^.\w$])(?:"#,
        r#"(?:import\s*(?:[\w$*{}\s,]+?\s*from\s*)?|export\s*[\w$*{}\s,]+?\s*from\s*)["']([^"'\r\n]+)["']"#,
        r#"|(?:import|require)\s*\(\s*["']([^"'\r\n]+)["']\s*\)"#,
        r#")"#,
    ))
    .ok()
});

/// Collect the import specifiers of a module body, first appearance order,
/// without duplicates.
pub fn scan_specifiers(body: &str) -> Vec<String> {
    let Some(re) = SPECIFIER.as_ref() else {
        return Vec::new();
    };
    let code = code_view(body);
    let mut specifiers: Vec<String> = Vec::new();

    for caps in re.captures_iter(&code) {
        let Some(found) = caps.get(1).or_else(|| caps.get(2)) else {
            continue;
        };
        let specifier = found.as_str().trim();
        if specifier.is_empty() || specifiers.iter().any(|s| s == specifier) {
            continue;
        }
        specifiers.push(specifier.to_string());
    }

    specifiers
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    /// Inside a literal; `keep` is set for specifier literals.
    Str { quote: char, keep: bool },
    LineComment,
    BlockComment,
}

/// Blank out comments and non-specifier string literals, keeping line breaks.
fn code_view(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut state = State::Code;

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    out.push(' ');
                    state = State::BlockComment;
                }
                '"' | '\'' | '`' => {
                    let keep = c != '`' && in_specifier_position(&out);
                    out.push(if keep { c } else { ' ' });
                    state = State::Str { quote: c, keep };
                }
                _ => out.push(c),
            },
            State::Str { quote, keep } => {
                let blank = |ch: char| if keep || ch == '\n' { ch } else { ' ' };
                out.push(blank(c));
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        out.push(blank(escaped));
                    }
                } else if c == quote || (c == '\n' && quote != '`') {
                    state = State::Code;
                }
            }
            State::LineComment => {
                if c == '\n' {
                    out.push('\n');
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Code;
                } else if c == '\n' {
                    out.push('\n');
                }
            }
        }
    }

    out
}

/// Whether a literal opening after `code` names a module.
fn in_specifier_position(code: &str) -> bool {
    let head = code.trim_end();
    match head.strip_suffix('(') {
        Some(call) => {
            let call = call.trim_end();
            ends_with_keyword(call, "require") || ends_with_keyword(call, "import")
        }
        None => ends_with_keyword(head, "from") || ends_with_keyword(head, "import"),
    }
}

fn ends_with_keyword(code: &str, keyword: &str) -> bool {
    let Some(before) = code.strip_suffix(keyword) else {
        return false;
    };
    !before
        .chars()
        .next_back()
        .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
}
