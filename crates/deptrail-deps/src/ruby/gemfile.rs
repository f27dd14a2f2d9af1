//! Gemfile parser
//!
//! Bundler's Gemfile is Ruby code. This reads the declarative subset
//! Bundler users write in practice: `gem` calls, `group` blocks and the
//! block statements around them, matched by statement rather than
//! indentation.

use crate::traits::ManifestParser;
use crate::types::{DependencyGroup, Ecosystem, ManifestEntry};
use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

static GEM_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^gem\s*\(?\s*(?:"([^"]+)"|'([^']+)')(.*)$"#).expect("static regex")
});

static GROUP_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^group\b\s*\(?(.*?)\)?\s*do\b").expect("static regex"));

static INLINE_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:\bgroups?:|:groups?\s*=>)\s*(\[[^\]]*\]|:\w+|"\w+"|'\w+')"#)
        .expect("static regex")
});

static GROUP_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#":(\w+)|"(\w+)"|'(\w+)'"#).expect("static regex"));

static BLOCK_OPENER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:if|unless|case|begin|while|until|for|def|class|module)\b")
        .expect("static regex")
});

static TRAILING_DO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bdo\s*(?:\|[^|]*\|)?$").expect("static regex"));

static BLOCK_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^end\b").expect("static regex"));

/// Gemfile parser
#[derive(Debug, Clone, Copy, Default)]
pub struct GemfileParser;

impl GemfileParser {
    /// Create a new Gemfile parser
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for GemfileParser {
    fn file_name(&self) -> &'static str {
        "Gemfile"
    }

    fn parse_manifest(&self, text: &str) -> Vec<ManifestEntry> {
        // One frame per open block; `true` marks a development/test group
        let mut frames: Vec<bool> = Vec::new();
        let mut entries = Vec::new();

        for statement in statements(text) {
            let statement = statement.as_str();

            if BLOCK_END.is_match(statement) {
                if frames.pop().is_none() {
                    trace!(statement, "unbalanced `end` in Gemfile");
                }
                continue;
            }

            if let Some(caps) = GROUP_CALL.captures(statement) {
                let args = caps.get(1).map_or("", |m| m.as_str());
                frames.push(names_dev_group(args));
                continue;
            }

            if let Some(caps) = GEM_CALL.captures(statement) {
                let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
                let rest = caps.get(3).map_or("", |m| m.as_str());
                let dev = frames.iter().any(|dev| *dev) || inline_dev_group(rest);
                let group = if dev {
                    DependencyGroup::DevDependencies
                } else {
                    DependencyGroup::Dependencies
                };
                entries.push(ManifestEntry::new(
                    Ecosystem::Rubygems,
                    name,
                    requirements(rest),
                    group,
                ));
                if TRAILING_DO.is_match(statement) {
                    frames.push(false);
                }
                continue;
            }

            if BLOCK_OPENER.is_match(statement) || TRAILING_DO.is_match(statement) {
                frames.push(false);
            }
        }

        entries
    }
}

/// Logical statements: comments stripped, blank lines dropped, lines ending
/// in `,` or `\` joined with their continuation.
fn statements(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut pending = String::new();

    for line in text.lines() {
        let line = strip_comment(line).trim().to_string();
        if line.is_empty() {
            continue;
        }
        if !pending.is_empty() {
            pending.push(' ');
        }
        pending.push_str(line.trim_end_matches('\\').trim_end());
        if !(line.ends_with(',') || line.ends_with('\\')) {
            out.push(std::mem::take(&mut pending));
        }
    }
    if !pending.is_empty() {
        out.push(pending);
    }
    out
}

/// Drop a `#` comment that is not inside a string literal
fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (idx, c) in line.char_indices() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '#' => return &line[..idx],
            None => {}
        }
    }
    line
}

fn names_dev_group(args: &str) -> bool {
    GROUP_NAME.captures_iter(args).any(|caps| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map_or("", |m| m.as_str());
        matches!(name, "development" | "test")
    })
}

fn inline_dev_group(args: &str) -> bool {
    INLINE_GROUP
        .captures(args)
        .and_then(|caps| caps.get(1))
        .is_some_and(|value| names_dev_group(value.as_str()))
}

/// Positional string arguments after the gem name, joined with `", "`;
/// `"*"` when there are none.
fn requirements(rest: &str) -> String {
    let rest = rest.trim_start().trim_start_matches(',');
    let rest = TRAILING_DO.replace(rest, "");
    let reqs: Vec<&str> = split_arguments(&rest)
        .into_iter()
        .filter_map(|arg| {
            let arg = arg.trim().trim_end_matches(')').trim();
            let inner = arg
                .strip_prefix('"')
                .and_then(|a| a.strip_suffix('"'))
                .or_else(|| arg.strip_prefix('\'').and_then(|a| a.strip_suffix('\'')))?;
            (!inner.trim().is_empty()).then(|| inner.trim())
        })
        .collect();

    if reqs.is_empty() {
        "*".to_string()
    } else {
        reqs.join(", ")
    }
}

/// Split on commas outside of strings, brackets and braces
fn split_arguments(args: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (idx, c) in args.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[' | '{' | '(') => depth += 1,
            (None, ']' | '}' | ')') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&args[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&args[start..]);
    parts
}
