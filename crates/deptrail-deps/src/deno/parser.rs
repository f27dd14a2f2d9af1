//! deno.json / deno.jsonc parser

use crate::traits::ManifestParser;
use crate::types::{DependencyGroup, Ecosystem, ManifestEntry};
use serde_json::Value;
use tracing::debug;

/// Deno configuration file parser; reads `npm:` and `jsr:` entries of the import map
#[derive(Debug, Clone, Copy, Default)]
pub struct DenoJsonParser;

impl DenoJsonParser {
    /// Create a new deno.json parser
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for DenoJsonParser {
    fn file_name(&self) -> &'static str {
        "deno.json"
    }

    fn parse_manifest(&self, text: &str) -> Vec<ManifestEntry> {
        let doc: Value = match serde_json::from_str(&strip_jsonc(text)) {
            Ok(doc) => doc,
            Err(e) => {
                debug!(error = %e, "unreadable deno.json, treating as empty");
                return Vec::new();
            }
        };

        doc.get("imports")
            .and_then(Value::as_object)
            .into_iter()
            .flatten()
            .filter_map(|(_, target)| parse_import_specifier(target.as_str()?))
            .map(|(ecosystem, name, range)| {
                ManifestEntry::new(ecosystem, name, range, DependencyGroup::Dependencies)
            })
            .collect()
    }
}

/// Split `npm:name@range/sub` or `jsr:@scope/name@range/sub` into
/// `(ecosystem, name, range)`. The range is `"*"` when absent.
pub(crate) fn parse_import_specifier(specifier: &str) -> Option<(Ecosystem, String, String)> {
    let (ecosystem, rest) = if let Some(rest) = specifier.strip_prefix("npm:") {
        (Ecosystem::Npm, rest)
    } else if let Some(rest) = specifier.strip_prefix("jsr:") {
        (Ecosystem::Jsr, rest)
    } else {
        return None;
    };
    let rest = rest.trim_start_matches('/');

    // The name ends at the version '@' or at the '/' that starts a subpath
    let name_end = if rest.starts_with('@') {
        let scope_end = rest.find('/')?;
        rest[scope_end + 1..]
            .find(['@', '/'])
            .map_or(rest.len(), |idx| idx + scope_end + 1)
    } else {
        rest.find(['@', '/']).unwrap_or(rest.len())
    };
    let name = &rest[..name_end];
    if name.is_empty() || name.ends_with('/') {
        return None;
    }

    let range = rest[name_end..]
        .strip_prefix('@')
        .and_then(|after| after.split('/').next())
        .filter(|range| !range.is_empty())
        .unwrap_or("*");
    Some((ecosystem, name.to_string(), range.to_string()))
}

/// Remove `//` and `/* */` comments and trailing commas so JSONC parses as JSON
pub(crate) fn strip_jsonc(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    let mut in_string = false;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(next) = chars.get(i + 1) {
                    out.push(*next);
                    i += 1;
                }
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        match (c, chars.get(i + 1).copied()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
                i += 1;
            }
            ('/', Some('/')) => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            ('/', Some('*')) => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i += 2;
            }
            (',', _) => {
                let next = chars[i + 1..].iter().copied().find(|c| !c.is_whitespace());
                if !matches!(next, Some('}' | ']')) {
                    out.push(c);
                }
                i += 1;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}
