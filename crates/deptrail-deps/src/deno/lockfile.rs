//! deno.lock parser (lockfile v3, v4 and v5)

use crate::deno::parser::parse_import_specifier;
use crate::lockfile::{LockEdge, LockedPackage, LockfileData, RootPackage};
use crate::traits::LockfileParser;
use crate::types::Ecosystem;
use serde_json::{Map, Value};
use tracing::debug;

/// deno.lock parser
#[derive(Debug, Clone, Copy, Default)]
pub struct DenoLockfileParser;

impl DenoLockfileParser {
    /// Create a new deno.lock parser
    pub fn new() -> Self {
        Self
    }
}

impl LockfileParser for DenoLockfileParser {
    fn file_name(&self) -> &'static str {
        "deno.lock"
    }

    fn parse_lockfile(&self, text: &str) -> LockfileData {
        let mut data = LockfileData::new(self.file_name());
        let doc: Value = match serde_json::from_str(text) {
            Ok(doc) => doc,
            Err(e) => {
                debug!(error = %e, "unreadable deno.lock, treating as empty");
                return data;
            }
        };

        // v3 nests everything under "packages"
        let sections = match doc.get("version").and_then(Value::as_str) {
            Some("2") | Some("3") => doc.get("packages").unwrap_or(&Value::Null),
            _ => &doc,
        };
        let specifiers = Specifiers(object(sections, "specifiers"));

        for (key, entry) in object(sections, "jsr").into_iter().flatten() {
            let Some((name, version)) = split_name_version(key) else {
                continue;
            };
            let mut package = LockedPackage::new(Ecosystem::Jsr, name, version);
            package.dependencies = entry
                .get("dependencies")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(Value::as_str)
                .filter_map(|spec| specifiers.edge(spec))
                .collect();
            data.insert(package);
        }

        for (key, entry) in object(sections, "npm").into_iter().flatten() {
            let Some((name, version)) = split_name_version(key) else {
                continue;
            };
            let mut package = LockedPackage::new(Ecosystem::Npm, name, version);
            package.dependencies = npm_edges(entry.get("dependencies"));
            data.insert(package);
        }

        let workspace = doc.get("workspace");
        let root_specs = workspace
            .and_then(|w| w.get("dependencies"))
            .and_then(Value::as_array)
            .into_iter()
            .chain(
                workspace
                    .and_then(|w| w.get("packageJson"))
                    .and_then(|p| p.get("dependencies"))
                    .and_then(Value::as_array),
            )
            .flatten()
            .filter_map(Value::as_str);
        let root_edges: Vec<LockEdge> = root_specs.filter_map(|spec| specifiers.edge(spec)).collect();
        if workspace.is_some() {
            data.root = Some(RootPackage {
                name: None,
                dependencies: root_edges,
            });
        }

        data
    }
}

fn object<'a>(value: &'a Value, key: &str) -> Option<&'a Map<String, Value>> {
    value.get(key).and_then(Value::as_object)
}

/// The `specifiers` table: requested specifier → resolved version
struct Specifiers<'a>(Option<&'a Map<String, Value>>);

impl Specifiers<'_> {
    /// Build an edge for a `jsr:`/`npm:` specifier, resolving it through the table
    fn edge(&self, spec: &str) -> Option<LockEdge> {
        let (ecosystem, name, range) = parse_import_specifier(spec)?;
        let mut edge = LockEdge::new(ecosystem, name);
        if range != "*" {
            edge = edge.with_requirement(range);
        }
        if let Some(resolved) = self.resolve(spec) {
            edge = edge.with_version(resolved);
        }
        Some(edge)
    }

    fn resolve(&self, spec: &str) -> Option<String> {
        let resolved = self.0?.get(spec)?.as_str()?;
        // v3 values repeat the specifier ("npm:chalk@5.3.0"); v4+ hold the bare version
        let version = match parse_import_specifier(resolved) {
            Some((_, _, version)) => version,
            None => resolved.to_string(),
        };
        Some(strip_peers(&version).to_string())
    }
}

/// npm package edges: v3 `{ "name": "name@version" }`, v4+ `["name", "name@version"]`
fn npm_edges(dependencies: Option<&Value>) -> Vec<LockEdge> {
    let references: Vec<(&str, &str)> = match dependencies {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(alias, target)| Some((alias.as_str(), target.as_str()?)))
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|target| (target, target))
            .collect(),
        _ => Vec::new(),
    };

    references
        .into_iter()
        .map(|(alias, target)| match split_name_version(target) {
            Some((name, version)) => LockEdge::new(Ecosystem::Npm, name).with_version(version),
            None => LockEdge::new(Ecosystem::Npm, alias),
        })
        .collect()
}

/// Split `name@version` (scoped names keep their leading `@`); peer suffixes are dropped
fn split_name_version(key: &str) -> Option<(String, String)> {
    let search_from = usize::from(key.starts_with('@'));
    let at = key[search_from..].find('@')? + search_from;
    let (name, version) = (&key[..at], strip_peers(&key[at + 1..]));
    (!name.is_empty() && !version.is_empty()).then(|| (name.to_string(), version.to_string()))
}

/// `18.2.0_react@18.2.0` → `18.2.0`
fn strip_peers(version: &str) -> &str {
    version.split('_').next().unwrap_or(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    const V4: &str = r#"{
        "version": "4",
        "specifiers": {
            "jsr:@std/path@^1.0.0": "1.0.8",
            "jsr:@std/internal@^1.0.5": "1.0.5",
            "npm:chalk@5": "5.3.0",
            "npm:react-dom@18": "18.2.0_react@18.2.0"
        },
        "jsr": {
            "@std/path@1.0.8": {
                "integrity": "abc",
                "dependencies": ["jsr:@std/internal@^1.0.5"]
            },
            "@std/internal@1.0.5": { "integrity": "def" }
        },
        "npm": {
            "chalk@5.3.0": { "integrity": "ghi" },
            "react-dom@18.2.0_react@18.2.0": {
                "integrity": "jkl",
                "dependencies": ["loose-envify", "react@18.2.0"]
            },
            "react@18.2.0": { "integrity": "mno", "dependencies": ["loose-envify"] },
            "loose-envify@1.4.0": { "integrity": "pqr" }
        },
        "workspace": {
            "dependencies": ["jsr:@std/path@^1.0.0", "npm:chalk@5", "npm:react-dom@18"]
        }
    }"#;

    #[test]
    fn test_v4_packages_and_edges() {
        let data = DenoLockfileParser::new().parse_lockfile(V4);
        let path = data.find(Ecosystem::Jsr, "@std/path", "1.0.8").unwrap();
        assert_eq!(path.dependencies[0].version.as_deref(), Some("1.0.5"));
        assert_eq!(path.dependencies[0].ecosystem, Ecosystem::Jsr);

        let react_dom = data.find(Ecosystem::Npm, "react-dom", "18.2.0").unwrap();
        assert_eq!(react_dom.dependencies.len(), 2);
        assert_eq!(react_dom.dependencies[1].version.as_deref(), Some("18.2.0"));
        assert_eq!(
            data.parents_of(Ecosystem::Npm, "loose-envify", "1.4.0").len(),
            2
        );
    }

    #[test]
    fn test_v4_root_edges() {
        let data = DenoLockfileParser::new().parse_lockfile(V4);
        let root = data.root.unwrap();
        let versions: Vec<_> = root
            .dependencies
            .iter()
            .map(|e| e.version.as_deref().unwrap_or("-"))
            .collect();
        assert_eq!(versions, vec!["1.0.8", "5.3.0", "18.2.0"]);
    }

    #[test]
    fn test_v3_layout() {
        let data = DenoLockfileParser::new().parse_lockfile(
            r#"{
                "version": "3",
                "packages": {
                    "specifiers": { "npm:chalk@^5": "npm:chalk@5.3.0" },
                    "npm": {
                        "chalk@5.3.0": { "integrity": "x", "dependencies": {} },
                        "ansi-styles@6.2.1": { "integrity": "y", "dependencies": {} }
                    }
                },
                "remote": {},
                "workspace": { "dependencies": ["npm:chalk@^5"] }
            }"#,
        );
        assert_eq!(data.len(), 2);
        let root = data.root.unwrap();
        assert_eq!(root.dependencies[0].version.as_deref(), Some("5.3.0"));
        assert_eq!(root.dependencies[0].requirement.as_deref(), Some("^5"));
    }

    #[test]
    fn test_malformed_is_empty() {
        assert!(DenoLockfileParser::new().parse_lockfile("nope").is_empty());
    }
}
