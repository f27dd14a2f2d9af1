//! pnpm-lock.yaml parser (lockfile v5, v6 and v9)

use crate::lockfile::{LockEdge, LockedPackage, LockfileData, RootPackage};
use crate::traits::LockfileParser;
use crate::types::Ecosystem;
use serde_yaml::{Mapping, Value};
use tracing::debug;

/// pnpm-lock.yaml parser
#[derive(Debug, Clone, Copy, Default)]
pub struct PnpmLockfileParser;

impl PnpmLockfileParser {
    /// Create a new pnpm lockfile parser
    pub fn new() -> Self {
        Self
    }
}

const DEPENDENCY_GROUPS: [&str; 3] = ["dependencies", "optionalDependencies", "devDependencies"];

impl LockfileParser for PnpmLockfileParser {
    fn file_name(&self) -> &'static str {
        "pnpm-lock.yaml"
    }

    fn parse_lockfile(&self, text: &str) -> LockfileData {
        let mut data = LockfileData::new(self.file_name());
        let doc: Value = match serde_yaml::from_str(text) {
            Ok(doc) => doc,
            Err(e) => {
                debug!(error = %e, "unreadable pnpm-lock.yaml, treating as empty");
                return data;
            }
        };

        // v6 keeps edges under `packages`; v9 moves them to `snapshots`
        for section in ["packages", "snapshots"] {
            let Some(entries) = doc.get(section).and_then(Value::as_mapping) else {
                continue;
            };
            for (key, entry) in entries {
                let Some((name, version)) = key.as_str().and_then(split_package_key) else {
                    continue;
                };
                let edges = edges_of(entry, &["dependencies", "optionalDependencies"]);
                match data.package_mut(Ecosystem::Npm, &name, &version) {
                    Some(existing) => {
                        for edge in edges {
                            if !existing.dependencies.contains(&edge) {
                                existing.dependencies.push(edge);
                            }
                        }
                    }
                    None => {
                        let mut package = LockedPackage::new(Ecosystem::Npm, name, version);
                        package.dependencies = edges;
                        data.insert(package);
                    }
                }
            }
        }

        // Root: `importers["."]` (v6+), or top-level groups in v5
        let root_section = doc
            .get("importers")
            .and_then(|importers| importers.get("."))
            .unwrap_or(&doc);
        let root_edges = edges_of(root_section, &DEPENDENCY_GROUPS);
        if !root_edges.is_empty() || doc.get("importers").is_some() {
            data.root = Some(RootPackage {
                name: None,
                dependencies: root_edges,
            });
        }

        data
    }
}

/// Edges listed under the given groups of a package or importer entry.
///
/// Values are either a version string (`1.2.3(react@18.2.0)`) or, in
/// importers, a `{ specifier, version }` mapping.
fn edges_of(entry: &Value, groups: &[&str]) -> Vec<LockEdge> {
    let mut edges = Vec::new();
    for group in groups {
        let Some(map) = entry.get(*group).and_then(Value::as_mapping) else {
            continue;
        };
        for (name, value) in map {
            let Some(name) = name.as_str() else {
                continue;
            };
            let (raw_version, specifier) = match value {
                Value::String(v) => (Some(v.as_str()), None),
                Value::Mapping(m) => (
                    mapping_str(m, "version"),
                    mapping_str(m, "specifier"),
                ),
                _ => (None, None),
            };
            let Some((target, version)) = raw_version.and_then(|v| resolve_reference(name, v)) else {
                continue;
            };
            let mut edge = LockEdge::new(Ecosystem::Npm, target)
                .with_version(version)
                .with_alias(name);
            if let Some(specifier) = specifier {
                edge = edge.with_requirement(specifier);
            }
            edges.push(edge);
        }
    }
    edges
}

fn mapping_str<'a>(map: &'a Mapping, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

/// Turn a dependency reference into `(package name, version)`.
///
/// Handles plain versions, peer-qualified versions, v5 `/name/version`
/// paths and aliases such as `string-width@4.2.3`. Local links are skipped.
fn resolve_reference(name: &str, reference: &str) -> Option<(String, String)> {
    let reference = strip_peer_suffix(reference);
    if reference.starts_with("link:") || reference.starts_with("file:") {
        return None;
    }
    if reference.starts_with('/') {
        return split_package_key(reference);
    }
    if reference.starts_with(|c: char| c.is_ascii_digit()) {
        return Some((name.to_string(), reference.to_string()));
    }
    split_package_key(reference)
}

/// Drop the peer qualifier: everything from the first `(` (v6+), or the
/// `_` that follows a version (v5, `5.1.1_react@18.2.0`)
fn strip_peer_suffix(reference: &str) -> &str {
    let end = reference.find('(').unwrap_or(reference.len());
    let reference = &reference[..end];
    for (idx, _) in reference.match_indices('_') {
        let before = &reference[..idx];
        let segment = before.rsplit(['/', '@']).next().unwrap_or(before);
        if segment.starts_with(|c: char| c.is_ascii_digit()) {
            return before;
        }
    }
    reference
}

/// Split a package key into name and version.
///
/// Accepts `/name@1.0.0` (v6), `name@1.0.0` (v9), `/@scope/name@1.0.0`,
/// `/name/1.0.0` (v5) and any of those with a peer qualifier.
fn split_package_key(key: &str) -> Option<(String, String)> {
    let key = strip_peer_suffix(key.trim());
    let key = key.strip_prefix('/').unwrap_or(key);
    let scoped = key.starts_with('@');
    let search_from = usize::from(scoped);

    if let Some(at) = key[search_from..].find('@').map(|idx| idx + search_from) {
        let (name, version) = (&key[..at], &key[at + 1..]);
        if !name.is_empty() && !version.is_empty() {
            return Some((name.to_string(), version.to_string()));
        }
        return None;
    }

    // v5: "name/1.0.0" or "@scope/name/1.0.0"
    let (name, version) = key.rsplit_once('/')?;
    let valid_name = if scoped { name.contains('/') } else { !name.contains('/') };
    (valid_name && !name.is_empty() && version.starts_with(|c: char| c.is_ascii_digit()))
        .then(|| (name.to_string(), version.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_package_key() {
        let split = |k: &str| split_package_key(k).map(|(n, v)| format!("{n} {v}"));
        assert_eq!(split("/lodash@4.17.21").as_deref(), Some("lodash 4.17.21"));
        assert_eq!(split("lodash@4.17.21").as_deref(), Some("lodash 4.17.21"));
        assert_eq!(split("/@types/node@20.1.0").as_deref(), Some("@types/node 20.1.0"));
        assert_eq!(
            split("/react-dom@18.2.0(react@18.2.0)").as_deref(),
            Some("react-dom 18.2.0")
        );
        assert_eq!(split("/lodash/4.17.21").as_deref(), Some("lodash 4.17.21"));
        assert_eq!(split("/@babel/core/7.0.0").as_deref(), Some("@babel/core 7.0.0"));
        assert_eq!(
            split("/styled-jsx/5.1.1_react@18.2.0").as_deref(),
            Some("styled-jsx 5.1.1")
        );
        assert_eq!(split("garbage").as_deref(), None);
    }

    #[test]
    fn test_peer_qualifier_truncated_at_first_paren() {
        assert_eq!(strip_peer_suffix("1.0.0(a@1(b@2))"), "1.0.0");
        assert_eq!(strip_peer_suffix("1.0.0(broken"), "1.0.0");
        assert_eq!(strip_peer_suffix("1.0.0"), "1.0.0");
        assert_eq!(strip_peer_suffix("5.1.1_react@18.2.0"), "5.1.1");
        assert_eq!(strip_peer_suffix("/lodash_es/1.0.0"), "/lodash_es/1.0.0");
    }

    #[test]
    fn test_v9_alias_resolves_to_real_package() {
        let data = PnpmLockfileParser::new().parse_lockfile(
            r#"
lockfileVersion: '9.0'

importers:
  .:
    dependencies:
      string-width-cjs:
        specifier: npm:string-width@^4.2.0
        version: string-width@4.2.3

packages:
  string-width@4.2.3: {}
  strip-ansi@6.0.1: {}

snapshots:
  string-width@4.2.3:
    dependencies:
      strip-ansi: 6.0.1
  strip-ansi@6.0.1: {}
"#,
        );
        let root = data.root.unwrap();
        let edge = &root.dependencies[0];
        assert_eq!(edge.name, "string-width");
        assert_eq!(edge.install_name(), "string-width-cjs");
        assert_eq!(edge.requirement.as_deref(), Some("npm:string-width@^4.2.0"));
        assert_eq!(edge.version.as_deref(), Some("4.2.3"));

        let plain = LockEdge::new(Ecosystem::Npm, "react").with_alias("react");
        assert!(plain.alias.is_none());
    }

    #[test]
    fn test_v6_lockfile() {
        let data = PnpmLockfileParser::new().parse_lockfile(
            r#"
lockfileVersion: '6.0'

importers:
  .:
    dependencies:
      react-dom:
        specifier: ^18.2.0
        version: 18.2.0(react@18.2.0)
    devDependencies:
      typescript:
        specifier: ~5.4.0
        version: 5.4.5

packages:
  /loose-envify@1.4.0:
    resolution: {integrity: sha512-x}
    dependencies:
      js-tokens: 4.0.0
  /js-tokens@4.0.0:
    resolution: {integrity: sha512-y}
  /react@18.2.0:
    dependencies:
      loose-envify: 1.4.0
  /react-dom@18.2.0(react@18.2.0):
    dependencies:
      loose-envify: 1.4.0
      react: 18.2.0
  /typescript@5.4.5:
    dev: true
"#,
        );
        assert_eq!(data.len(), 5);
        let react_dom = data.find(Ecosystem::Npm, "react-dom", "18.2.0").unwrap();
        assert_eq!(react_dom.dependencies.len(), 2);

        let root = data.root.as_ref().unwrap();
        assert_eq!(root.dependencies.len(), 2);
        assert_eq!(root.dependencies[0].version.as_deref(), Some("18.2.0"));
        assert_eq!(root.dependencies[0].requirement.as_deref(), Some("^18.2.0"));

        let parents = data.parents_of(Ecosystem::Npm, "loose-envify", "1.4.0");
        assert_eq!(parents.len(), 2);
    }

    #[test]
    fn test_v9_snapshots_and_aliases() {
        let data = PnpmLockfileParser::new().parse_lockfile(
            r#"
lockfileVersion: '9.0'

importers:
  .:
    dependencies:
      string-width-cjs:
        specifier: npm:string-width@^4.2.0
        version: string-width@4.2.3

packages:
  string-width@4.2.3:
    resolution: {integrity: sha512-a}
  strip-ansi@6.0.1:
    resolution: {integrity: sha512-b}

snapshots:
  string-width@4.2.3:
    dependencies:
      strip-ansi: 6.0.1
  strip-ansi@6.0.1: {}
"#,
        );
        let sw = data.find(Ecosystem::Npm, "string-width", "4.2.3").unwrap();
        assert_eq!(sw.dependencies[0].name, "strip-ansi");
        let root = data.root.unwrap();
        assert_eq!(root.dependencies[0].name, "string-width");
    }

    #[test]
    fn test_malformed_is_empty() {
        assert!(PnpmLockfileParser::new().parse_lockfile(": : :\n\t- [").is_empty());
        assert!(PnpmLockfileParser::new().parse_lockfile("").is_empty());
    }
}
