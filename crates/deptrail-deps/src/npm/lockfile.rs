//! package-lock.json parser (lockfile v1, v2 and v3)

use crate::lockfile::{LockEdge, LockedPackage, LockfileData, RootPackage};
use crate::npm::parser::string_entries;
use crate::traits::LockfileParser;
use crate::types::Ecosystem;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// package-lock.json parser
#[derive(Debug, Clone, Copy, Default)]
pub struct NpmLockfileParser;

impl NpmLockfileParser {
    /// Create a new npm lockfile parser
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Deserialize)]
struct PackageLock {
    #[serde(default)]
    packages: Option<Map<String, Value>>,
    #[serde(default)]
    dependencies: Option<Map<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageLockEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    link: bool,
    #[serde(default)]
    dependencies: Value,
    #[serde(default)]
    dev_dependencies: Value,
    #[serde(default)]
    optional_dependencies: Value,
    #[serde(default)]
    peer_dependencies: Value,
}

/// Install location → entry, the v2/v3 `packages` shape
type InstallTree = BTreeMap<String, PackageLockEntry>;

impl LockfileParser for NpmLockfileParser {
    fn file_name(&self) -> &'static str {
        "package-lock.json"
    }

    fn parse_lockfile(&self, text: &str) -> LockfileData {
        let mut data = LockfileData::new(self.file_name());
        let lock: PackageLock = match serde_json::from_str(text) {
            Ok(lock) => lock,
            Err(e) => {
                debug!(error = %e, "unreadable package-lock.json, treating as empty");
                return data;
            }
        };

        let tree: InstallTree = match (lock.packages, lock.dependencies) {
            (Some(packages), _) => packages
                .into_iter()
                .filter_map(|(path, entry)| Some((path, serde_json::from_value(entry).ok()?)))
                .collect(),
            (None, Some(dependencies)) => flatten_v1(&dependencies),
            (None, None) => InstallTree::new(),
        };

        // Shallow install locations first so hoisted copies are seen before nested ones
        let mut locations: Vec<&String> = tree
            .keys()
            .filter(|path| path.contains("node_modules/"))
            .collect();
        locations.sort_by_key(|path| (path.matches("node_modules/").count(), path.as_str()));

        for path in locations {
            let entry = &tree[path];
            if entry.link {
                continue;
            }
            let Some(version) = entry.version.as_deref() else {
                continue;
            };
            let name = entry
                .name
                .clone()
                .unwrap_or_else(|| package_name_from_path(path).to_string());

            let mut package = LockedPackage::new(Ecosystem::Npm, name, version);
            package.dependencies = edges_from(&tree, path, entry, false);
            data.insert(package);
        }

        if let Some(root) = tree.get("") {
            data.root = Some(RootPackage {
                name: None,
                dependencies: edges_from(&tree, "", root, true),
            });
        }

        data
    }
}

/// Name from an install location: the segment after the last `node_modules/`
fn package_name_from_path(path: &str) -> &str {
    path.rsplit_once("node_modules/")
        .map(|(_, name)| name)
        .unwrap_or(path)
}

/// Edges of one install location, resolved with Node's lookup: the nearest
/// `node_modules` directory walking up from `path`.
fn edges_from(tree: &InstallTree, path: &str, entry: &PackageLockEntry, include_dev: bool) -> Vec<LockEdge> {
    let mut groups = vec![
        &entry.dependencies,
        &entry.optional_dependencies,
        &entry.peer_dependencies,
    ];
    if include_dev {
        groups.push(&entry.dev_dependencies);
    }

    let mut edges: Vec<LockEdge> = Vec::new();
    for (name, requirement) in groups.into_iter().flat_map(|g| string_entries(g)) {
        if edges.iter().any(|e| e.install_name() == name) {
            continue;
        }
        // Uninstalled optional/peer dependencies have no location
        let Some(installed) = locate(tree, path, name) else {
            continue;
        };
        let Some(version) = installed.version.as_deref() else {
            continue;
        };
        // Aliased installs record the real package name
        let package = installed.name.as_deref().unwrap_or(name);
        edges.push(
            LockEdge::new(Ecosystem::Npm, package)
                .with_alias(name)
                .with_requirement(requirement)
                .with_version(version),
        );
    }
    edges
}

fn locate<'a>(tree: &'a InstallTree, from: &str, name: &str) -> Option<&'a PackageLockEntry> {
    let mut base = from.to_string();
    loop {
        let candidate = if base.is_empty() {
            format!("node_modules/{name}")
        } else {
            format!("{base}/node_modules/{name}")
        };
        if let Some(entry) = tree.get(&candidate).filter(|e| e.version.is_some()) {
            return Some(entry);
        }
        if base.is_empty() {
            return None;
        }
        // Top-level packages and workspace folders fall back to the root
        base = match base.rfind("/node_modules/") {
            Some(idx) => base[..idx].to_string(),
            None => String::new(),
        };
    }
}

/// Convert the v1 nested `dependencies` tree into install locations
fn flatten_v1(dependencies: &Map<String, Value>) -> InstallTree {
    fn walk(prefix: &str, dependencies: &Map<String, Value>, out: &mut InstallTree) {
        for (name, value) in dependencies {
            let path = if prefix.is_empty() {
                format!("node_modules/{name}")
            } else {
                format!("{prefix}/node_modules/{name}")
            };
            let version = value.get("version").and_then(Value::as_str).unwrap_or_default();
            // Aliases record `npm:real-name@version`
            let (package, version) = match version.strip_prefix("npm:") {
                Some(target) => split_alias_target(target).unwrap_or((name.as_str(), target)),
                None => (name.as_str(), version),
            };
            let entry = PackageLockEntry {
                name: Some(package.to_string()),
                version: (!version.is_empty()).then(|| version.to_string()),
                dependencies: value.get("requires").cloned().unwrap_or_default(),
                ..PackageLockEntry::default()
            };
            out.insert(path.clone(), entry);
            if let Some(nested) = value.get("dependencies").and_then(Value::as_object) {
                walk(&path, nested, out);
            }
        }
    }

    let mut out = InstallTree::new();
    walk("", dependencies, &mut out);
    out
}

/// `real-name@1.2.3` or `@scope/name@1.2.3` into name and version
fn split_alias_target(target: &str) -> Option<(&str, &str)> {
    let search_from = usize::from(target.starts_with('@'));
    let at = target[search_from..].find('@')? + search_from;
    Some((&target[..at], &target[at + 1..]))
}
