//! uv.lock parser

use crate::lockfile::{LockEdge, LockedPackage, LockfileData, RootPackage};
use crate::toml_subset;
use crate::traits::LockfileParser;
use crate::types::Ecosystem;
use serde_json::Value;
use tracing::debug;

/// uv.lock parser
#[derive(Debug, Clone, Copy, Default)]
pub struct UvLockParser;

impl UvLockParser {
    /// Create a new uv.lock parser
    pub fn new() -> Self {
        Self
    }
}

impl LockfileParser for UvLockParser {
    fn file_name(&self) -> &'static str {
        "uv.lock"
    }

    fn parse_lockfile(&self, text: &str) -> LockfileData {
        let mut data = LockfileData::new(self.file_name());
        let doc = toml_subset::parse(text);
        let Some(packages) = doc.get("package").and_then(Value::as_array) else {
            debug!("uv.lock has no [[package]] tables");
            return data;
        };

        for package in packages {
            let (Some(name), Some(version)) = (
                package.get("name").and_then(Value::as_str),
                package.get("version").and_then(Value::as_str),
            ) else {
                continue;
            };

            if is_project_root(package) {
                if data.root.is_some() {
                    debug!(name, "ignoring second workspace root in uv.lock");
                    continue;
                }
                let mut edges = edges_of(package.get("dependencies"));
                for group in ["optional-dependencies", "dev-dependencies"] {
                    for list in group_lists(package.get(group)) {
                        edges.extend(edges_of(Some(list)));
                    }
                }
                apply_declared_specifiers(&mut edges, package);
                data.root = Some(RootPackage {
                    name: Some(name.to_string()),
                    dependencies: edges,
                });
                continue;
            }

            let mut locked = LockedPackage::new(Ecosystem::Pypi, name, version);
            locked.dependencies = edges_of(package.get("dependencies"));
            for list in group_lists(package.get("optional-dependencies")) {
                for edge in edges_of(Some(list)) {
                    if !locked.dependencies.contains(&edge) {
                        locked.dependencies.push(edge);
                    }
                }
            }
            data.insert(locked);
        }

        data
    }
}

/// `source = { virtual = "." }` or `source = { editable = "." }`
fn is_project_root(package: &Value) -> bool {
    let Some(source) = package.get("source") else {
        return false;
    };
    ["virtual", "editable"]
        .iter()
        .any(|kind| source.get(*kind).and_then(Value::as_str) == Some("."))
}

/// `[{ name = "x" }, { name = "y", version = "1.0" }]`
fn edges_of(list: Option<&Value>) -> Vec<LockEdge> {
    let mut edges: Vec<LockEdge> = Vec::new();
    for item in list.and_then(Value::as_array).into_iter().flatten() {
        let Some(name) = item.get("name").and_then(Value::as_str) else {
            continue;
        };
        let mut edge = LockEdge::new(Ecosystem::Pypi, name);
        if let Some(version) = item.get("version").and_then(Value::as_str) {
            edge = edge.with_version(version);
        }
        // The same package appears once per extra (`{ name = "x", extra = ["y"] }`)
        if !edges.iter().any(|e| e.name == edge.name && e.version == edge.version) {
            edges.push(edge);
        }
    }
    edges
}

fn group_lists(table: Option<&Value>) -> impl Iterator<Item = &Value> {
    table.and_then(Value::as_object).into_iter().flat_map(|map| map.values())
}

/// Copy the declared ranges from `[package.metadata]` onto the root edges
fn apply_declared_specifiers(edges: &mut [LockEdge], package: &Value) {
    let Some(metadata) = package.get("metadata") else {
        return;
    };
    let requires_dist = metadata.get("requires-dist").and_then(Value::as_array);
    let dev_groups = group_lists(metadata.get("requires-dev")).filter_map(Value::as_array);

    for declared in requires_dist.into_iter().chain(dev_groups).flatten() {
        let (Some(name), Some(specifier)) = (
            declared.get("name").and_then(Value::as_str),
            declared.get("specifier").and_then(Value::as_str),
        ) else {
            continue;
        };
        let key = Ecosystem::Pypi.normalize_name(name);
        for edge in edges.iter_mut() {
            if edge.requirement.is_none() && Ecosystem::Pypi.normalize_name(&edge.name) == key {
                edge.requirement = Some(specifier.to_string());
            }
        }
    }
}
