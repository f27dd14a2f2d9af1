//! pyproject.toml parser

use crate::python::pep508::parse_requirement;
use crate::toml_subset;
use crate::traits::ManifestParser;
use crate::types::{DependencyGroup, Ecosystem, ManifestEntry};
use serde_json::Value;

/// pyproject.toml parser (PEP 621 and PEP 735 tables, uv dev dependencies)
#[derive(Debug, Clone, Copy, Default)]
pub struct PyprojectParser;

impl PyprojectParser {
    /// Create a new pyproject.toml parser
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for PyprojectParser {
    fn file_name(&self) -> &'static str {
        "pyproject.toml"
    }

    fn parse_manifest(&self, text: &str) -> Vec<ManifestEntry> {
        let doc = toml_subset::parse(text);
        let project = doc.get("project");
        let mut entries = Vec::new();

        let mut push_all = |list: Option<&Value>, group: DependencyGroup| {
            for requirement in list
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(Value::as_str)
                .filter_map(parse_requirement)
            {
                entries.push(ManifestEntry::new(
                    Ecosystem::Pypi,
                    requirement.name,
                    requirement.specifier,
                    group,
                ));
            }
        };

        push_all(
            project.and_then(|p| p.get("dependencies")),
            DependencyGroup::Dependencies,
        );
        for extra in tables(project.and_then(|p| p.get("optional-dependencies"))) {
            push_all(Some(extra), DependencyGroup::Dependencies);
        }
        // `{ include-group = "..." }` members are not requirements and are skipped
        for group in tables(doc.get("dependency-groups")) {
            push_all(Some(group), DependencyGroup::DevDependencies);
        }
        push_all(
            doc.get("tool")
                .and_then(|t| t.get("uv"))
                .and_then(|uv| uv.get("dev-dependencies")),
            DependencyGroup::DevDependencies,
        );

        entries
    }
}

/// Values of a table, in file order
fn tables(value: Option<&Value>) -> impl Iterator<Item = &Value> {
    value.and_then(Value::as_object).into_iter().flat_map(|map| map.values())
}
