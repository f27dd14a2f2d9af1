//! package.json parser

use crate::traits::ManifestParser;
use crate::types::{DependencyGroup, Ecosystem, ManifestEntry};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson {
    #[serde(default)]
    dependencies: Value,
    #[serde(default)]
    dev_dependencies: Value,
    #[serde(default)]
    optional_dependencies: Value,
    #[serde(default)]
    peer_dependencies: Value,
}

/// package.json manifest parser (shared by npm and pnpm)
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageJsonParser;

impl PackageJsonParser {
    /// Create a new package.json parser
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for PackageJsonParser {
    fn file_name(&self) -> &'static str {
        "package.json"
    }

    fn parse_manifest(&self, text: &str) -> Vec<ManifestEntry> {
        let pkg: PackageJson = match serde_json::from_str(text) {
            Ok(pkg) => pkg,
            Err(e) => {
                debug!(error = %e, "unreadable package.json, treating as empty");
                return Vec::new();
            }
        };

        let groups = [
            (&pkg.dependencies, DependencyGroup::Dependencies),
            (&pkg.dev_dependencies, DependencyGroup::DevDependencies),
            (&pkg.optional_dependencies, DependencyGroup::Dependencies),
            (&pkg.peer_dependencies, DependencyGroup::Dependencies),
        ];

        groups
            .into_iter()
            .flat_map(|(map, group)| string_entries(map).map(move |(name, spec)| (name, spec, group)))
            .map(|(name, spec, group)| ManifestEntry::new(Ecosystem::Npm, name, spec, group))
            .collect()
    }
}

/// `(name, specifier)` pairs of a dependency map; non-string values are skipped
pub(crate) fn string_entries(map: &Value) -> impl Iterator<Item = (&str, &str)> {
    map.as_object()
        .into_iter()
        .flatten()
        .filter_map(|(name, spec)| Some((name.as_str(), spec.as_str()?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_in_file_order() {
        let entries = PackageJsonParser::new().parse_manifest(
            r#"{
                "name": "app",
                "dependencies": { "react": "^18.2.0", "lodash": "^4.17.0" },
                "devDependencies": { "typescript": "~5.4.0" },
                "peerDependencies": { "react-dom": ">=18" },
                "optionalDependencies": { "fsevents": "^2.3.0" }
            }"#,
        );
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["react", "lodash", "typescript", "fsevents", "react-dom"]);
        assert_eq!(entries[2].group, DependencyGroup::DevDependencies);
        assert_eq!(entries[3].group, DependencyGroup::Dependencies);
        assert!(entries.iter().all(|e| e.ecosystem == Ecosystem::Npm));
    }

    #[test]
    fn test_tolerates_odd_values() {
        let entries = PackageJsonParser::new().parse_manifest(
            r#"{ "dependencies": { "ok": "1.0.0", "bad": 42 }, "devDependencies": ["nope"] }"#,
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].specifier, "1.0.0");
    }

    #[test]
    fn test_malformed_is_empty() {
        assert!(PackageJsonParser::new().parse_manifest("{ not json").is_empty());
        assert!(PackageJsonParser::new().parse_manifest("").is_empty());
        assert!(PackageJsonParser::new().parse_manifest("[]").is_empty());
    }
}
