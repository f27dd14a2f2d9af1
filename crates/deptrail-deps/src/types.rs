//! Core types for the dependency inventory

use crate::version::VersionGrammar;
use deptrail_info::Registry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Package ecosystem a dependency belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    /// npm registry packages (npm, pnpm, Deno `npm:` imports)
    Npm,
    /// JSR packages (Deno `jsr:` imports)
    Jsr,
    /// RubyGems (Bundler)
    Rubygems,
    /// Python Package Index (uv)
    Pypi,
    /// The package manager tool itself
    System,
}

impl Ecosystem {
    /// Lowercase identifier used in ids and serialized output
    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::Npm => "npm",
            Ecosystem::Jsr => "jsr",
            Ecosystem::Rubygems => "rubygems",
            Ecosystem::Pypi => "pypi",
            Ecosystem::System => "system",
        }
    }

    /// Registry serving published versions, if any
    pub fn registry(&self) -> Option<Registry> {
        match self {
            Ecosystem::Npm => Some(Registry::Npm),
            Ecosystem::Jsr => Some(Registry::Jsr),
            Ecosystem::Rubygems => Some(Registry::RubyGems),
            Ecosystem::Pypi => Some(Registry::PyPi),
            Ecosystem::System => None,
        }
    }

    /// Version grammar used to compare and match versions in this ecosystem
    pub fn grammar(&self) -> VersionGrammar {
        match self {
            Ecosystem::Npm | Ecosystem::Jsr | Ecosystem::System => VersionGrammar::Semantic,
            Ecosystem::Rubygems => VersionGrammar::RubyGems,
            Ecosystem::Pypi => VersionGrammar::Pep440,
        }
    }

    /// Normalize a package name for identity comparisons.
    ///
    /// PyPI names are case-insensitive and treat runs of `-`, `_` and `.` as
    /// equivalent (PEP 503). Every other ecosystem compares names verbatim.
    pub fn normalize_name(&self, name: &str) -> String {
        match self {
            Ecosystem::Pypi => {
                let mut out = String::with_capacity(name.len());
                let mut pending_sep = false;
                for c in name.trim().chars() {
                    if matches!(c, '-' | '_' | '.') {
                        pending_sep = true;
                        continue;
                    }
                    if pending_sep && !out.is_empty() {
                        out.push('-');
                    }
                    pending_sep = false;
                    out.push(c.to_ascii_lowercase());
                }
                out
            }
            _ => name.to_string(),
        }
    }

    /// Parent name as written in a transitive source.
    ///
    /// JSR parents carry a `jsr:` prefix so a Deno lockfile's npm and jsr
    /// packages of the same name stay apart.
    pub fn parent_reference(&self, name: &str) -> String {
        match self {
            Ecosystem::Jsr => format!("jsr:{name}"),
            _ => name.to_string(),
        }
    }

    /// Stable dependency id: `"{ecosystem}:{normalized-name}"`
    pub fn dependency_id(&self, name: &str) -> String {
        format!("{}:{}", self.as_str(), self.normalize_name(name))
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ecosystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "npm" => Ok(Ecosystem::Npm),
            "jsr" => Ok(Ecosystem::Jsr),
            "rubygems" => Ok(Ecosystem::Rubygems),
            "pypi" => Ok(Ecosystem::Pypi),
            "system" => Ok(Ecosystem::System),
            other => Err(format!("unknown ecosystem: {other}")),
        }
    }
}

/// Manifest group a direct dependency was declared in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencyGroup {
    /// Runtime dependency
    Dependencies,
    /// Development-only dependency
    DevDependencies,
}

impl DependencyGroup {
    /// Name used in source strings
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyGroup::Dependencies => "dependencies",
            DependencyGroup::DevDependencies => "devDependencies",
        }
    }

    /// Whether this is the development group
    pub fn is_dev(&self) -> bool {
        matches!(self, DependencyGroup::DevDependencies)
    }
}

impl FromStr for DependencyGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dependencies" => Ok(DependencyGroup::Dependencies),
            "devDependencies" => Ok(DependencyGroup::DevDependencies),
            other => Err(format!("unknown dependency group: {other}")),
        }
    }
}

/// Where a resolved version came from.
///
/// Serialized as a string: `"{manifest}#{group}"` for direct sources and
/// `"{lockfile}:{parent}@{parentVersion}"` for transitive ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum VersionSource {
    /// Declared in a manifest
    Direct {
        /// Manifest path relative to the project root
        manifest: String,
        /// Declaring group
        group: DependencyGroup,
    },
    /// Pulled in by another locked package
    Transitive {
        /// Lockfile path relative to the project root
        lockfile: String,
        /// Parent package name
        parent: String,
        /// Parent package version
        parent_version: String,
    },
}

impl VersionSource {
    /// Direct source for a manifest group
    pub fn direct(manifest: impl Into<String>, group: DependencyGroup) -> Self {
        VersionSource::Direct {
            manifest: manifest.into(),
            group,
        }
    }

    /// Transitive source through a parent package
    pub fn transitive(
        lockfile: impl Into<String>,
        parent: impl Into<String>,
        parent_version: impl Into<String>,
    ) -> Self {
        VersionSource::Transitive {
            lockfile: lockfile.into(),
            parent: parent.into(),
            parent_version: parent_version.into(),
        }
    }

    /// Whether the version was declared directly in a manifest
    pub fn is_direct(&self) -> bool {
        matches!(self, VersionSource::Direct { .. })
    }

    /// Declaring group for direct sources
    pub fn group(&self) -> Option<DependencyGroup> {
        match self {
            VersionSource::Direct { group, .. } => Some(*group),
            VersionSource::Transitive { .. } => None,
        }
    }

    /// `(ecosystem, name, version)` of a transitive parent.
    ///
    /// An unprefixed parent shares the ecosystem of the `child` holding this
    /// source; see [`Ecosystem::parent_reference`].
    pub fn parent_of(&self, child: Ecosystem) -> Option<(Ecosystem, &str, &str)> {
        match self {
            VersionSource::Direct { .. } => None,
            VersionSource::Transitive {
                parent,
                parent_version,
                ..
            } => {
                let (ecosystem, name) = match parent.strip_prefix("jsr:") {
                    Some(name) => (Ecosystem::Jsr, name),
                    None => (child, parent.as_str()),
                };
                Some((ecosystem, name, parent_version.as_str()))
            }
        }
    }
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSource::Direct { manifest, group } => {
                write!(f, "{}#{}", manifest, group.as_str())
            }
            VersionSource::Transitive {
                lockfile,
                parent,
                parent_version,
            } => write!(f, "{}:{}@{}", lockfile, parent, parent_version),
        }
    }
}

impl FromStr for VersionSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((manifest, group)) = s.rsplit_once('#') {
            if let Ok(group) = group.parse::<DependencyGroup>() {
                return Ok(VersionSource::direct(manifest, group));
            }
        }

        // Scoped parents contain '@' themselves, so the version starts after the last one.
        let (lockfile, rest) = s
            .split_once(':')
            .ok_or_else(|| format!("malformed version source: {s}"))?;
        match rest.rsplit_once('@') {
            Some((parent, version)) if !parent.is_empty() && !version.is_empty() => {
                Ok(VersionSource::transitive(lockfile, parent, version))
            }
            _ => Err(format!("malformed version source: {s}")),
        }
    }
}

impl From<VersionSource> for String {
    fn from(source: VersionSource) -> Self {
        source.to_string()
    }
}

impl TryFrom<String> for VersionSource {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One resolved version of a dependency and how it got there
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry {
    /// Concrete version (or the specifier itself when no lockfile exists)
    pub resolved: String,
    /// Requested range
    pub specifier: String,
    /// Provenance
    pub source: VersionSource,
}

/// A package in the dependency inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    /// `"{ecosystem}:{normalized-name}"`
    pub id: String,
    /// Package name as first seen
    pub name: String,
    /// Ecosystem
    pub ecosystem: Ecosystem,
    /// Every resolved version, deduplicated by (resolved, source)
    pub versions: Vec<VersionEntry>,
    /// Registry package behind an alias (`"string-width-cjs": "npm:string-width@^4"`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
}

impl Dependency {
    /// Empty dependency record
    pub fn new(ecosystem: Ecosystem, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: ecosystem.dependency_id(&name),
            name,
            ecosystem,
            versions: Vec::new(),
            package: None,
        }
    }

    /// Name the registry and the lockfile know this package by
    pub fn package_name(&self) -> &str {
        self.package.as_deref().unwrap_or(&self.name)
    }

    /// Whether a transitive `parent` reference of ecosystem `ecosystem` names this package
    pub fn is_named(&self, ecosystem: Ecosystem, name: &str) -> bool {
        self.ecosystem == ecosystem
            && ecosystem.normalize_name(self.package_name()) == ecosystem.normalize_name(name)
    }

    /// Add a version entry unless the same (resolved, source) pair exists
    pub fn push_version(&mut self, entry: VersionEntry) -> bool {
        let duplicate = self
            .versions
            .iter()
            .any(|v| v.resolved == entry.resolved && v.source == entry.source);
        if !duplicate {
            self.versions.push(entry);
        }
        !duplicate
    }

    /// Whether any version entry has a direct source
    pub fn is_direct(&self) -> bool {
        self.versions.iter().any(|v| v.source.is_direct())
    }

    /// Direct version entries in declaration order
    pub fn direct_versions(&self) -> impl Iterator<Item = &VersionEntry> {
        self.versions.iter().filter(|v| v.source.is_direct())
    }
}

/// A manifest declaration before lockfile resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Package name as written
    pub name: String,
    /// Requested range (`"*"` when absent)
    pub specifier: String,
    /// Declaring group
    pub group: DependencyGroup,
    /// Ecosystem of the package
    pub ecosystem: Ecosystem,
}

impl ManifestEntry {
    /// Convenience constructor
    pub fn new(
        ecosystem: Ecosystem,
        name: impl Into<String>,
        specifier: impl Into<String>,
        group: DependencyGroup,
    ) -> Self {
        Self {
            name: name.into(),
            specifier: specifier.into(),
            group,
            ecosystem,
        }
    }

    /// Package behind an npm alias specifier (`npm:string-width@^4.2.0`), or
    /// the declared name
    pub fn package_name(&self) -> &str {
        if self.ecosystem != Ecosystem::Npm {
            return &self.name;
        }
        let Some(rest) = self.specifier.trim().strip_prefix("npm:") else {
            return &self.name;
        };
        let search_from = usize::from(rest.starts_with('@'));
        let end = rest[search_from..]
            .find('@')
            .map_or(rest.len(), |idx| idx + search_from);
        match &rest[..end] {
            "" => &self.name,
            target => target,
        }
    }
}

/// A direct dependency with newer versions available
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutdatedDependency {
    /// The dependency as found in the inventory
    #[serde(flatten)]
    pub dependency: Dependency,
    /// Highest stable version satisfying the specifier
    pub wanted: String,
    /// Newest stable version published
    pub latest: String,
    /// Requested range of the representative entry
    pub specifier: String,
    /// Whether the representative entry is a development dependency
    pub is_dev_dependency: bool,
}

/// One row of a flattened dependency tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyTreeEntry {
    /// Package name
    pub name: String,
    /// Resolved version
    pub version: String,
    /// Ecosystem
    pub ecosystem: Ecosystem,
    /// Inherited from the root entry of this subtree
    pub is_dev_dependency: bool,
    /// 0 for direct dependencies
    pub depth: usize,
    /// Last sibling at this level
    pub is_last: bool,
    /// Whether any child rows follow
    pub has_children: bool,
    /// `is_last` of every ancestor, outermost first
    pub ancestor_is_last_flags: Vec<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pypi_name_normalization() {
        assert_eq!(Ecosystem::Pypi.normalize_name("Flask_SQLAlchemy"), "flask-sqlalchemy");
        assert_eq!(Ecosystem::Pypi.normalize_name("zope.interface"), "zope-interface");
        assert_eq!(Ecosystem::Pypi.normalize_name("a--_b"), "a-b");
        assert_eq!(Ecosystem::Npm.normalize_name("React"), "React");
        assert_eq!(Ecosystem::Pypi.dependency_id("FastAPI"), "pypi:fastapi");
    }

    #[test]
    fn test_source_string_forms() {
        let direct = VersionSource::direct("package.json", DependencyGroup::DevDependencies);
        assert_eq!(direct.to_string(), "package.json#devDependencies");
        assert_eq!("package.json#devDependencies".parse::<VersionSource>().unwrap(), direct);

        let scoped = VersionSource::transitive("package-lock.json", "@types/node", "20.1.0");
        assert_eq!(scoped.to_string(), "package-lock.json:@types/node@20.1.0");
        assert_eq!(
            "package-lock.json:@types/node@20.1.0".parse::<VersionSource>().unwrap(),
            scoped
        );
    }

    #[test]
    fn test_jsr_parents_are_prefixed() {
        let source = VersionSource::transitive("deno.lock", Ecosystem::Jsr.parent_reference("@std/path"), "1.0.8");
        assert_eq!(source.to_string(), "deno.lock:jsr:@std/path@1.0.8");
        let back: VersionSource = source.to_string().parse().unwrap();
        assert_eq!(back.parent_of(Ecosystem::Npm), Some((Ecosystem::Jsr, "@std/path", "1.0.8")));

        let npm = VersionSource::transitive("deno.lock", "@std/path", "1.0.8");
        assert_eq!(npm.parent_of(Ecosystem::Npm), Some((Ecosystem::Npm, "@std/path", "1.0.8")));
        assert_eq!(
            VersionSource::direct("deno.json", DependencyGroup::Dependencies).parent_of(Ecosystem::Npm),
            None
        );
    }

    #[test]
    fn test_alias_package_names() {
        let alias = ManifestEntry::new(
            Ecosystem::Npm,
            "string-width-cjs",
            "npm:string-width@^4.2.0",
            DependencyGroup::Dependencies,
        );
        assert_eq!(alias.package_name(), "string-width");
        let scoped = ManifestEntry::new(Ecosystem::Npm, "pkg", "npm:@scope/pkg", DependencyGroup::Dependencies);
        assert_eq!(scoped.package_name(), "@scope/pkg");
        let plain = ManifestEntry::new(Ecosystem::Npm, "ms", "^2.1.0", DependencyGroup::Dependencies);
        assert_eq!(plain.package_name(), "ms");

        let mut dep = Dependency::new(Ecosystem::Npm, "string-width-cjs");
        assert!(!dep.is_named(Ecosystem::Npm, "string-width"));
        dep.package = Some("string-width".to_string());
        assert!(dep.is_named(Ecosystem::Npm, "string-width"));
        assert!(!dep.is_named(Ecosystem::Jsr, "string-width"));
        let json = serde_json::to_value(&dep).unwrap();
        assert_eq!(json["package"], "string-width");
    }

    #[test]
    fn test_source_rejects_garbage() {
        assert!("no-separators".parse::<VersionSource>().is_err());
        assert!("lock:@scope".parse::<VersionSource>().is_err());
    }

    #[test]
    fn test_dependency_serializes_camel_case() {
        let mut dep = Dependency::new(Ecosystem::Npm, "react");
        dep.push_version(VersionEntry {
            resolved: "18.2.0".to_string(),
            specifier: "^18.0.0".to_string(),
            source: VersionSource::direct("package.json", DependencyGroup::Dependencies),
        });
        let json = serde_json::to_value(&dep).unwrap();
        assert_eq!(json["id"], "npm:react");
        assert_eq!(json["ecosystem"], "npm");
        assert_eq!(json["versions"][0]["source"], "package.json#dependencies");
        assert!(json.get("package").is_none());

        let back: Dependency = serde_json::from_value(json).unwrap();
        assert_eq!(back, dep);
    }

    #[test]
    fn test_push_version_dedups() {
        let mut dep = Dependency::new(Ecosystem::Npm, "ms");
        let entry = VersionEntry {
            resolved: "2.1.3".to_string(),
            specifier: "^2.1.1".to_string(),
            source: VersionSource::transitive("package-lock.json", "debug", "4.3.4"),
        };
        assert!(dep.push_version(entry.clone()));
        assert!(!dep.push_version(entry));
        assert_eq!(dep.versions.len(), 1);
        assert!(!dep.is_direct());
    }

    #[test]
    fn test_outdated_flattens_dependency() {
        let outdated = OutdatedDependency {
            dependency: Dependency::new(Ecosystem::Pypi, "fastapi"),
            wanted: "0.120.0".to_string(),
            latest: "0.120.0".to_string(),
            specifier: ">=0.119.0".to_string(),
            is_dev_dependency: false,
        };
        let json = serde_json::to_value(&outdated).unwrap();
        assert_eq!(json["id"], "pypi:fastapi");
        assert_eq!(json["isDevDependency"], false);
        assert!(json.get("dependency").is_none());
    }
}
