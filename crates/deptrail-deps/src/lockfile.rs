//! Ecosystem-neutral view of a parsed lockfile

use crate::types::{Ecosystem, ManifestEntry};
use std::collections::BTreeMap;

/// A dependency edge recorded in a lockfile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockEdge {
    /// Ecosystem of the target package
    pub ecosystem: Ecosystem,
    /// Target package name
    pub name: String,
    /// Requested range, when the lockfile records it
    pub requirement: Option<String>,
    /// Exact resolved version, when the lockfile records it
    pub version: Option<String>,
    /// Name the parent installs the target under, when it differs from `name`
    pub alias: Option<String>,
}

impl LockEdge {
    /// Edge with neither requirement nor version
    pub fn new(ecosystem: Ecosystem, name: impl Into<String>) -> Self {
        Self {
            ecosystem,
            name: name.into(),
            requirement: None,
            version: None,
            alias: None,
        }
    }

    /// Set the requested range
    pub fn with_requirement(mut self, requirement: impl Into<String>) -> Self {
        self.requirement = Some(requirement.into());
        self
    }

    /// Set the exact version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Record the install name when it differs from the package name
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        if alias != self.name {
            self.alias = Some(alias);
        }
        self
    }

    /// Name the parent refers to the target by
    pub fn install_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// One resolved package in a lockfile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedPackage {
    /// Package name as written in the lockfile
    pub name: String,
    /// Resolved version
    pub version: String,
    /// Ecosystem
    pub ecosystem: Ecosystem,
    /// Outgoing edges
    pub dependencies: Vec<LockEdge>,
}

impl LockedPackage {
    /// Package without edges
    pub fn new(ecosystem: Ecosystem, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ecosystem,
            dependencies: Vec::new(),
        }
    }
}

/// The workspace root recorded by a lockfile
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootPackage {
    /// Name of the root project, when the lockfile lists it as a package
    pub name: Option<String>,
    /// Edges from the root to the direct dependencies
    pub dependencies: Vec<LockEdge>,
}

type PackageKey = (Ecosystem, String);

/// Everything a lockfile says about installed packages.
///
/// Several versions of one package are kept in first-seen order; inserting
/// an already-known version again is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockfileData {
    /// Lockfile path used in transitive source strings
    pub lockfile: String,
    /// Workspace root marker, if the format has one
    pub root: Option<RootPackage>,
    packages: BTreeMap<PackageKey, Vec<LockedPackage>>,
}

impl LockfileData {
    /// Empty lockfile data
    pub fn new(lockfile: impl Into<String>) -> Self {
        Self {
            lockfile: lockfile.into(),
            root: None,
            packages: BTreeMap::new(),
        }
    }

    fn key(ecosystem: Ecosystem, name: &str) -> PackageKey {
        (ecosystem, ecosystem.normalize_name(name))
    }

    /// Add a package; returns false when this version was already present
    pub fn insert(&mut self, package: LockedPackage) -> bool {
        let entry = self
            .packages
            .entry(Self::key(package.ecosystem, &package.name))
            .or_default();
        if entry.iter().any(|p| p.version == package.version) {
            return false;
        }
        entry.push(package);
        true
    }

    /// Mutable access to one locked version
    pub fn package_mut(
        &mut self,
        ecosystem: Ecosystem,
        name: &str,
        version: &str,
    ) -> Option<&mut LockedPackage> {
        self.packages
            .get_mut(&Self::key(ecosystem, name))?
            .iter_mut()
            .find(|p| p.version == version)
    }

    /// Every locked version of a package, in first-seen order
    pub fn versions_of(&self, ecosystem: Ecosystem, name: &str) -> &[LockedPackage] {
        self.packages
            .get(&Self::key(ecosystem, name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// One exact locked version
    pub fn find(&self, ecosystem: Ecosystem, name: &str, version: &str) -> Option<&LockedPackage> {
        self.versions_of(ecosystem, name)
            .iter()
            .find(|p| p.version == version)
    }

    /// All packages ordered by (ecosystem, normalized name), then first-seen version
    pub fn packages(&self) -> impl Iterator<Item = &LockedPackage> {
        self.packages.values().flatten()
    }

    /// Number of locked package versions
    pub fn len(&self) -> usize {
        self.packages.values().map(Vec::len).sum()
    }

    /// Whether no packages are locked
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Whether the package is the workspace root itself
    pub fn is_root(&self, ecosystem: Ecosystem, name: &str) -> bool {
        self.root
            .as_ref()
            .and_then(|root| root.name.as_deref())
            .is_some_and(|root| Self::key(ecosystem, root) == Self::key(ecosystem, name))
    }

    /// Resolve an edge to a locked package: the exact version when recorded,
    /// else the highest version satisfying the requirement, else the first seen.
    pub fn resolve_edge(&self, edge: &LockEdge) -> Option<&LockedPackage> {
        let candidates = self.versions_of(edge.ecosystem, &edge.name);
        if let Some(version) = edge.version.as_deref() {
            if let Some(exact) = candidates.iter().find(|p| p.version == version) {
                return Some(exact);
            }
        }
        if let Some(requirement) = edge.requirement.as_deref() {
            if let Some(best) = self.best_match(edge.ecosystem, candidates, requirement) {
                return Some(best);
            }
        }
        candidates.first()
    }

    /// Locked package backing a manifest declaration
    pub fn resolve_direct(&self, entry: &ManifestEntry) -> Option<&LockedPackage> {
        let wanted = Self::key(entry.ecosystem, &entry.name);
        if let Some(root) = &self.root {
            let edges: Vec<&LockEdge> = root
                .dependencies
                .iter()
                .filter(|e| Self::key(e.ecosystem, e.install_name()) == wanted)
                .collect();
            let preferred = edges
                .iter()
                .find(|e| e.requirement.as_deref() == Some(entry.specifier.as_str()))
                .or_else(|| edges.first());
            if let Some(resolved) = preferred.and_then(|edge| self.resolve_edge(edge)) {
                return Some(resolved);
            }
        }

        let candidates = self.versions_of(entry.ecosystem, entry.package_name());
        self.best_match(entry.ecosystem, candidates, &entry.specifier)
            .or_else(|| candidates.first())
    }

    fn best_match<'a>(
        &self,
        ecosystem: Ecosystem,
        candidates: &'a [LockedPackage],
        requirement: &str,
    ) -> Option<&'a LockedPackage> {
        let grammar = ecosystem.grammar();
        let best = grammar.max_version(
            candidates
                .iter()
                .map(|p| p.version.as_str())
                .filter(|v| grammar.satisfies(v, requirement)),
        )?;
        candidates.iter().find(|p| p.version == best)
    }

    /// Packages whose edges resolve to `name@version`
    pub fn parents_of(
        &self,
        ecosystem: Ecosystem,
        name: &str,
        version: &str,
    ) -> Vec<(&LockedPackage, &LockEdge)> {
        let target = Self::key(ecosystem, name);
        self.packages()
            .flat_map(|parent| parent.dependencies.iter().map(move |edge| (parent, edge)))
            .filter(|(_, edge)| Self::key(edge.ecosystem, &edge.name) == target)
            .filter(|(_, edge)| {
                self.resolve_edge(edge)
                    .is_some_and(|resolved| resolved.version == version)
            })
            .collect()
    }

    /// Reverse adjacency for every locked package, computed in one pass:
    /// `(ecosystem, normalized name, version)` → parents with the edge used.
    pub fn reverse_edges(&self) -> BTreeMap<(Ecosystem, String, String), Vec<(&LockedPackage, &LockEdge)>> {
        let mut reverse: BTreeMap<_, Vec<_>> = BTreeMap::new();
        for parent in self.packages() {
            for edge in &parent.dependencies {
                if let Some(child) = self.resolve_edge(edge) {
                    let (ecosystem, name) = Self::key(child.ecosystem, &child.name);
                    reverse
                        .entry((ecosystem, name, child.version.clone()))
                        .or_default()
                        .push((parent, edge));
                }
            }
        }
        reverse
    }
}
