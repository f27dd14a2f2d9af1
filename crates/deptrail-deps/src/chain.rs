//! Reverse "why is this installed" chains

use crate::types::{Dependency, Ecosystem, VersionEntry, VersionSource};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Upper bound on parent hops when walking a chain
pub const MAX_CHAIN_HOPS: usize = 50;

/// One package in a reverse chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainLink {
    /// Package name
    pub name: String,
    /// Resolved version
    pub version: String,
    /// Ecosystem
    pub ecosystem: Ecosystem,
    /// Where this version came from
    pub source: VersionSource,
}

/// Chain from a direct dependency down to `name@version` reached via `source`.
///
/// The first link is always the direct dependency and the last one is the
/// target. Returns `None` when a parent cannot be found or the walk exceeds
/// [`MAX_CHAIN_HOPS`].
pub fn trace_chain(
    dependencies: &[Dependency],
    name: &str,
    version: &str,
    source: &VersionSource,
) -> Option<Vec<ChainLink>> {
    let target = find_target(dependencies, name, version, source)?;
    let mut chain = vec![ChainLink {
        name: target.name.clone(),
        version: version.to_string(),
        ecosystem: target.ecosystem,
        source: source.clone(),
    }];

    let mut current = source.clone();
    let mut ecosystem = target.ecosystem;
    for _ in 0..MAX_CHAIN_HOPS {
        let Some((parent_ecosystem, parent, parent_version)) = current.parent_of(ecosystem) else {
            chain.reverse();
            return Some(chain);
        };

        let Some((dep, entry)) = find_entry(dependencies, parent_ecosystem, parent, parent_version) else {
            trace!(parent = %parent, version = %parent_version, "dangling parent reference");
            return None;
        };
        chain.push(ChainLink {
            name: dep.name.clone(),
            version: entry.resolved.clone(),
            ecosystem: dep.ecosystem,
            source: entry.source.clone(),
        });
        ecosystem = dep.ecosystem;
        current = entry.source.clone();
    }

    if current.is_direct() {
        chain.reverse();
        return Some(chain);
    }
    trace!(name, version, "chain exceeded hop limit");
    None
}

/// Every chain leading to any version of `name`, across ecosystems
pub fn why(dependencies: &[Dependency], name: &str) -> Vec<Vec<ChainLink>> {
    named(dependencies, name)
        .flat_map(|dep| {
            dep.versions.iter().filter_map(move |entry| {
                trace_chain(dependencies, &dep.name, &entry.resolved, &entry.source)
            })
        })
        .collect()
}

/// Dependencies called `name`, using each ecosystem's name normalization
fn named<'a>(dependencies: &'a [Dependency], name: &'a str) -> impl Iterator<Item = &'a Dependency> {
    dependencies
        .iter()
        .filter(|dep| dep.ecosystem != Ecosystem::System)
        .filter(move |dep| dep.ecosystem.normalize_name(&dep.name) == dep.ecosystem.normalize_name(name))
}

/// The dependency owning `version` via `source`, else the first one called `name`
fn find_target<'a>(
    dependencies: &'a [Dependency],
    name: &'a str,
    version: &str,
    source: &VersionSource,
) -> Option<&'a Dependency> {
    named(dependencies, name)
        .find(|dep| {
            dep.versions
                .iter()
                .any(|v| v.resolved == version && &v.source == source)
        })
        .or_else(|| named(dependencies, name).next())
}

/// The parent's entry for `version`, preferring a direct one so chains stay short
fn find_entry<'a>(
    dependencies: &'a [Dependency],
    ecosystem: Ecosystem,
    name: &str,
    version: &str,
) -> Option<(&'a Dependency, &'a VersionEntry)> {
    let mut matching = dependencies
        .iter()
        .filter(|dep| dep.is_named(ecosystem, name))
        .flat_map(|dep| dep.versions.iter().map(move |v| (dep, v)))
        .filter(|(_, v)| v.resolved == version);
    let first = matching.clone().next()?;
    Some(matching.find(|(_, v)| v.source.is_direct()).unwrap_or(first))
}
