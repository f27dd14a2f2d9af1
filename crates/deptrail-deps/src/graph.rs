//! Merge manifest declarations and lockfile state into the dependency inventory

use crate::lockfile::LockfileData;
use crate::types::{Dependency, Ecosystem, ManifestEntry, VersionEntry, VersionSource};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

/// Build the dependency set for one manifest/lockfile pair.
///
/// - every manifest entry becomes a direct [`VersionEntry`] (resolved through
///   the lockfile, or the raw specifier when there is no lockfile; a lockfile
///   that does not know the package leaves the dependency without versions)
/// - every other locked package gets one transitive entry per parent edge
/// - one versionless `system` dependency names the package manager
///
/// The result is sorted by name, then ecosystem, and is identical for
/// identical inputs.
pub fn build_dependencies(
    manifest: &[ManifestEntry],
    lockfile: Option<&LockfileData>,
    manifest_path: &str,
    system_name: &str,
) -> Vec<Dependency> {
    let mut deps: BTreeMap<(Ecosystem, String), Dependency> = BTreeMap::new();

    for entry in manifest {
        let key = (entry.ecosystem, entry.ecosystem.normalize_name(&entry.name));
        let dep = deps
            .entry(key)
            .or_insert_with(|| Dependency::new(entry.ecosystem, &entry.name));

        let resolved = match lockfile {
            Some(lock) => match lock.resolve_direct(entry) {
                Some(package) => {
                    if entry.ecosystem.normalize_name(&package.name) != entry.ecosystem.normalize_name(&entry.name) {
                        dep.package.get_or_insert_with(|| package.name.clone());
                    }
                    package.version.clone()
                }
                None => {
                    debug!(name = %entry.name, lockfile = %lock.lockfile, "declared dependency missing from lockfile");
                    continue;
                }
            },
            None => {
                if entry.package_name() != entry.name {
                    dep.package.get_or_insert_with(|| entry.package_name().to_string());
                }
                entry.specifier.clone()
            }
        };
        dep.push_version(VersionEntry {
            resolved,
            specifier: entry.specifier.clone(),
            source: VersionSource::direct(manifest_path, entry.group),
        });
    }

    if let Some(lock) = lockfile {
        add_transitive(&mut deps, lock);
    }

    let mut out: Vec<Dependency> = deps.into_values().collect();
    out.push(Dependency::new(Ecosystem::System, system_name));
    out.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| a.ecosystem.as_str().cmp(b.ecosystem.as_str()))
    });
    out
}

fn add_transitive(deps: &mut BTreeMap<(Ecosystem, String), Dependency>, lock: &LockfileData) {
    let direct: BTreeSet<(Ecosystem, String)> = deps.keys().cloned().collect();
    let reverse = lock.reverse_edges();

    for package in lock.packages() {
        let normalized = package.ecosystem.normalize_name(&package.name);
        let key = (package.ecosystem, normalized);
        if direct.contains(&key) || lock.is_root(package.ecosystem, &package.name) {
            continue;
        }

        let Some(parents) = reverse.get(&(key.0, key.1.clone(), package.version.clone())) else {
            trace!(name = %package.name, version = %package.version, "locked package has no parent, skipping");
            continue;
        };

        let dep = deps
            .entry(key)
            .or_insert_with(|| Dependency::new(package.ecosystem, &package.name));
        for (parent, edge) in parents {
            let specifier = edge
                .requirement
                .clone()
                .or_else(|| edge.version.clone())
                .unwrap_or_else(|| "*".to_string());
            dep.push_version(VersionEntry {
                resolved: package.version.clone(),
                specifier,
                source: VersionSource::transitive(
                    &lock.lockfile,
                    parent.ecosystem.parent_reference(&parent.name),
                    &parent.version,
                ),
            });
        }
    }
}
