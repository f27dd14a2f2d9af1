//! Compare direct dependencies against published registry versions

use crate::types::{Dependency, OutdatedDependency};
use deptrail_info::RegistryClient;
use futures::future::join_all;
use tracing::{debug, trace};

/// Direct dependencies whose wanted or latest version differs from the
/// resolved one.
///
/// Each dependency is represented by its first direct version entry.
/// Registry lookups run concurrently; a package whose lookup fails is left
/// out of the result. Output follows input order.
pub async fn check_outdated<R>(
    dependencies: &[Dependency],
    registry: &R,
    use_cache: bool,
) -> Vec<OutdatedDependency>
where
    R: RegistryClient + ?Sized,
{
    let candidates: Vec<&Dependency> = dependencies
        .iter()
        .filter(|dep| dep.is_direct() && dep.ecosystem.registry().is_some())
        .collect();
    debug!(count = candidates.len(), use_cache, "checking registries for outdated dependencies");

    let checks = candidates
        .into_iter()
        .map(|dep| check_one(dep, registry, use_cache));
    join_all(checks).await.into_iter().flatten().collect()
}

async fn check_one<R>(dep: &Dependency, registry: &R, use_cache: bool) -> Option<OutdatedDependency>
where
    R: RegistryClient + ?Sized,
{
    let current = dep.direct_versions().next()?;
    let info = registry
        .fetch(dep.ecosystem.registry()?, dep.package_name(), use_cache)
        .await?;

    let grammar = dep.ecosystem.grammar();
    let wanted = grammar.wanted(&current.resolved, &current.specifier, &info.versions);
    let latest = grammar
        .latest(info.latest.as_deref(), &info.versions)
        .unwrap_or_else(|| current.resolved.clone());

    if wanted == current.resolved && latest == current.resolved {
        trace!(name = %dep.name, version = %current.resolved, "up to date");
        return None;
    }

    Some(OutdatedDependency {
        dependency: dep.clone(),
        wanted,
        latest,
        specifier: current.specifier.clone(),
        is_dev_dependency: current.source.group().is_some_and(|g| g.is_dev()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DependencyGroup, Ecosystem, VersionEntry, VersionSource};
    use deptrail_info::{PackageVersions, Registry};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct StaticRegistry {
        packages: HashMap<String, PackageVersions>,
        calls: AtomicUsize,
    }

    impl StaticRegistry {
        fn with(mut self, registry: Registry, name: &str, versions: &[&str], latest: Option<&str>) -> Self {
            self.packages.insert(
                name.to_string(),
                PackageVersions {
                    registry,
                    name: name.to_string(),
                    versions: versions.iter().map(|v| v.to_string()).collect(),
                    latest: latest.map(str::to_string),
                },
            );
            self
        }
    }

    #[async_trait::async_trait]
    impl RegistryClient for StaticRegistry {
        async fn fetch(&self, _registry: Registry, name: &str, _use_cache: bool) -> Option<PackageVersions> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.packages.get(name).cloned()
        }
    }

    fn direct(ecosystem: Ecosystem, name: &str, resolved: &str, specifier: &str, group: DependencyGroup) -> Dependency {
        let mut dep = Dependency::new(ecosystem, name);
        dep.push_version(VersionEntry {
            resolved: resolved.to_string(),
            specifier: specifier.to_string(),
            source: VersionSource::direct("manifest", group),
        });
        dep
    }

    #[tokio::test]
    async fn test_reports_wanted_and_latest() {
        let registry = StaticRegistry::default()
            .with(Registry::Npm, "react", &["17.0.2", "18.2.0", "18.3.1", "19.0.0", "19.1.0-rc.1"], Some("19.0.0"))
            .with(Registry::Npm, "lodash", &["4.17.21"], Some("4.17.21"));
        let deps = vec![
            direct(Ecosystem::Npm, "react", "18.2.0", "^18.0.0", DependencyGroup::Dependencies),
            direct(Ecosystem::Npm, "lodash", "4.17.21", "^4.17.0", DependencyGroup::Dependencies),
        ];

        let outdated = check_outdated(&deps, &registry, true).await;
        assert_eq!(outdated.len(), 1);
        assert_eq!(outdated[0].dependency.name, "react");
        assert_eq!(outdated[0].wanted, "18.3.1");
        assert_eq!(outdated[0].latest, "19.0.0");
        assert_eq!(outdated[0].specifier, "^18.0.0");
        assert!(!outdated[0].is_dev_dependency);
    }

    #[tokio::test]
    async fn test_skips_transitive_unversioned_and_unavailable() {
        let registry = StaticRegistry::default().with(Registry::RubyGems, "rails", &["8.0.1", "8.0.2"], None);
        let mut transitive = Dependency::new(Ecosystem::Npm, "ms");
        transitive.push_version(VersionEntry {
            resolved: "2.1.3".to_string(),
            specifier: "^2.1.1".to_string(),
            source: VersionSource::transitive("package-lock.json", "debug", "4.3.4"),
        });
        let deps = vec![
            transitive,
            // Declared but not in the lockfile: no version entries at all
            Dependency::new(Ecosystem::Rubygems, "rails"),
            direct(Ecosystem::Npm, "unknown", "1.0.0", "^1.0.0", DependencyGroup::Dependencies),
            Dependency::new(Ecosystem::System, "npm"),
        ];

        assert!(check_outdated(&deps, &registry, true).await.is_empty());
        assert_eq!(registry.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_alias_is_checked_under_its_package_name() {
        let registry = StaticRegistry::default().with(Registry::Npm, "string-width", &["4.2.3", "5.1.2"], Some("5.1.2"));
        let mut alias = direct(
            Ecosystem::Npm,
            "string-width-cjs",
            "4.2.3",
            "npm:string-width@^4.2.0",
            DependencyGroup::Dependencies,
        );
        alias.package = Some("string-width".to_string());

        let outdated = check_outdated(&[alias], &registry, true).await;
        assert_eq!(outdated.len(), 1);
        assert_eq!(outdated[0].dependency.name, "string-width-cjs");
        assert_eq!(outdated[0].wanted, "4.2.3");
        assert_eq!(outdated[0].latest, "5.1.2");
    }

    #[tokio::test]
    async fn test_pypi_and_dev_group() {
        let registry = StaticRegistry::default().with(Registry::PyPi, "fastapi", &["0.119.0", "0.120.0"], Some("0.120.0"));
        let deps = vec![direct(
            Ecosystem::Pypi,
            "fastapi",
            "0.119.0",
            ">=0.119.0",
            DependencyGroup::DevDependencies,
        )];

        let outdated = check_outdated(&deps, &registry, false).await;
        assert_eq!(outdated[0].wanted, "0.120.0");
        assert_eq!(outdated[0].latest, "0.120.0");
        assert!(outdated[0].is_dev_dependency);
    }
}
