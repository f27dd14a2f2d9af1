//! Integration tests for deptrail-deps
//!
//! These run whole projects through `Inventory`: files on a filesystem,
//! parsed, merged and checked against a stub registry.

use deptrail_deps::{
    Dependency, DependencyGroup, Ecosystem, Inventory, PackageManager, VersionSource,
};
use deptrail_fs::{FileSystem, MemoryFileSystem, NativeFileSystem};
use deptrail_info::{PackageVersions, Registry, RegistryClient};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Registry answering from a fixed table and counting lookups
#[derive(Default)]
struct StubRegistry {
    packages: HashMap<(Registry, String), PackageVersions>,
    calls: AtomicUsize,
}

impl StubRegistry {
    fn with(mut self, registry: Registry, name: &str, versions: &[&str], latest: &str) -> Self {
        self.packages.insert(
            (registry, name.to_string()),
            PackageVersions {
                registry,
                name: name.to_string(),
                versions: versions.iter().map(|v| v.to_string()).collect(),
                latest: Some(latest.to_string()),
            },
        );
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RegistryClient for StubRegistry {
    async fn fetch(&self, registry: Registry, name: &str, _use_cache: bool) -> Option<PackageVersions> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.packages.get(&(registry, name.to_string())).cloned()
    }
}

fn project(files: &[(&str, &str)], registry: StubRegistry) -> Inventory<MemoryFileSystem, StubRegistry> {
    let fs = MemoryFileSystem::new("/project").unwrap();
    for (path, text) in files {
        fs.add_file(format!("/project/{path}"), *text).unwrap();
    }
    Inventory::new(Arc::new(fs), "/project", registry)
}

fn find<'a>(deps: &'a [Dependency], id: &str) -> &'a Dependency {
    deps.iter()
        .find(|d| d.id == id)
        .unwrap_or_else(|| panic!("{id} missing"))
}

const PYPROJECT: &str = r#"
[project]
name = "api"
version = "0.1.0"
dependencies = ["fastapi>=0.119.0"]
"#;

const UV_LOCK: &str = r#"
version = 1

[[package]]
name = "api"
version = "0.1.0"
source = { editable = "." }
dependencies = [{ name = "fastapi" }]

[[package]]
name = "fastapi"
version = "0.119.0"
source = { registry = "https://pypi.org/simple" }
dependencies = [{ name = "starlette" }]

[[package]]
name = "starlette"
version = "0.48.0"
source = { registry = "https://pypi.org/simple" }
"#;

#[tokio::test]
async fn test_uv_project_reports_outdated_fastapi() {
    let registry = StubRegistry::default().with(
        Registry::PyPi,
        "fastapi",
        &["0.119.0", "0.120.0"],
        "0.120.0",
    );
    let inventory = project(&[("pyproject.toml", PYPROJECT), ("uv.lock", UV_LOCK)], registry);

    assert_eq!(inventory.detect().await, vec![PackageManager::Uv]);

    let outdated = inventory.outdated(PackageManager::Uv, true).await;
    assert_eq!(outdated.len(), 1);
    assert_eq!(outdated[0].dependency.name, "fastapi");
    assert_eq!(outdated[0].wanted, "0.120.0");
    assert_eq!(outdated[0].latest, "0.120.0");
    assert_eq!(outdated[0].specifier, ">=0.119.0");

    let deps = inventory.dependencies(PackageManager::Uv).await;
    let starlette = find(&deps, "pypi:starlette");
    assert_eq!(starlette.versions[0].source.to_string(), "uv.lock:fastapi@0.119.0");
    assert!(deps.iter().all(|d| d.id != "pypi:api"));
}

#[tokio::test]
async fn test_bundler_dependency_missing_from_lockfile_is_skipped() {
    let gemfile = "source \"https://rubygems.org\"\n\ngem \"rails\", \"~> 8.0.1\"\ngem \"rack\"\n";
    let lock = r#"GEM
  remote: https://rubygems.org/
  specs:
    rack (3.1.8)

PLATFORMS
  ruby

DEPENDENCIES
  rack

BUNDLED WITH
   2.5.22
"#;
    let registry = StubRegistry::default().with(Registry::RubyGems, "rack", &["3.1.8"], "3.1.8");
    let inventory = project(&[("Gemfile", gemfile), ("Gemfile.lock", lock)], registry);

    let deps = inventory.dependencies(PackageManager::Bundler).await;
    assert!(find(&deps, "rubygems:rails").versions.is_empty());
    assert_eq!(find(&deps, "rubygems:rack").versions[0].resolved, "3.1.8");

    assert!(inventory.outdated(PackageManager::Bundler, true).await.is_empty());
    // rails never reaches the registry
    assert_eq!(inventory.registry().calls(), 1);
}

const DIAMOND_LOCK: &str = r#"{
    "name": "app",
    "lockfileVersion": 3,
    "packages": {
        "": { "dependencies": { "a": "^1.0.0", "b": "^1.0.0" } },
        "node_modules/a": { "version": "1.0.0", "dependencies": { "lodash": "^4.17.0" } },
        "node_modules/b": { "version": "1.2.0", "dependencies": { "lodash": "^4.17.21" } },
        "node_modules/lodash": { "version": "4.17.21" }
    }
}"#;

const DIAMOND_MANIFEST: &str = r#"{ "dependencies": { "a": "^1.0.0", "b": "^1.0.0" } }"#;

#[tokio::test]
async fn test_shared_transitive_appears_under_each_parent() {
    let inventory = project(
        &[("package.json", DIAMOND_MANIFEST), ("package-lock.json", DIAMOND_LOCK)],
        StubRegistry::default(),
    );

    let rows = inventory.tree(PackageManager::Npm, Some(10), None).await;
    let rendered: Vec<_> = rows
        .iter()
        .map(|r| format!("{}{}@{}", "  ".repeat(r.depth), r.name, r.version))
        .collect();
    assert_eq!(
        rendered,
        vec!["a@1.0.0", "  lodash@4.17.21", "b@1.2.0", "  lodash@4.17.21"]
    );

    let chains = inventory.why(PackageManager::Npm, "lodash").await;
    assert_eq!(chains.len(), 2);
    assert_eq!(chains[0][0].name, "a");
    assert_eq!(chains[1][0].name, "b");
}

#[tokio::test]
async fn test_cyclic_lockfile_terminates() {
    let lock = r#"{
        "lockfileVersion": 3,
        "packages": {
            "": { "dependencies": { "a": "1.0.0" } },
            "node_modules/a": { "version": "1.0.0", "dependencies": { "b": "1.0.0" } },
            "node_modules/b": { "version": "1.0.0", "dependencies": { "c": "1.0.0" } },
            "node_modules/c": { "version": "1.0.0", "dependencies": { "b": "1.0.0" } }
        }
    }"#;
    let inventory = project(
        &[("package.json", r#"{ "dependencies": { "a": "1.0.0" } }"#), ("package-lock.json", lock)],
        StubRegistry::default(),
    );

    let rows = inventory.tree(PackageManager::Npm, Some(10), None).await;
    let names: Vec<_> = rows.iter().map(|r| (r.name.as_str(), r.depth)).collect();
    assert_eq!(names, vec![("a", 0), ("b", 1), ("c", 2)]);
    assert!(!rows[2].has_children);
}

#[tokio::test]
async fn test_rebuilding_is_idempotent() {
    let inventory = project(
        &[("package.json", DIAMOND_MANIFEST), ("package-lock.json", DIAMOND_LOCK)],
        StubRegistry::default(),
    );

    let first = inventory.dependencies(PackageManager::Npm).await;
    let second = inventory.dependencies(PackageManager::Npm).await;
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );

    let lodash = find(&first, "npm:lodash");
    assert_eq!(lodash.versions.len(), 2);
    assert!(lodash.versions.iter().all(|v| v.resolved == "4.17.21"));
}

#[tokio::test]
async fn test_deno_project_mixes_npm_and_jsr() {
    let deno_json = r#"{
        // import map
        "imports": {
            "@std/path": "jsr:@std/path@^1.0.0",
            "chalk": "npm:chalk@^5.3.0"
        }
    }"#;
    let deno_lock = r#"{
        "version": "4",
        "specifiers": {
            "jsr:@std/internal@^1.0.5": "1.0.5",
            "jsr:@std/path@^1.0.0": "1.0.8",
            "npm:chalk@^5.3.0": "5.3.0"
        },
        "jsr": {
            "@std/internal@1.0.5": { "integrity": "a" },
            "@std/path@1.0.8": { "integrity": "b", "dependencies": ["jsr:@std/internal@^1.0.5"] }
        },
        "npm": {
            "chalk@5.3.0": { "integrity": "c" }
        },
        "workspace": { "dependencies": ["jsr:@std/path@^1.0.0", "npm:chalk@^5.3.0"] }
    }"#;
    let registry = StubRegistry::default()
        .with(Registry::Jsr, "@std/path", &["1.0.8", "1.1.0"], "1.1.0")
        .with(Registry::Npm, "chalk", &["5.3.0"], "5.3.0");
    let inventory = project(&[("deno.json", deno_json), ("deno.lock", deno_lock)], registry);

    let deps = inventory.dependencies(PackageManager::Deno).await;
    let path = find(&deps, "jsr:@std/path");
    assert_eq!(path.versions[0].resolved, "1.0.8");
    assert_eq!(
        path.versions[0].source,
        VersionSource::direct("deno.json", DependencyGroup::Dependencies)
    );
    let internal = find(&deps, "jsr:@std/internal");
    assert_eq!(internal.versions[0].source.to_string(), "deno.lock:jsr:@std/path@1.0.8");

    let outdated = inventory.outdated(PackageManager::Deno, false).await;
    assert_eq!(outdated.len(), 1);
    assert_eq!(outdated[0].dependency.ecosystem, Ecosystem::Jsr);
    assert_eq!(outdated[0].wanted, "1.1.0");

    let jsr_only = inventory.tree(PackageManager::Deno, None, Some(Ecosystem::Jsr)).await;
    let names: Vec<_> = jsr_only.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["@std/path", "@std/internal"]);
}

const ALIAS_MANIFEST: &str = r#"{ "dependencies": { "string-width-cjs": "npm:string-width@^4.2.0" } }"#;

fn assert_alias_resolved(deps: &[Dependency], lockfile: &str) {
    let alias = find(deps, "npm:string-width-cjs");
    assert_eq!(alias.package.as_deref(), Some("string-width"));
    assert_eq!(alias.versions.len(), 1);
    assert_eq!(alias.versions[0].resolved, "4.2.3");
    assert_eq!(alias.versions[0].specifier, "npm:string-width@^4.2.0");

    let strip = find(deps, "npm:strip-ansi");
    assert_eq!(strip.versions[0].source.to_string(), format!("{lockfile}:string-width@4.2.3"));
}

#[tokio::test]
async fn test_npm_alias_resolves_through_real_package() {
    let lock = r#"{
        "lockfileVersion": 3,
        "packages": {
            "": { "dependencies": { "string-width-cjs": "npm:string-width@^4.2.0" } },
            "node_modules/string-width-cjs": {
                "name": "string-width",
                "version": "4.2.3",
                "dependencies": { "strip-ansi": "^6.0.1" }
            },
            "node_modules/strip-ansi": { "version": "6.0.1" }
        }
    }"#;
    let registry = StubRegistry::default().with(Registry::Npm, "string-width", &["4.2.3", "5.1.2"], "5.1.2");
    let inventory = project(&[("package.json", ALIAS_MANIFEST), ("package-lock.json", lock)], registry);

    let deps = inventory.dependencies(PackageManager::Npm).await;
    assert_alias_resolved(&deps, "package-lock.json");

    let rows = inventory.tree(PackageManager::Npm, None, None).await;
    let rendered: Vec<_> = rows
        .iter()
        .map(|r| format!("{}{}@{}", "  ".repeat(r.depth), r.name, r.version))
        .collect();
    assert_eq!(rendered, vec!["string-width-cjs@4.2.3", "  strip-ansi@6.0.1"]);

    let chains = inventory.why(PackageManager::Npm, "strip-ansi").await;
    assert_eq!(chains.len(), 1);
    assert_eq!(chains[0][0].name, "string-width-cjs");

    let outdated = inventory.outdated(PackageManager::Npm, true).await;
    assert_eq!(outdated.len(), 1);
    assert_eq!(outdated[0].dependency.name, "string-width-cjs");
    assert_eq!(outdated[0].wanted, "4.2.3");
    assert_eq!(outdated[0].latest, "5.1.2");
}

#[tokio::test]
async fn test_pnpm_alias_resolves_through_real_package() {
    let lock = r#"lockfileVersion: '9.0'

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
"#;
    let inventory = project(
        &[("package.json", ALIAS_MANIFEST), ("pnpm-lock.yaml", lock)],
        StubRegistry::default(),
    );

    let deps = inventory.dependencies(PackageManager::Pnpm).await;
    assert_alias_resolved(&deps, "pnpm-lock.yaml");

    let rows = inventory.tree(PackageManager::Pnpm, None, None).await;
    let names: Vec<_> = rows.iter().map(|r| (r.name.as_str(), r.depth)).collect();
    assert_eq!(names, vec![("string-width-cjs", 0), ("strip-ansi", 1)]);
}

#[tokio::test]
async fn test_pnpm_project_on_disk() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(
        dir.path().join("package.json"),
        r#"{ "devDependencies": { "react-dom": "^18.2.0" } }"#,
    )?;
    std::fs::write(
        dir.path().join("pnpm-lock.yaml"),
        r#"lockfileVersion: '9.0'

importers:
  .:
    devDependencies:
      react-dom:
        specifier: ^18.2.0
        version: 18.2.0(react@18.2.0)

packages:
  loose-envify@1.4.0: {}
  react@18.2.0: {}
  react-dom@18.2.0: {}

snapshots:
  loose-envify@1.4.0: {}
  react@18.2.0:
    dependencies:
      loose-envify: 1.4.0
  react-dom@18.2.0(react@18.2.0):
    dependencies:
      loose-envify: 1.4.0
      react: 18.2.0
"#,
    )?;

    let fs = Arc::new(NativeFileSystem::new(dir.path())?);
    let root = fs.project_root().to_path_buf();
    let inventory = Inventory::new(fs, root, StubRegistry::default());

    assert_eq!(inventory.detect().await, vec![PackageManager::Pnpm]);

    let rows = inventory.tree(PackageManager::Pnpm, None, None).await;
    let rendered: Vec<_> = rows
        .iter()
        .map(|r| format!("{}{}", "  ".repeat(r.depth), r.name))
        .collect();
    assert_eq!(
        rendered,
        vec!["react-dom", "  loose-envify", "  react", "    loose-envify"]
    );
    assert!(rows.iter().all(|r| r.is_dev_dependency));
    assert_eq!(rows[3].ancestor_is_last_flags, vec![true, true]);
    Ok(())
}
