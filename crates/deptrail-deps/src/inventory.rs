//! Project-level entry point tying parsers, graph, registry and tree together

use crate::chain::{self, ChainLink};
use crate::error::{Error, Result};
use crate::graph::build_dependencies;
use crate::lockfile::LockfileData;
use crate::manager::PackageManager;
use crate::outdated::check_outdated;
use crate::tree::build_tree;
use crate::types::{Dependency, DependencyTreeEntry, Ecosystem, ManifestEntry, OutdatedDependency};
use deptrail_config::{ConfigManager, DeptrailConfig, TreeSettings};
use deptrail_fs::{FileSystem, NativeFileSystem};
use deptrail_info::{caching_client_from_config, CachingRegistry, InfoClient, RegistryClient};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Manifest and lockfile of one package manager, parsed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFiles {
    /// Manifest file name used in direct source strings
    pub manifest_path: String,
    /// Direct declarations (empty when the manifest is missing or unreadable)
    pub manifest: Vec<ManifestEntry>,
    /// Lockfile contents, `None` when there is no lockfile
    pub lockfile: Option<LockfileData>,
}

/// Dependency inventory of one project directory.
///
/// Everything is re-read from disk on every call; nothing is cached between
/// calls except registry responses (inside the registry client).
pub struct Inventory<F: FileSystem, R: RegistryClient> {
    fs: Arc<F>,
    root: PathBuf,
    registry: R,
    max_depth: usize,
}

impl<F: FileSystem, R: RegistryClient> Inventory<F, R> {
    /// Inventory of `root` read through `fs`
    pub fn new(fs: Arc<F>, root: impl Into<PathBuf>, registry: R) -> Self {
        Self {
            fs,
            root: root.into(),
            registry,
            max_depth: TreeSettings::default().max_depth,
        }
    }

    /// Inventory using the tree defaults of `config`
    pub fn from_config(fs: Arc<F>, root: impl Into<PathBuf>, registry: R, config: &DeptrailConfig) -> Self {
        Self::new(fs, root, registry).with_max_depth(config.tree.max_depth)
    }

    /// Default depth for [`Inventory::tree`]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Project directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Registry client used by [`Inventory::outdated`]
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Package managers used in the project directory
    pub async fn detect(&self) -> Vec<PackageManager> {
        PackageManager::detect(self.fs.as_ref(), &self.root).await
    }

    /// Read and parse the manifest and lockfile of `manager`
    pub async fn load(&self, manager: PackageManager) -> ProjectFiles {
        let mut manifest_path = manager.manifest_files()[0].to_string();
        let mut manifest = Vec::new();
        for file in manager.manifest_files() {
            if let Some(text) = self.read_text(file).await {
                manifest_path = file.to_string();
                manifest = manager.manifest_parser().parse_manifest(&text);
                break;
            }
        }

        let lockfile = self
            .read_text(manager.lockfile_name())
            .await
            .map(|text| manager.lockfile_parser().parse_lockfile(&text));

        debug!(
            manager = %manager,
            manifest = %manifest_path,
            declared = manifest.len(),
            locked = lockfile.as_ref().map_or(0, LockfileData::len),
            "loaded project files"
        );
        ProjectFiles {
            manifest_path,
            manifest,
            lockfile,
        }
    }

    /// Every dependency of `manager`, direct and transitive
    pub async fn dependencies(&self, manager: PackageManager) -> Vec<Dependency> {
        let files = self.load(manager).await;
        build_dependencies(
            &files.manifest,
            files.lockfile.as_ref(),
            &files.manifest_path,
            manager.system_name(),
        )
    }

    /// Direct dependencies with a newer wanted or latest version
    pub async fn outdated(&self, manager: PackageManager, use_cache: bool) -> Vec<OutdatedDependency> {
        let dependencies = self.dependencies(manager).await;
        check_outdated(&dependencies, &self.registry, use_cache).await
    }

    /// Dependency forest rows; `max_depth` defaults to the configured depth
    pub async fn tree(
        &self,
        manager: PackageManager,
        max_depth: Option<usize>,
        filter: Option<Ecosystem>,
    ) -> Vec<DependencyTreeEntry> {
        let dependencies = self.dependencies(manager).await;
        build_tree(&dependencies, max_depth.unwrap_or(self.max_depth), filter)
    }

    /// Every chain explaining why `name` is installed
    pub async fn why(&self, manager: PackageManager, name: &str) -> Vec<Vec<ChainLink>> {
        let dependencies = self.dependencies(manager).await;
        chain::why(&dependencies, name)
    }

    /// File text; `None` when absent, empty when present but unreadable
    async fn read_text(&self, file: &str) -> Option<String> {
        let path = self.root.join(file);
        match self.fs.metadata(&path).await {
            Ok(meta) if meta.is_file => {}
            Ok(_) => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot inspect file, treating as absent");
                return None;
            }
        }

        match self.fs.read_to_string(&path).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable file, treating as empty");
                Some(String::new())
            }
        }
    }
}

impl Inventory<NativeFileSystem, CachingRegistry<InfoClient, NativeFileSystem>> {
    /// Inventory of a directory on disk, configured from `~/.deptrail/config.toml`
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is not a directory, the configuration cannot
    /// be loaded, or the registry client cannot be set up.
    pub async fn native(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(Error::Other(format!("Not a directory: {}", root.display())));
        }
        let config = ConfigManager::load_or_default().await?;
        let fs = Arc::new(NativeFileSystem::new(root)?);
        let registry = caching_client_from_config(config.config())?;
        let root = fs.project_root().to_path_buf();
        Ok(Self::from_config(fs, root, registry, config.config()))
    }
}
