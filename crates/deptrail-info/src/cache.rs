//! On-disk registry response cache with a freshness window

use crate::error::Result;
use crate::types::{PackageVersions, Registry};
use chrono::{DateTime, Utc};
use deptrail_fs::FileSystem;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default freshness window for cached registry responses
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntry {
    fetched_at: DateTime<Utc>,
    data: PackageVersions,
}

/// Filesystem-safe cache key for a package name
///
/// Uses form-urlencoding, so `@std/path` becomes `%40std%2Fpath`.
pub fn cache_key(package_name: &str) -> String {
    url::form_urlencoded::byte_serialize(package_name.as_bytes()).collect()
}

/// Registry response cache stored as one JSON file per package:
/// `{root}/{registry}/{cache_key}.json`
pub struct RegistryCache<F: FileSystem> {
    fs: Arc<F>,
    root: PathBuf,
    ttl: Duration,
}

impl<F: FileSystem> RegistryCache<F> {
    /// Create a cache rooted at `root` with the given freshness window
    pub fn new(fs: Arc<F>, root: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            fs,
            root: root.into(),
            ttl,
        }
    }

    /// Freshness window
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Location of the entry for one package
    pub fn entry_path(&self, registry: Registry, package_name: &str) -> PathBuf {
        self.root
            .join(registry.as_str())
            .join(format!("{}.json", cache_key(package_name)))
    }

    /// Cached data, if present and fresh at `now`
    ///
    /// Missing, unreadable, corrupt and expired entries are all misses.
    pub async fn get_at(
        &self,
        registry: Registry,
        package_name: &str,
        now: DateTime<Utc>,
    ) -> Option<PackageVersions> {
        let path = self.entry_path(registry, package_name);
        let contents = match self.fs.read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "unreadable cache entry");
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&contents) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "corrupt cache entry");
                return None;
            }
        };

        let fresh = match (now - entry.fetched_at).to_std() {
            Ok(age) => age < self.ttl,
            // Written "in the future" (clock skew): still inside its window
            Err(_) => true,
        };

        if fresh {
            tracing::trace!(%registry, package_name, "cache hit");
            Some(entry.data)
        } else {
            tracing::trace!(%registry, package_name, "cache entry expired");
            None
        }
    }

    /// Cached data, if present and fresh now
    pub async fn get(&self, registry: Registry, package_name: &str) -> Option<PackageVersions> {
        self.get_at(registry, package_name, Utc::now()).await
    }

    /// Store data fetched at `now`
    pub async fn set_at(
        &self,
        registry: Registry,
        package_name: &str,
        data: &PackageVersions,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let path = self.entry_path(registry, package_name);
        if let Some(parent) = path.parent() {
            self.fs.create_dir_all(parent).await?;
        }

        let entry = CacheEntry {
            fetched_at: now,
            data: data.clone(),
        };
        let json = serde_json::to_string(&entry)?;

        let temp_path = path.with_extension("json.tmp");
        self.fs.write(&temp_path, &json).await?;
        self.fs.rename(&temp_path, &path).await?;
        Ok(())
    }

    /// Store data fetched now
    pub async fn set(
        &self,
        registry: Registry,
        package_name: &str,
        data: &PackageVersions,
    ) -> Result<()> {
        self.set_at(registry, package_name, data, Utc::now()).await
    }
}
