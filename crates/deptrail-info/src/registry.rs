//! Registry client seam used by the outdated checker

use crate::cache::RegistryCache;
use crate::types::{PackageVersions, Registry};
use chrono::{DateTime, Utc};
use deptrail_fs::FileSystem;
use std::sync::Arc;

/// Source of published-version information
///
/// Implementations never fail: a lookup that cannot be completed returns
/// `None` and the caller skips that package.
#[async_trait::async_trait]
pub trait RegistryClient: Send + Sync {
    /// Published versions of `name` in `registry`
    ///
    /// `use_cache = false` forces a live lookup where a cache is involved.
    async fn fetch(&self, registry: Registry, name: &str, use_cache: bool)
        -> Option<PackageVersions>;
}

#[async_trait::async_trait]
impl<T: RegistryClient + ?Sized> RegistryClient for Arc<T> {
    async fn fetch(
        &self,
        registry: Registry,
        name: &str,
        use_cache: bool,
    ) -> Option<PackageVersions> {
        (**self).fetch(registry, name, use_cache).await
    }
}

/// Decorates a [`RegistryClient`] with a [`RegistryCache`]
///
/// Fresh cache entries are served without a live lookup; live results are
/// written back. With `use_cache = false` the cache is not read but still
/// refreshed.
pub struct CachingRegistry<R: RegistryClient, F: FileSystem> {
    inner: R,
    cache: RegistryCache<F>,
    enabled: bool,
}

impl<R: RegistryClient, F: FileSystem> CachingRegistry<R, F> {
    /// Wrap `inner` with `cache`
    pub fn new(inner: R, cache: RegistryCache<F>) -> Self {
        Self {
            inner,
            cache,
            enabled: true,
        }
    }

    /// Turn the cache off entirely (no reads, no writes)
    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The wrapped client
    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// The cache
    pub fn cache(&self) -> &RegistryCache<F> {
        &self.cache
    }

    /// Fetch as of `now`
    pub async fn fetch_at(
        &self,
        registry: Registry,
        name: &str,
        use_cache: bool,
        now: DateTime<Utc>,
    ) -> Option<PackageVersions> {
        if self.enabled && use_cache {
            if let Some(cached) = self.cache.get_at(registry, name, now).await {
                return Some(cached);
            }
        }

        let live = self.inner.fetch(registry, name, use_cache).await?;

        if self.enabled {
            if let Err(e) = self.cache.set_at(registry, name, &live, now).await {
                tracing::warn!(%registry, name, error = %e, "failed to write registry cache entry");
            }
        }

        Some(live)
    }
}

#[async_trait::async_trait]
impl<R: RegistryClient, F: FileSystem> RegistryClient for CachingRegistry<R, F> {
    async fn fetch(
        &self,
        registry: Registry,
        name: &str,
        use_cache: bool,
    ) -> Option<PackageVersions> {
        self.fetch_at(registry, name, use_cache, Utc::now()).await
    }
}
