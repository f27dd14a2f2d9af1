//! Published-version lookups for npm, JSR, RubyGems and PyPI
//!
//! [`InfoClient`] talks to the registries over HTTP; [`CachingRegistry`]
//! wraps any [`RegistryClient`] with an on-disk cache that keeps responses
//! for a freshness window (one hour by default).
//!
//! # Example
//!
//! ```no_run
//! use deptrail_info::{InfoClient, Registry, RegistryClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = InfoClient::new()?;
//!
//!     if let Some(info) = client.fetch(Registry::Npm, "react", true).await {
//!         println!("react: {} versions, latest {:?}", info.versions.len(), info.latest);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod cache;
mod client;
mod error;
mod jsr;
mod npm;
mod pypi;
mod registry;
mod rubygems;
mod types;

pub use cache::{cache_key, RegistryCache, DEFAULT_TTL};
pub use error::{Error, Result};
pub use registry::{CachingRegistry, RegistryClient};
pub use types::{PackageVersions, Registry};

use client::HttpClient;
use deptrail_config::{DeptrailConfig, RegistrySettings};
use deptrail_fs::NativeFileSystem;
use std::sync::Arc;
use std::time::Duration;

/// Main client for fetching published versions
///
/// Each registry gets its own HTTP client so rate limits apply per registry.
pub struct InfoClient {
    settings: RegistrySettings,
    npm_client: HttpClient,
    jsr_client: HttpClient,
    rubygems_client: HttpClient,
    pypi_client: HttpClient,
}

impl InfoClient {
    /// Create a client for the public registries with default rate limits
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP clients cannot be initialized.
    pub fn new() -> Result<Self> {
        Self::from_settings(&RegistrySettings::default())
    }

    /// Create a client from configured endpoints and limits
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP clients cannot be initialized.
    pub fn from_settings(settings: &RegistrySettings) -> Result<Self> {
        let rps = settings.requests_per_second;
        let timeout = Duration::from_secs(settings.timeout_secs);
        Ok(Self {
            settings: settings.clone(),
            npm_client: HttpClient::with_rate_limit(rps, timeout)?,
            jsr_client: HttpClient::with_rate_limit(rps, timeout)?,
            rubygems_client: HttpClient::with_rate_limit(rps, timeout)?,
            pypi_client: HttpClient::with_rate_limit(rps, timeout)?,
        })
    }

    /// Fetch published versions from the npm registry
    pub async fn fetch_npm(&self, name: &str) -> Result<PackageVersions> {
        npm::fetch_npm_versions(&self.npm_client, &self.settings.npm, name).await
    }

    /// Fetch published versions from JSR (`@scope/package`)
    pub async fn fetch_jsr(&self, name: &str) -> Result<PackageVersions> {
        jsr::fetch_jsr_versions(&self.jsr_client, &self.settings.jsr, name).await
    }

    /// Fetch published versions from rubygems.org
    pub async fn fetch_rubygems(&self, name: &str) -> Result<PackageVersions> {
        rubygems::fetch_rubygems_versions(&self.rubygems_client, &self.settings.rubygems, name)
            .await
    }

    /// Fetch published versions from PyPI
    pub async fn fetch_pypi(&self, name: &str) -> Result<PackageVersions> {
        pypi::fetch_pypi_versions(&self.pypi_client, &self.settings.pypi, name).await
    }

    /// Fetch published versions from any supported registry
    pub async fn fetch_versions(&self, registry: Registry, name: &str) -> Result<PackageVersions> {
        match registry {
            Registry::Npm => self.fetch_npm(name).await,
            Registry::Jsr => self.fetch_jsr(name).await,
            Registry::RubyGems => self.fetch_rubygems(name).await,
            Registry::PyPi => self.fetch_pypi(name).await,
        }
    }
}

#[async_trait::async_trait]
impl RegistryClient for InfoClient {
    async fn fetch(
        &self,
        registry: Registry,
        name: &str,
        _use_cache: bool,
    ) -> Option<PackageVersions> {
        match self.fetch_versions(registry, name).await {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::warn!(%registry, name, error = %e, "registry lookup failed");
                None
            }
        }
    }
}

/// Build the cached live client described by `config`
///
/// # Errors
///
/// Returns an error if the cache directory cannot be determined or created,
/// or the HTTP clients cannot be initialized.
pub fn caching_client_from_config(
    config: &DeptrailConfig,
) -> Result<CachingRegistry<InfoClient, NativeFileSystem>> {
    let cache_dir = config
        .cache_dir()
        .map_err(|e| Error::other(format!("Failed to locate cache directory: {}", e)))?;
    let fs = Arc::new(NativeFileSystem::create(&cache_dir)?);
    let cache = RegistryCache::new(fs, cache_dir, config.cache.ttl());

    Ok(
        CachingRegistry::new(InfoClient::from_settings(&config.registries)?, cache)
            .with_cache_enabled(config.cache.enabled),
    )
}
