use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for deptrail
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeptrailConfig {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: String,

    /// Registry response cache
    #[serde(default)]
    pub cache: CacheSettings,

    /// Registry endpoints and request pacing
    #[serde(default)]
    pub registries: RegistrySettings,

    /// Dependency tree display
    #[serde(default)]
    pub tree: TreeSettings,
}

impl Default for DeptrailConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            cache: CacheSettings::default(),
            registries: RegistrySettings::default(),
            tree: TreeSettings::default(),
        }
    }
}

/// Registry response cache settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheSettings {
    /// Read and write the on-disk cache
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Freshness window in minutes
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: u64,

    /// Cache directory override (defaults to the platform cache dir)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl CacheSettings {
    /// Freshness window as a `Duration`
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_minutes.saturating_mul(60))
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_minutes: default_ttl_minutes(),
            dir: None,
        }
    }
}

/// Registry endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegistrySettings {
    /// npm registry base URL
    #[serde(default = "default_npm_url")]
    pub npm: String,

    /// JSR base URL
    #[serde(default = "default_jsr_url")]
    pub jsr: String,

    /// RubyGems base URL
    #[serde(default = "default_rubygems_url")]
    pub rubygems: String,

    /// PyPI base URL
    #[serde(default = "default_pypi_url")]
    pub pypi: String,

    /// Client-side request limit per registry (0 disables rate limiting)
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            npm: default_npm_url(),
            jsr: default_jsr_url(),
            rubygems: default_rubygems_url(),
            pypi: default_pypi_url(),
            requests_per_second: default_requests_per_second(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Tree display settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreeSettings {
    /// Default maximum depth below each direct dependency
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

// Default value functions
fn default_version() -> String {
    "1.0".to_string()
}

fn default_true() -> bool {
    true
}

fn default_ttl_minutes() -> u64 {
    60
}

fn default_npm_url() -> String {
    "https://registry.npmjs.org".to_string()
}

fn default_jsr_url() -> String {
    "https://jsr.io".to_string()
}

fn default_rubygems_url() -> String {
    "https://rubygems.org".to_string()
}

fn default_pypi_url() -> String {
    "https://pypi.org".to_string()
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_depth() -> usize {
    10
}
