//! Configuration for deptrail.
//!
//! Settings live in `~/.deptrail/config.toml`. A missing file is not an
//! error: [`ConfigManager::load_or_default`] falls back to
//! [`DeptrailConfig::default`].

pub mod manager;
pub mod types;

pub use manager::{ConfigError, ConfigManager};
pub use types::{CacheSettings, DeptrailConfig, RegistrySettings, TreeSettings};
