use crate::types::DeptrailConfig;
use deptrail_fs::FileSystem;
use deptrail_fs::NativeFileSystem;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during config management
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Config file not found at {0}")]
    ConfigNotFound(PathBuf),

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Manager for deptrail configuration
///
/// Owns the parsed config together with the filesystem and path it was
/// loaded from, so changes can be written back with [`ConfigManager::save`].
pub struct ConfigManager<F: FileSystem = NativeFileSystem> {
    fs: Arc<F>,
    config_path: PathBuf,
    config: DeptrailConfig,
}

impl ConfigManager {
    /// Get the default config path (~/.deptrail/config.toml)
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".deptrail").join("config.toml"))
    }

    /// Load config from the default location, falling back to defaults when
    /// the file does not exist
    pub async fn load_or_default() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;
        let config_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
        let fs = Arc::new(NativeFileSystem::new(config_dir)?);
        Self::load_or_default_with_filesystem(fs, &config_path).await
    }

    /// Load config from specific path (useful for testing)
    pub async fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let fs = Arc::new(NativeFileSystem::new(config_dir)?);
        Self::load_with_filesystem(fs, path).await
    }

    /// Initialize config with defaults at a specific path
    pub async fn init_at(path: &Path) -> Result<Self, ConfigError> {
        let config_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let fs = Arc::new(NativeFileSystem::create(config_dir)?);

        let manager = Self {
            fs,
            config_path: path.to_path_buf(),
            config: DeptrailConfig::default(),
        };
        manager.save().await?;
        Ok(manager)
    }
}

impl<F: FileSystem> ConfigManager<F> {
    /// Load config with a custom FileSystem
    pub async fn load_with_filesystem(fs: Arc<F>, path: &Path) -> Result<Self, ConfigError> {
        if !fs.exists(path).await? {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let contents = fs.read_to_string(path).await?;
        let config: DeptrailConfig = toml::from_str(&contents)?;

        Ok(Self {
            fs,
            config_path: path.to_path_buf(),
            config,
        })
    }

    /// Load config with a custom FileSystem, using defaults when absent
    pub async fn load_or_default_with_filesystem(
        fs: Arc<F>,
        path: &Path,
    ) -> Result<Self, ConfigError> {
        match Self::load_with_filesystem(Arc::clone(&fs), path).await {
            Err(ConfigError::ConfigNotFound(_)) => Ok(Self {
                fs,
                config_path: path.to_path_buf(),
                config: DeptrailConfig::default(),
            }),
            other => other,
        }
    }

    /// Save config to disk atomically
    ///
    /// Uses a temporary file and rename to prevent corruption
    pub async fn save(&self) -> Result<(), ConfigError> {
        let toml_str = toml::to_string_pretty(&self.config)?;

        if let Some(parent) = self.config_path.parent() {
            self.fs.create_dir_all(parent).await?;
        }

        let temp_path = self.config_path.with_extension("toml.tmp");
        self.fs.write(&temp_path, &toml_str).await?;
        self.fs.rename(&temp_path, &self.config_path).await?;

        Ok(())
    }

    /// Get reference to config
    pub fn config(&self) -> &DeptrailConfig {
        &self.config
    }

    /// Get mutable reference to config (caller must call save())
    pub fn config_mut(&mut self) -> &mut DeptrailConfig {
        &mut self.config
    }

    /// Path the config is loaded from and saved to
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl DeptrailConfig {
    /// Directory for registry cache entries
    ///
    /// Uses `cache.dir` when set, otherwise `{platform cache dir}/deptrail`.
    pub fn cache_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.cache.dir {
            return Ok(dir.clone());
        }
        let base = dirs::cache_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".cache")))
            .ok_or(ConfigError::HomeNotFound)?;
        Ok(base.join("deptrail"))
    }
}
