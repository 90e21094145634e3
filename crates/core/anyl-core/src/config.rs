use crate::error::{AppError, AppResult};
use crate::storage::lock::LockOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// How long a save waits for another launcher to release the store.
    pub lock_wait_ms: u64,
    pub lock_poll_ms: u64,
    /// Program used to open HTML games instead of the platform opener.
    pub html_opener: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock_wait_ms: 5_000,
            lock_poll_ms: 50,
            html_opener: None,
        }
    }
}

impl Config {
    pub fn lock_options(&self) -> LockOptions {
        LockOptions {
            wait: Duration::from_millis(self.lock_wait_ms),
            poll_interval: Duration::from_millis(self.lock_poll_ms.max(1)),
        }
    }
}

pub struct ConfigManager {
    config_path: PathBuf,
    pub config: Config,
}

impl ConfigManager {
    pub fn new(base_dir: &Path) -> AppResult<Self> {
        let config_path = base_dir.join(crate::env::CONFIG_FILE);
        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| AppError::io(&config_path, e))?;
            toml::from_str(&content).unwrap_or_else(|e| {
                log::warn!(
                    "Ignoring unreadable config {}: {}",
                    config_path.display(),
                    e
                );
                Config::default()
            })
        } else {
            Config::default()
        };

        // Auto-save default if missing
        if !config_path.exists() {
            if let Err(e) = Self::save_to_path(&config, &config_path) {
                log::warn!("Failed to save default config: {}", e);
            }
        }

        Ok(Self {
            config_path,
            config,
        })
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    fn save_to_path(config: &Config, path: &Path) -> AppResult<()> {
        let content =
            toml::to_string_pretty(config).map_err(|e| AppError::Config(e.to_string()))?;

        let parent = path.parent().unwrap_or(Path::new("."));
        std::fs::create_dir_all(parent).map_err(|e| AppError::io(parent, e))?;
        let temp = tempfile::NamedTempFile::new_in(parent).map_err(|e| AppError::io(parent, e))?;
        std::fs::write(temp.path(), &content).map_err(|e| AppError::io(temp.path(), e))?;
        temp.persist(path).map_err(|e| AppError::io(path, e.error))?;
        Ok(())
    }
}
