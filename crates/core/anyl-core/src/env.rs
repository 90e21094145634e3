use crate::error::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Environment variable to override the default launcher data directory.
pub const ENV_DATA_DIR: &str = "ANYLAUNCHER_HOME";

const APP_DIR: &str = "anylauncher";
pub const STORE_FILE: &str = "games.json";
pub const LOCK_FILE: &str = "games.lock";
pub const CONFIG_FILE: &str = "config.toml";
pub const LOG_DIR: &str = "logs";

/// Returns the base directory for launcher data.
///
/// Checks `ANYLAUNCHER_HOME` first, then falls back to the per-user
/// application-data directory (`~/.local/share/anylauncher`,
/// `%APPDATA%\anylauncher`, ...), which never needs elevated permissions.
pub fn get_base_dir() -> AppResult<PathBuf> {
    if let Ok(env_path) = std::env::var(ENV_DATA_DIR) {
        return resolve_override(&env_path);
    }

    match dirs::data_dir() {
        Some(data) => Ok(data.join(APP_DIR)),
        None => Err(AppError::Config(format!(
            "Cannot determine the user data directory. Please set {}.",
            ENV_DATA_DIR
        ))),
    }
}

fn resolve_override(value: &str) -> AppResult<PathBuf> {
    let path = PathBuf::from(value);
    if !path.is_absolute() {
        return Err(AppError::Config(format!(
            "Environment variable {} must be an absolute path, got: {:?}",
            ENV_DATA_DIR, path
        )));
    }
    Ok(path)
}

pub fn store_path(base_dir: &Path) -> PathBuf {
    base_dir.join(STORE_FILE)
}

pub fn lock_path(base_dir: &Path) -> PathBuf {
    base_dir.join(LOCK_FILE)
}

pub fn log_dir(base_dir: &Path) -> PathBuf {
    base_dir.join(LOG_DIR)
}
