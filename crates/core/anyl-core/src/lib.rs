pub mod config;
pub mod env;
pub mod error;
pub mod fingerprint;
pub mod launch;
pub mod models;
pub mod process;
pub mod storage;

pub use config::ConfigManager;
pub use error::{AppError, AppResult};
pub use launch::LaunchSequencer;
pub use storage::{GameRegistry, RegistryStore};
