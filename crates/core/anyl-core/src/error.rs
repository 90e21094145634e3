use crate::models::{Fingerprint, GameId};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("File not found or unreadable at {path}: {source}")]
    UnreadableFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No game with id {id}")]
    NotFound { id: GameId },

    #[error("Game store at {path} is corrupt: {reason}")]
    CorruptStore { path: PathBuf, reason: String },

    #[error("Game store is locked by another launcher ({path}), gave up after {waited:?}")]
    StoreBusy { path: PathBuf, waited: Duration },

    #[error(
        "Content of {path} no longer matches the recorded fingerprint (expected {}, found {})",
        .expected.short(),
        .actual.short()
    )]
    IntegrityMismatch {
        id: GameId,
        path: PathBuf,
        expected: Fingerprint,
        actual: Fingerprint,
    },

    #[error("Invalid game name: {0}")]
    InvalidName(String),

    #[error("No game selected")]
    NothingSelected,

    #[error("Failed to launch {path}: {source}")]
    LaunchFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Errors the user can clear by retrying or re-pointing a game.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnreadableFile { .. } | Self::NotFound { .. } | Self::StoreBusy { .. }
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
