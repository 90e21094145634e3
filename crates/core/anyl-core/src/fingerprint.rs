//! Content fingerprints for registered game files.
//!
//! A fingerprint is the BLAKE3 digest of a file's bytes and nothing else:
//! name, location and metadata never influence it.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Hex digits shown by [`Fingerprint::short`].
const SHORT_LEN: usize = 16;

/// Lowercase hex BLAKE3 digest (64 chars).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Truncated form for messages and listings.
    pub fn short(&self) -> &str {
        self.0.get(..SHORT_LEN).unwrap_or(&self.0)
    }

    /// Well-formed digests are exactly 64 hex characters.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == 64 && self.0.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Recomputes the digest of `path` and compares it with `self`.
    pub fn matches_file(&self, path: &Path) -> AppResult<bool> {
        Ok(fingerprint(path)? == *self)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes the fingerprint of the file at `path`, streaming it in 64 KiB chunks.
///
/// Fails with [`AppError::UnreadableFile`] if the path is missing, is a
/// directory, or cannot be read.
pub fn fingerprint(path: &Path) -> AppResult<Fingerprint> {
    let unreadable = |source| AppError::UnreadableFile {
        path: path.to_path_buf(),
        source,
    };

    let metadata = fs::metadata(path).map_err(unreadable)?;
    if metadata.is_dir() {
        return Err(unreadable(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path is a directory",
        )));
    }

    let mut file = fs::File::open(path).map_err(unreadable)?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let count = file.read(&mut buffer).map_err(unreadable)?;
        if count == 0 {
            break;
        }
        hasher.update(&buffer[..count]);
    }
    Ok(Fingerprint(hasher.finalize().to_hex().to_string()))
}
