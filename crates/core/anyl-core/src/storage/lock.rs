//! Cross-process lock guarding writes to the game store.
//!
//! `games.lock` is a persistent file that every launcher locks exclusively
//! through the OS (`flock` on Unix, `LockFileEx` on Windows). The OS drops the
//! lock when the holding handle is closed, including when its process dies,
//! so a crashed launcher never leaves the store locked. The file is never
//! deleted; its body only records who holds it, for diagnostics.

use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOptions {
    /// Upper bound on how long `acquire` waits before giving up with `StoreBusy`.
    pub wait: Duration,
    pub poll_interval: Duration,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            wait: Duration::from_secs(5),
            poll_interval: Duration::from_millis(50),
        }
    }
}

/// Last holder of the lock as recorded in the lock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockHolder {
    pub pid: u32,
    pub acquired_at: DateTime<Utc>,
}

/// Held store lock. Dropping it closes the handle, which releases the lock.
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
    file: File,
}

impl StoreLock {
    pub fn acquire(path: &Path, options: &LockOptions) -> AppResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| AppError::io(path, e))?;

        let started = Instant::now();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Self::claim(path, file),
                Err(e) if is_contended(&e) => {}
                Err(e) => return Err(AppError::io(path, e)),
            }

            let waited = started.elapsed();
            if waited >= options.wait {
                match holder(path) {
                    Some(h) => warn!(
                        "Store lock {} still held by PID {} since {}",
                        path.display(),
                        h.pid,
                        h.acquired_at
                    ),
                    None => warn!("Store lock {} still held", path.display()),
                }
                return Err(AppError::StoreBusy {
                    path: path.to_path_buf(),
                    waited,
                });
            }
            thread::sleep(options.poll_interval.min(options.wait - waited));
        }
    }

    fn claim(path: &Path, mut file: File) -> AppResult<Self> {
        let info = LockHolder {
            pid: std::process::id(),
            acquired_at: Utc::now(),
        };
        // Diagnostics only; a failure here does not give the lock back.
        if let Err(e) = write_holder(&mut file, &info) {
            debug!("Could not record holder in {}: {}", path.display(), e);
        }
        debug!("Acquired store lock {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        match FileExt::unlock(&self.file) {
            Ok(()) => debug!("Released store lock {}", self.path.display()),
            // Closing the handle releases it anyway.
            Err(e) => debug!("Unlock of {} failed: {}", self.path.display(), e),
        }
    }
}

/// Reads the holder recorded in the lock file, if any.
pub fn holder(path: &Path) -> Option<LockHolder> {
    let body = fs::read(path).ok()?;
    serde_json::from_slice(&body).ok()
}

fn write_holder(file: &mut File, info: &LockHolder) -> std::io::Result<()> {
    let body =
        serde_json::to_vec(info).map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&body)?;
    file.flush()
}

fn is_contended(e: &std::io::Error) -> bool {
    e.kind() == ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
