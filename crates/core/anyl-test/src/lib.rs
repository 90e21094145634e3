//! Shared fixtures for the launcher integration tests.

use anyl_core::process::{LaunchTarget, ProcessStarter, Started};
use anyl_core::storage::lock::LockOptions;
use anyl_core::{GameRegistry, RegistryStore};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

/// A throwaway data directory plus a folder of fake game files.
pub struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        fs::create_dir_all(dir.path().join("games")).expect("create games dir");
        Self { dir }
    }

    pub fn base_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    pub fn store(&self) -> RegistryStore {
        RegistryStore::new(&self.base_dir()).with_lock_options(LockOptions {
            wait: Duration::from_secs(10),
            poll_interval: Duration::from_millis(5),
        })
    }

    pub fn registry(&self) -> GameRegistry {
        GameRegistry::open(self.store()).expect("open registry")
    }

    /// Writes a fake game file and returns its path.
    pub fn game(&self, file: &str, bytes: &[u8]) -> PathBuf {
        let path = self.dir.path().join("games").join(file);
        fs::write(&path, bytes).expect("write game file");
        path
    }

    pub fn data_file(&self, name: &str) -> PathBuf {
        self.base_dir().join(name)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

/// Records launch targets instead of spawning anything.
#[derive(Default)]
pub struct RecordingStarter {
    started: Mutex<Vec<LaunchTarget>>,
}

impl RecordingStarter {
    pub fn started(&self) -> Vec<LaunchTarget> {
        self.started.lock().expect("starter mutex").clone()
    }
}

impl ProcessStarter for RecordingStarter {
    fn start(&self, target: &LaunchTarget) -> std::io::Result<Started> {
        self.started
            .lock()
            .expect("starter mutex")
            .push(target.clone());
        Ok(Started { pid: None })
    }
}
