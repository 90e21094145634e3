use crate::error::{AppError, AppResult};
use crate::models::RegistryDocument;
use crate::storage::lock::{LockOptions, StoreLock};
use log::{debug, info};
use std::collections::HashSet;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Durable home of the registry document (`games.json`).
///
/// Writes go to a temp file in the same directory and are renamed over the
/// document while holding the store lock, so readers never observe a torn
/// document and concurrent writers never interleave.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    document_path: PathBuf,
    lock_path: PathBuf,
    lock_options: LockOptions,
}

impl RegistryStore {
    /// Store rooted in `base_dir` with the default lock file next to the document.
    pub fn new(base_dir: &Path) -> Self {
        Self::with_paths(crate::env::store_path(base_dir), crate::env::lock_path(base_dir))
    }

    pub fn with_paths(document_path: PathBuf, lock_path: PathBuf) -> Self {
        Self {
            document_path,
            lock_path,
            lock_options: LockOptions::default(),
        }
    }

    pub fn with_lock_options(mut self, lock_options: LockOptions) -> Self {
        self.lock_options = lock_options;
        self
    }

    pub fn document_path(&self) -> &Path {
        &self.document_path
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Reads the document. A missing document is an empty registry; anything
    /// present but unusable is `CorruptStore` and is left on disk untouched.
    pub fn load(&self) -> AppResult<RegistryDocument> {
        let content = match fs::read_to_string(&self.document_path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No store at {}, starting empty", self.document_path.display());
                return Ok(RegistryDocument::default());
            }
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(self.corrupt(format!("not valid UTF-8: {}", e)));
            }
            Err(e) => return Err(AppError::io(&self.document_path, e)),
        };

        let document: RegistryDocument =
            serde_json::from_str(&content).map_err(|e| self.corrupt(e.to_string()))?;
        self.validate(&document)?;
        Ok(document)
    }

    fn validate(&self, document: &RegistryDocument) -> AppResult<()> {
        let mut seen = HashSet::with_capacity(document.entries.len());
        for entry in &document.entries {
            if !seen.insert(&entry.id) {
                return Err(self.corrupt(format!("duplicate game id {}", entry.id)));
            }
        }
        if let Some(selected) = &document.last_selected_id {
            if !seen.contains(selected) {
                return Err(self.corrupt(format!(
                    "lastSelectedId {} does not name any game",
                    selected
                )));
            }
        }
        Ok(())
    }

    /// Serializes the full document and atomically replaces the stored one.
    pub fn save(&self, document: &RegistryDocument) -> AppResult<()> {
        let content = self.serialize(document)?;
        let parent = self
            .document_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        fs::create_dir_all(parent).map_err(|e| AppError::io(parent, e))?;

        let _lock = StoreLock::acquire(&self.lock_path, &self.lock_options)?;

        let mut temp =
            tempfile::NamedTempFile::new_in(parent).map_err(|e| AppError::io(parent, e))?;
        temp.write_all(content.as_bytes())
            .map_err(|e| AppError::io(temp.path(), e))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| AppError::io(temp.path(), e))?;
        temp.persist(&self.document_path)
            .map_err(|e| AppError::io(&self.document_path, e.error))?;
        sync_dir(parent)?;

        debug!(
            "Saved {} game(s) to {}",
            document.entries.len(),
            self.document_path.display()
        );
        Ok(())
    }

    /// Deletes the stored document. Only ever invoked on explicit user request,
    /// typically after `load` reported `CorruptStore`.
    pub fn discard(&self) -> AppResult<()> {
        let _lock = StoreLock::acquire(&self.lock_path, &self.lock_options)?;
        match fs::remove_file(&self.document_path) {
            Ok(()) => {
                info!("Discarded store {}", self.document_path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::io(&self.document_path, e)),
        }
    }

    fn serialize(&self, document: &RegistryDocument) -> AppResult<String> {
        let mut content = serde_json::to_string_pretty(document).map_err(|e| {
            AppError::io(
                &self.document_path,
                std::io::Error::new(ErrorKind::InvalidData, e),
            )
        })?;
        content.push('\n');
        Ok(content)
    }

    fn corrupt(&self, reason: String) -> AppError {
        AppError::CorruptStore {
            path: self.document_path.clone(),
            reason,
        }
    }
}

/// Flushes a directory entry so a rename into it survives power loss.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> AppResult<()> {
    fs::File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(|e| AppError::io(dir, e))
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> AppResult<()> {
    Ok(())
}
