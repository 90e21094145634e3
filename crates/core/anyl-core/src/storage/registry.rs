use crate::error::{AppError, AppResult};
use crate::fingerprint::fingerprint;
use crate::models::{GameEntry, GameId, RegistryDocument};
use crate::storage::store::RegistryStore;
use indexmap::IndexMap;
use log::info;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct State {
    entries: IndexMap<GameId, GameEntry>,
    last_selected: Option<GameId>,
}

impl State {
    fn from_document(document: RegistryDocument) -> Self {
        let entries = document
            .entries
            .into_iter()
            .map(|entry| (entry.id.clone(), entry))
            .collect();
        Self {
            entries,
            last_selected: document.last_selected_id,
        }
    }

    fn to_document(&self) -> RegistryDocument {
        RegistryDocument {
            entries: self.entries.values().cloned().collect(),
            last_selected_id: self.last_selected.clone(),
        }
    }
}

/// The user's list of games plus the last selection, backed by `games.json`.
///
/// Every mutation is saved before it becomes visible in memory: if the save
/// fails, both the document and this value keep their previous state.
#[derive(Debug)]
pub struct GameRegistry {
    store: RegistryStore,
    state: State,
}

impl GameRegistry {
    pub fn open(store: RegistryStore) -> AppResult<Self> {
        let state = State::from_document(store.load()?);
        info!(
            "Loaded {} game(s) from {}",
            state.entries.len(),
            store.document_path().display()
        );
        Ok(Self { store, state })
    }

    pub fn store(&self) -> &RegistryStore {
        &self.store
    }

    /// Imports the file at `path`. `name` defaults to the file stem.
    pub fn add(&mut self, path: &Path, name: Option<&str>) -> AppResult<GameId> {
        let fingerprint = fingerprint(path)?;
        let path = absolute(path)?;
        let name = match name {
            Some(name) => validate_name(name)?,
            None => validate_name(&GameEntry::default_name(&path))?,
        };

        let mut id = GameId::generate();
        while self.state.entries.contains_key(&id) {
            id = GameId::generate();
        }

        let mut next = self.state.clone();
        next.entries.insert(
            id.clone(),
            GameEntry {
                id: id.clone(),
                name,
                path,
                fingerprint,
            },
        );
        self.commit(next)?;
        info!("Added game {}", id);
        Ok(id)
    }

    pub fn rename(&mut self, id: &GameId, new_name: &str) -> AppResult<()> {
        self.require(id)?;
        let name = validate_name(new_name)?;

        let mut next = self.state.clone();
        if let Some(entry) = next.entries.get_mut(id) {
            entry.name = name;
        }
        self.commit(next)
    }

    /// Points `id` at a new file and re-fingerprints it.
    pub fn repath(&mut self, id: &GameId, new_path: &Path) -> AppResult<()> {
        self.require(id)?;
        let fingerprint = fingerprint(new_path)?;
        let path = absolute(new_path)?;

        let mut next = self.state.clone();
        if let Some(entry) = next.entries.get_mut(id) {
            entry.path = path;
            entry.fingerprint = fingerprint;
        }
        self.commit(next)?;
        info!("Re-pointed game {} to {}", id, new_path.display());
        Ok(())
    }

    pub fn remove(&mut self, id: &GameId) -> AppResult<GameEntry> {
        let mut next = self.state.clone();
        let removed = next
            .entries
            .shift_remove(id)
            .ok_or_else(|| AppError::NotFound { id: id.clone() })?;
        if next.last_selected.as_ref() == Some(id) {
            next.last_selected = None;
        }
        self.commit(next)?;
        info!("Removed game {}", id);
        Ok(removed)
    }

    /// Snapshot in insertion order.
    pub fn list(&self) -> Vec<GameEntry> {
        self.state.entries.values().cloned().collect()
    }

    pub fn get(&self, id: &GameId) -> Option<&GameEntry> {
        self.state.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.state.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.entries.is_empty()
    }

    pub fn select(&mut self, id: &GameId) -> AppResult<()> {
        self.require(id)?;
        let mut next = self.state.clone();
        next.last_selected = Some(id.clone());
        self.commit(next)
    }

    pub fn last_selected_id(&self) -> Option<&GameId> {
        self.state.last_selected.as_ref()
    }

    pub fn last_selected(&self) -> Option<&GameEntry> {
        self.last_selected_id().and_then(|id| self.get(id))
    }

    /// Replaces in-memory state with what is on disk. On failure the current
    /// state is kept.
    pub fn reload(&mut self) -> AppResult<()> {
        let document = self.store.load()?;
        self.state = State::from_document(document);
        info!("Reloaded {} game(s) from disk", self.state.entries.len());
        Ok(())
    }

    fn require(&self, id: &GameId) -> AppResult<&GameEntry> {
        self.state
            .entries
            .get(id)
            .ok_or_else(|| AppError::NotFound { id: id.clone() })
    }

    fn commit(&mut self, next: State) -> AppResult<()> {
        self.store.save(&next.to_document())?;
        self.state = next;
        Ok(())
    }
}

fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidName("name cannot be empty".into()));
    }
    Ok(name.to_string())
}

fn absolute(path: &Path) -> AppResult<PathBuf> {
    std::path::absolute(path).map_err(|e| AppError::UnreadableFile {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Fingerprint;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        registry: GameRegistry,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let registry = GameRegistry::open(RegistryStore::new(&dir.path().join("data"))).unwrap();
            Self { dir, registry }
        }

        fn game(&self, file: &str, bytes: &[u8]) -> PathBuf {
            let path = self.dir.path().join(file);
            fs::write(&path, bytes).unwrap();
            path
        }

        fn reopen(&self) -> GameRegistry {
            GameRegistry::open(self.registry.store().clone()).unwrap()
        }
    }

    #[test]
    fn add_uses_file_stem_and_persists() {
        let mut fx = Fixture::new();
        let path = fx.game("A.exe", b"v1");
        let id = fx.registry.add(&path, None).unwrap();

        let entry = fx.registry.get(&id).unwrap();
        assert_eq!(entry.name, "A");
        assert!(entry.path.is_absolute());
        assert_eq!(entry.fingerprint, Fingerprint::of_bytes(b"v1"));
        assert!(fx.registry.last_selected_id().is_none());

        assert_eq!(fx.reopen().list(), fx.registry.list());
    }

    #[test]
    fn add_missing_file_changes_nothing() {
        let mut fx = Fixture::new();
        let missing = fx.dir.path().join("missing.exe");
        assert!(matches!(
            fx.registry.add(&missing, None),
            Err(AppError::UnreadableFile { .. })
        ));
        assert!(fx.registry.is_empty());
        assert!(!fx.registry.store().document_path().exists());
    }

    #[test]
    fn blank_names_rejected() {
        let mut fx = Fixture::new();
        let path = fx.game("B.exe", b"b");
        assert!(matches!(
            fx.registry.add(&path, Some("   ")),
            Err(AppError::InvalidName(_))
        ));
        let id = fx.registry.add(&path, Some("  Bee  ")).unwrap();
        assert_eq!(fx.registry.get(&id).unwrap().name, "Bee");
        assert!(matches!(
            fx.registry.rename(&id, ""),
            Err(AppError::InvalidName(_))
        ));
    }

    #[test]
    fn duplicate_paths_get_distinct_ids() {
        let mut fx = Fixture::new();
        let path = fx.game("same.exe", b"same");
        let first = fx.registry.add(&path, None).unwrap();
        let second = fx.registry.add(&path, None).unwrap();
        assert_ne!(first, second);

        fx.registry.rename(&second, "Copy").unwrap();
        assert_eq!(fx.registry.get(&first).unwrap().name, "same");
        assert_eq!(fx.registry.get(&second).unwrap().name, "Copy");
    }

    #[test]
    fn ids_unique_across_mutations_and_restarts() {
        let mut fx = Fixture::new();
        let mut issued = HashSet::new();
        for i in 0..10 {
            let path = fx.game(&format!("g{}.exe", i), format!("bytes {}", i).as_bytes());
            let id = fx.registry.add(&path, None).unwrap();
            assert!(issued.insert(id.clone()));
            if i % 3 == 0 {
                fx.registry.remove(&id).unwrap();
            }
        }
        let mut reopened = fx.reopen();
        let path = fx.game("late.exe", b"late");
        assert!(issued.insert(reopened.add(&path, None).unwrap()));
    }

    #[test]
    fn rename_keeps_path_and_fingerprint() {
        let mut fx = Fixture::new();
        let path = fx.game("C.exe", b"c");
        let id = fx.registry.add(&path, None).unwrap();
        let before = fx.registry.get(&id).unwrap().clone();

        fx.registry.rename(&id, "Charlie").unwrap();
        let after = fx.registry.get(&id).unwrap();
        assert_eq!(after.name, "Charlie");
        assert_eq!(after.path, before.path);
        assert_eq!(after.fingerprint, before.fingerprint);
    }

    #[test]
    fn repath_refreshes_fingerprint() {
        let mut fx = Fixture::new();
        let old = fx.game("old.exe", b"old");
        let new = fx.game("new.exe", b"new");
        let id = fx.registry.add(&old, None).unwrap();

        fx.registry.repath(&id, &new).unwrap();
        let entry = fx.registry.get(&id).unwrap();
        assert_eq!(entry.fingerprint, fingerprint(&new).unwrap());
        assert_eq!(entry.path, absolute(&new).unwrap());
        assert_eq!(entry.name, "old");
    }

    #[test]
    fn repath_to_missing_file_keeps_entry() {
        let mut fx = Fixture::new();
        let path = fx.game("D.exe", b"d");
        let id = fx.registry.add(&path, None).unwrap();
        let before = fx.registry.get(&id).unwrap().clone();

        let missing = fx.dir.path().join("nowhere.exe");
        assert!(matches!(
            fx.registry.repath(&id, &missing),
            Err(AppError::UnreadableFile { .. })
        ));
        assert_eq!(fx.registry.get(&id), Some(&before));
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let mut fx = Fixture::new();
        let ghost = GameId::from("ghost");
        let path = fx.game("E.exe", b"e");
        assert!(matches!(fx.registry.rename(&ghost, "x"), Err(AppError::NotFound { .. })));
        assert!(matches!(fx.registry.repath(&ghost, &path), Err(AppError::NotFound { .. })));
        assert!(matches!(fx.registry.remove(&ghost), Err(AppError::NotFound { .. })));
        assert!(matches!(fx.registry.select(&ghost), Err(AppError::NotFound { .. })));
    }

    #[test]
    fn removing_selected_clears_selection() {
        let mut fx = Fixture::new();
        let a = fx.game("A.exe", b"a");
        let b = fx.game("B.exe", b"b");
        let id_a = fx.registry.add(&a, None).unwrap();
        let id_b = fx.registry.add(&b, None).unwrap();

        fx.registry.select(&id_a).unwrap();
        assert_eq!(fx.registry.last_selected().unwrap().name, "A");

        let removed = fx.registry.remove(&id_a).unwrap();
        assert_eq!(removed.id, id_a);
        assert!(fx.registry.last_selected_id().is_none());
        assert!(matches!(fx.registry.select(&id_a), Err(AppError::NotFound { .. })));
        assert!(fx.reopen().last_selected_id().is_none());

        fx.registry.select(&id_b).unwrap();
        assert_eq!(fx.reopen().last_selected_id(), Some(&id_b));
    }

    #[test]
    fn removing_other_entry_keeps_selection() {
        let mut fx = Fixture::new();
        let a = fx.game("A.exe", b"a");
        let b = fx.game("B.exe", b"b");
        let id_a = fx.registry.add(&a, None).unwrap();
        let id_b = fx.registry.add(&b, None).unwrap();
        fx.registry.select(&id_a).unwrap();
        fx.registry.remove(&id_b).unwrap();
        assert_eq!(fx.registry.last_selected_id(), Some(&id_a));
    }

    #[test]
    fn list_keeps_insertion_order_after_removal() {
        let mut fx = Fixture::new();
        let ids: Vec<GameId> = ["z", "a", "m", "b"]
            .iter()
            .map(|n| {
                let path = fx.game(&format!("{}.exe", n), n.as_bytes());
                fx.registry.add(&path, None).unwrap()
            })
            .collect();
        fx.registry.remove(&ids[1]).unwrap();

        let names: Vec<String> = fx.registry.list().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["z", "m", "b"]);
        let reopened: Vec<String> = fx.reopen().list().into_iter().map(|e| e.name).collect();
        assert_eq!(reopened, names);
    }

    #[test]
    fn reload_picks_up_external_changes() {
        let mut fx = Fixture::new();
        let path = fx.game("F.exe", b"f");
        let mut other = fx.reopen();
        other.add(&path, Some("From elsewhere")).unwrap();

        assert!(fx.registry.is_empty());
        fx.registry.reload().unwrap();
        assert_eq!(fx.registry.len(), 1);
        assert_eq!(fx.registry.list()[0].name, "From elsewhere");
    }

    #[test]
    fn failed_reload_keeps_state() {
        let mut fx = Fixture::new();
        let path = fx.game("G.exe", b"g");
        let id = fx.registry.add(&path, None).unwrap();
        fs::write(fx.registry.store().document_path(), "{ broken").unwrap();

        assert!(matches!(fx.registry.reload(), Err(AppError::CorruptStore { .. })));
        assert!(fx.registry.get(&id).is_some());
    }

    #[test]
    fn failed_save_leaves_memory_unchanged() {
        let mut fx = Fixture::new();
        let path = fx.game("H.exe", b"h");
        let id = fx.registry.add(&path, None).unwrap();

        let store = RegistryStore::new(&fx.dir.path().join("data")).with_lock_options(
            crate::storage::lock::LockOptions {
                wait: std::time::Duration::from_millis(50),
                poll_interval: std::time::Duration::from_millis(10),
            },
        );
        let mut registry = GameRegistry::open(store).unwrap();
        let _held = crate::storage::lock::StoreLock::acquire(
            registry.store().lock_path(),
            &Default::default(),
        )
        .unwrap();

        assert!(matches!(
            registry.rename(&id, "Renamed"),
            Err(AppError::StoreBusy { .. })
        ));
        assert_eq!(registry.get(&id).unwrap().name, "H");
    }
}
