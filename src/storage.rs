use ciborium::{from_reader, into_writer};
use sled::{Db, Tree};
use std::cell::{Cell, RefCell};
use std::path::Path;
use tracing::instrument;

use crate::config::ExplorerConfig;
use crate::errors::{ExplorerError, ExplorerErrorType, Result};
use crate::explorer::SerializedTree;
use crate::locations::ensure_dir;

const PROJECTS_TREE: &str = "projects";

pub trait PersistenceAdapter {
    // Somewhere a serialized explorer can be kept between sessions. The explorer
    // only ever loads once when a session starts and saves when the caller asks.
    // Implementations store the tree as-is; repairing it is the explorer's job.

    fn load(&self) -> Result<Option<SerializedTree>>;
    fn save(&self, tree: &SerializedTree) -> Result<()>;
}

/// Projects kept in a sled database, one CBOR blob per project name.
pub struct SledStore {
    db: Db,
    projects: Tree,
    project: String,
}

impl SledStore {
    #[instrument]
    pub fn open(root_dir: &Path, project: &str) -> Result<SledStore> {
        // Every write is flushed explicitly, so sled's background flusher stays
        // off. Without it the file lock is released as soon as the last handle drops.
        let db = sled::Config::new()
            .path(root_dir)
            .flush_every_ms(None)
            .open()
            .map_err(|e| {
                tracing::error!(
                    "Sled failed to open database for project {} at path {}: {}",
                    project,
                    root_dir.display(),
                    e
                );
                ExplorerError::new(
                    ExplorerErrorType::IOError,
                    format!("Failed to open database at {}: {}", root_dir.display(), e),
                )
            })?;
        let projects = db.open_tree(PROJECTS_TREE)?;
        Ok(SledStore {
            db,
            projects,
            project: project.to_string(),
        })
    }

    pub fn from_config(config: &ExplorerConfig) -> Result<SledStore> {
        ensure_dir(&config.storage_dir)?;
        SledStore::open(&config.database_dir(), &config.project)
    }

    /// Another project in the same database.
    pub fn for_project(&self, project: &str) -> SledStore {
        SledStore {
            db: self.db.clone(),
            projects: self.projects.clone(),
            project: project.to_string(),
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn list_projects(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for key in self.projects.iter().keys() {
            let key = key?;
            names.push(String::from_utf8_lossy(&key).into_owned());
        }
        Ok(names)
    }

    /// Drop a project's saved tree. Returns whether anything was stored.
    #[instrument(skip(self))]
    pub fn remove_project(&self, project: &str) -> Result<bool> {
        let removed = self.projects.remove(project.as_bytes())?.is_some();
        self.db.flush()?;
        if removed {
            tracing::info!("Removed saved tree for project {}", project);
        }
        Ok(removed)
    }
}

impl PersistenceAdapter for SledStore {
    #[instrument(skip(self), fields(project = %self.project))]
    fn load(&self) -> Result<Option<SerializedTree>> {
        let bytes = match self.projects.get(self.project.as_bytes())? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        let tree: SerializedTree = from_reader(bytes.as_ref()).map_err(|e| {
            tracing::error!("Stored tree for project {} is unreadable: {:?}", self.project, e);
            ExplorerError::from(e)
        })?;
        Ok(Some(tree))
    }

    #[instrument(skip(self, tree), fields(project = %self.project, items = tree.len()))]
    fn save(&self, tree: &SerializedTree) -> Result<()> {
        let mut bytes = Vec::new();
        into_writer(tree, &mut bytes)?;
        self.projects.insert(self.project.as_bytes(), bytes)?;
        self.db.flush()?;
        Ok(())
    }
}

/// Keeps the tree in memory. Used by tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tree: RefCell<Option<SerializedTree>>,
    saves: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    pub fn with_tree(tree: SerializedTree) -> MemoryStore {
        MemoryStore {
            tree: RefCell::new(Some(tree)),
            saves: Cell::new(0),
        }
    }

    pub fn snapshot(&self) -> Option<SerializedTree> {
        self.tree.borrow().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.get()
    }
}

impl PersistenceAdapter for MemoryStore {
    fn load(&self) -> Result<Option<SerializedTree>> {
        Ok(self.tree.borrow().clone())
    }

    fn save(&self, tree: &SerializedTree) -> Result<()> {
        *self.tree.borrow_mut() = Some(tree.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explorer::Item;

    fn sample() -> SerializedTree {
        let mut tree = SerializedTree::new();
        tree.insert("/src/".to_string(), Item::folder());
        tree.insert("/src/main.rs".to_string(), Item::open_file("fn main() {}"));
        tree.insert("/src/lib.rs".to_string(), Item::file(""));
        tree
    }

    #[test]
    fn test_sled_store_roundtrip_keeps_order() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SledStore::open(&tmp.path().join("db"), "demo").unwrap();
        assert!(store.load().unwrap().is_none());

        store.save(&sample()).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, sample());
        assert_eq!(
            loaded.keys().collect::<Vec<_>>(),
            vec!["/src/", "/src/main.rs", "/src/lib.rs"]
        );
    }

    #[test]
    fn test_sled_store_projects_are_separate() {
        let tmp = tempfile::tempdir().unwrap();
        let first = SledStore::open(&tmp.path().join("db"), "first").unwrap();
        let second = first.for_project("second");
        first.save(&sample()).unwrap();

        assert!(second.load().unwrap().is_none());
        assert_eq!(first.list_projects().unwrap(), vec!["first".to_string()]);

        assert!(first.remove_project("first").unwrap());
        assert!(!first.remove_project("first").unwrap());
        assert!(first.load().unwrap().is_none());
        assert!(first.list_projects().unwrap().is_empty());
    }

    #[test]
    fn test_sled_store_reopens_after_drop() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("db");
        for round in 0..5 {
            let store = SledStore::open(&dir, "demo").unwrap();
            if round == 0 {
                store.save(&sample()).unwrap();
            }
            assert_eq!(store.load().unwrap(), Some(sample()));
        }
    }

    #[test]
    fn test_sled_store_rejects_corrupt_blob() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SledStore::open(&tmp.path().join("db"), "demo").unwrap();
        store.projects.insert("demo", &b"\xff\x00not cbor"[..]).unwrap();
        let err = store.load().unwrap_err();
        assert_eq!(err.kind(), ExplorerErrorType::SerializationError);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());
        store.save(&sample()).unwrap();
        store.save(&sample()).unwrap();
        assert_eq!(store.snapshot(), Some(sample()));
        assert_eq!(store.save_count(), 2);
    }
}
