// Definition of the explorer's virtual file system. Every item lives in a single
// flat map keyed by its absolute path; folders are the keys ending in `/` and the
// hierarchy is recovered from the path strings whenever it is needed.

// Folders always get explicit entries: creating an item adds any missing parent
// folders, and deleting one leaves its parent folder behind. Trees restored from
// storage may still contain implicit folders, which every query tolerates.

mod listing;
mod tabs;

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::SeedProject;
use crate::errors::{ExplorerError, ExplorerErrorType, Result};
use crate::paths::{self, ItemKind};
use crate::storage::PersistenceAdapter;

pub use listing::FolderContents;
pub use tabs::{FileView, Tab};

/// Serialized form of the explorer, structurally identical to the live map.
pub type SerializedTree = IndexMap<String, Item>;

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) content: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub(crate) is_open_in_tabs: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub(crate) is_current: bool,
}

impl Item {
    pub fn folder() -> Item {
        Item::default()
    }

    pub fn file(content: impl Into<String>) -> Item {
        Item {
            content: Some(content.into()),
            is_open_in_tabs: false,
            is_current: false,
        }
    }

    /// A file that is open and focused.
    pub fn open_file(content: impl Into<String>) -> Item {
        Item {
            content: Some(content.into()),
            is_open_in_tabs: true,
            is_current: true,
        }
    }

    pub fn is_file(&self) -> bool {
        self.content.is_some()
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn is_open_in_tabs(&self) -> bool {
        self.is_open_in_tabs
    }

    pub fn is_current(&self) -> bool {
        self.is_current
    }
}

#[derive(Debug, Clone)]
pub struct Explorer {
    items: IndexMap<String, Item>,
    seed: SeedProject,
}

impl Default for Explorer {
    fn default() -> Self {
        Explorer::new(SeedProject::default())
    }
}

impl Explorer {
    /// A fresh single-file project.
    pub fn new(seed: SeedProject) -> Explorer {
        let mut items = IndexMap::new();
        let folder = format!("{}{}/", paths::ROOT, seed.folder);
        let file = format!("{}{}", folder, seed.file);
        items.insert(folder, Item::folder());
        items.insert(file, Item::open_file(seed.content.clone()));
        Explorer { items, seed }
    }

    /// Restore a stored tree, repairing anything that breaks the explorer's
    /// invariants.
    pub fn restore(tree: SerializedTree, seed: SeedProject) -> Explorer {
        let mut explorer = Explorer { items: tree, seed };
        explorer.repair();
        explorer
    }

    pub fn from_serialized(tree: SerializedTree) -> Explorer {
        Explorer::restore(tree, SeedProject::default())
    }

    /// Load the session from `store`, seeding the default project when nothing
    /// has been saved yet.
    #[instrument(skip(store))]
    pub fn open<S: PersistenceAdapter + ?Sized>(store: &S, seed: SeedProject) -> Result<Explorer> {
        match store.load()? {
            Some(tree) => {
                tracing::info!("Restoring explorer with {} stored items", tree.len());
                Ok(Explorer::restore(tree, seed))
            }
            None => {
                tracing::info!("No saved project found, seeding {}/{}", seed.folder, seed.file);
                Ok(Explorer::new(seed))
            }
        }
    }

    #[instrument(skip(self, store))]
    pub fn persist<S: PersistenceAdapter + ?Sized>(&self, store: &S) -> Result<()> {
        store.save(&self.items)?;
        tracing::info!("Saved explorer with {} items", self.items.len());
        Ok(())
    }

    pub fn to_serialized(&self) -> SerializedTree {
        self.items.clone()
    }

    pub fn into_serialized(self) -> SerializedTree {
        self.items
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.items)?)
    }

    pub fn from_json(json: &str, seed: SeedProject) -> Result<Explorer> {
        let tree: SerializedTree = serde_json::from_str(json)?;
        Ok(Explorer::restore(tree, seed))
    }

    pub fn seed(&self) -> &SeedProject {
        &self.seed
    }

    fn repair(&mut self) {
        self.items.retain(|path, _| {
            let keep = paths::is_absolute(path);
            if !keep {
                tracing::warn!("Dropping stored item with relative path {}", path);
            }
            keep
        });

        let mut last_current: Option<String> = None;
        for (path, item) in self.items.iter_mut() {
            match paths::classify(path) {
                ItemKind::Folder => {
                    if item.is_file() || item.is_open_in_tabs || item.is_current {
                        tracing::warn!("Stored folder {} carried file state, clearing it", path);
                        *item = Item::folder();
                    }
                }
                ItemKind::File => {
                    if item.content.is_none() {
                        item.content = Some(String::new());
                    }
                    if item.is_current {
                        if let Some(previous) = last_current.replace(path.clone()) {
                            tracing::warn!("Stored tree had several current files, dropping {}", previous);
                        }
                    }
                }
            }
        }

        for (path, item) in self.items.iter_mut() {
            let current = last_current.as_deref() == Some(path.as_str());
            item.is_current = current;
            if current {
                item.is_open_in_tabs = true;
            }
        }

        if self.items.is_empty() {
            tracing::warn!("Stored tree was empty, seeding the default project");
            *self = Explorer::new(self.seed.clone());
        } else if !self.items.keys().any(|path| paths::is_folder(path)) {
            let folder = format!("{}{}/", paths::ROOT, self.seed.folder);
            tracing::warn!("Stored tree had no folder, adding {}", folder);
            self.items.insert(folder, Item::folder());
        }
    }

    /// True when `path` is a key, or a folder implied by the keys beneath it.
    pub fn exists(&self, path: &str) -> bool {
        if self.items.contains_key(path) {
            return true;
        }
        paths::is_folder(path) && self.items.keys().any(|key| paths::is_within(key, path))
    }

    /// Whether an item of either kind already occupies `path`'s name.
    fn is_taken(&self, path: &str) -> bool {
        match paths::classify(path) {
            ItemKind::File => self.items.contains_key(path) || self.exists(&paths::as_folder(path)),
            ItemKind::Folder => {
                self.exists(path) || self.items.contains_key(path.trim_end_matches(paths::SEPARATOR))
            }
        }
    }

    #[instrument(skip(self))]
    pub fn create(&mut self, path: &str) -> Result<()> {
        if !paths::is_absolute(path) {
            tracing::info!("Refusing to create item at non-absolute path");
            return Err(ExplorerError::new(
                ExplorerErrorType::InvalidPath,
                format!("Path {} is not absolute", path),
            ));
        }
        let name = paths::item_name(path);
        if !paths::is_valid_name(name) {
            tracing::info!("Invalid item name {}", name);
            return Err(ExplorerError::invalid_name(name));
        }
        if self.is_taken(path) {
            tracing::info!("Path already exists");
            return Err(ExplorerError::already_exists(path));
        }
        let ancestors = paths::ancestors(path);
        if let Some(blocked) = ancestors
            .iter()
            .map(|ancestor| ancestor.trim_end_matches(paths::SEPARATOR))
            .find(|file| self.items.contains_key(*file))
        {
            tracing::info!("A file already uses the folder name {}", blocked);
            return Err(ExplorerError::already_exists(blocked));
        }

        for ancestor in ancestors {
            if !self.items.contains_key(&ancestor) {
                tracing::debug!("Creating missing folder {}", ancestor);
                self.items.insert(ancestor, Item::folder());
            }
        }

        match paths::classify(path) {
            ItemKind::Folder => {
                self.items.insert(path.to_string(), Item::folder());
            }
            ItemKind::File => {
                self.items.insert(path.to_string(), Item::open_file(""));
                self.change_current_file(path);
            }
        }
        tracing::info!("Created {}", path);
        Ok(())
    }

    /// Remove `path` and everything beneath it. Missing paths are ignored.
    #[instrument(skip(self))]
    pub fn delete(&mut self, path: &str) {
        let before = self.items.len();
        let mut removed_current = false;
        self.items.retain(|key, item| {
            if paths::is_within(key, path) {
                removed_current |= item.is_current;
                false
            } else {
                true
            }
        });
        let removed = before - self.items.len();
        if removed == 0 {
            tracing::debug!("Nothing to delete at {}", path);
            return;
        }

        let parent = paths::parent_path(path);
        self.items.entry(parent.clone()).or_insert_with(Item::folder);
        // Only the entry count matters here: emptying a lone `/src/` of its last
        // file also nests the fallback folder inside it.
        if self.items.len() == 1 {
            let fallback = format!("{}{}/", parent, self.seed.folder);
            tracing::info!("Project emptied, adding fallback folder {}", fallback);
            self.items.insert(fallback, Item::folder());
        }

        if removed_current {
            self.change_current_file_to_last_tab();
        }
        tracing::info!("Removed {} items at {}", removed, path);
    }

    #[instrument(skip(self))]
    pub fn rename(&mut self, path: &str, new_name: &str) -> Result<()> {
        if !paths::is_valid_name(new_name) {
            tracing::info!("Invalid item name {}", new_name);
            return Err(ExplorerError::invalid_name(new_name));
        }
        match paths::classify(path) {
            ItemKind::File => self.rename_file(path, new_name),
            ItemKind::Folder => self.rename_folder(path, new_name),
        }
    }

    fn rename_file(&mut self, path: &str, new_name: &str) -> Result<()> {
        if !self.items.contains_key(path) {
            return Err(ExplorerError::new(
                ExplorerErrorType::NotFound,
                format!("File {} does not exist", path),
            ));
        }
        let new_path = format!("{}{}", paths::parent_path(path), new_name);
        if self.is_taken(&new_path) {
            tracing::info!("Rename target already exists");
            return Err(ExplorerError::already_exists(&new_path));
        }

        self.rekey(|key| (key == path).then(|| new_path.clone()));
        tracing::info!("Renamed {} to {}", path, new_path);
        Ok(())
    }

    fn rename_folder(&mut self, path: &str, new_name: &str) -> Result<()> {
        if paths::depth(path) == 0 {
            return Err(ExplorerError::new(
                ExplorerErrorType::InvalidPath,
                "Root folder cannot be renamed!".to_string(),
            ));
        }
        if !self.exists(path) {
            return Err(ExplorerError::new(
                ExplorerErrorType::NotFound,
                format!("Folder {} does not exist", path),
            ));
        }

        let old_name = paths::item_name(path);
        if old_name == new_name {
            return Ok(());
        }

        // Every key carrying the folder's name as a segment is renamed, wherever
        // it sits in the tree.
        let moves: HashMap<String, String> = self
            .items
            .keys()
            .filter_map(|key| {
                paths::substitute_segment(key, old_name, new_name).map(|new_key| (key.clone(), new_key))
            })
            .collect();
        let target = format!("{}{}/", paths::parent_path(path), new_name);
        if let Some(existing) = self.rename_collision(&moves, &target) {
            tracing::info!("Rename target collides with {}", existing);
            return Err(ExplorerError::already_exists(&existing));
        }

        let moved = moves.len();
        self.rekey(|key| moves.get(key).cloned());
        tracing::info!("Renamed folder {} to {} ({} items)", path, target, moved);
        Ok(())
    }

    /// First key that a folder rename would overwrite, checked against every
    /// entry the rename leaves in place.
    fn rename_collision(&self, moves: &HashMap<String, String>, target: &str) -> Option<String> {
        let untouched = |key: &str| self.items.contains_key(key) && !moves.contains_key(key);
        let target_file = target.trim_end_matches(paths::SEPARATOR);
        if let Some(key) = self
            .items
            .keys()
            .map(String::as_str)
            .find(|key| untouched(key) && (paths::is_within(key, target) || *key == target_file))
        {
            return Some(key.to_string());
        }

        let mut seen = HashSet::new();
        for new_key in moves.values() {
            let other_kind = match paths::classify(new_key) {
                ItemKind::Folder => new_key.trim_end_matches(paths::SEPARATOR).to_string(),
                ItemKind::File => paths::as_folder(new_key).into_owned(),
            };
            if untouched(new_key) || untouched(&other_kind) || !seen.insert(new_key.as_str()) {
                return Some(new_key.clone());
            }
        }
        None
    }

    /// Rebuild the map with some keys replaced, keeping every item's position.
    fn rekey<F>(&mut self, mut rename: F)
    where
        F: FnMut(&str) -> Option<String>,
    {
        let items = std::mem::take(&mut self.items);
        self.items = items
            .into_iter()
            .map(|(key, item)| match rename(&key) {
                Some(new_key) => (new_key, item),
                None => (key, item),
            })
            .collect();
    }

    /// Overwrite a file's content. Saving to a folder or a missing path does nothing.
    pub fn save(&mut self, path: &str, content: impl Into<String>) {
        match self.items.get_mut(path) {
            Some(item) if item.is_file() => {
                item.content = Some(content.into());
                tracing::debug!("Saved content of {}", path);
            }
            _ => tracing::debug!("Ignoring save to {}", path),
        }
    }

    pub fn item(&self, path: &str) -> Option<&Item> {
        self.items.get(path)
    }

    pub fn file_content(&self, path: &str) -> Option<&str> {
        self.items.get(path).and_then(Item::content)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Item)> {
        self.items.iter().map(|(path, item)| (path.as_str(), item))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }
}
