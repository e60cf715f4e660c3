//! File-backed favorites at ~/.geolearn/favorites.json.
//!
//! The file holds a JSON array of facility names in insertion order.
//! Every mutation rewrites the whole array and notifies subscribers.
//!
//! Two stores opened on the same file do not coordinate: each rewrites the
//! file from its own in-memory copy, so the last writer wins. Call
//! [`FavoritesStore::reload`] before mutating to pick up the other's changes.

use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing::warn;

pub struct FavoritesStore {
    path: PathBuf,
    names: Vec<String>,
    notifier: watch::Sender<Vec<String>>,
}

impl FavoritesStore {
    /// Load favorites from the default location (~/.geolearn/favorites.json).
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Load favorites from a specific path. Missing or corrupt files load empty.
    pub fn load_from(path: PathBuf) -> Self {
        let names = Self::read_file(&path).unwrap_or_default();
        let (notifier, _) = watch::channel(names.clone());
        Self { path, names, notifier }
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".geolearn")
            .join("favorites.json")
    }

    fn read_file(path: &Path) -> Option<Vec<String>> {
        let data = fs::read_to_string(path).ok()?;
        serde_json::from_str(&data).ok()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Favorites in insertion order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        let name = name.trim();
        self.names.iter().any(|n| n.trim() == name)
    }

    /// Add a name. Returns false if it was blank or already present.
    pub fn add(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        self.commit();
        true
    }

    /// Remove a name. Returns false if it was not present.
    pub fn remove(&mut self, name: &str) -> bool {
        let name = name.trim();
        let before = self.names.len();
        self.names.retain(|n| n.trim() != name);
        if self.names.len() == before {
            return false;
        }
        self.commit();
        true
    }

    /// Flip membership. Returns whether the name is a favorite afterwards.
    pub fn toggle(&mut self, name: &str) -> bool {
        if self.contains(name) {
            self.remove(name);
            false
        } else {
            self.add(name)
        }
    }

    /// Re-read the file, replacing the in-memory copy.
    pub fn reload(&mut self) {
        self.names = Self::read_file(&self.path).unwrap_or_default();
        self.notifier.send_replace(self.names.clone());
    }

    /// Receive the full list after every change.
    pub fn subscribe(&self) -> watch::Receiver<Vec<String>> {
        self.notifier.subscribe()
    }

    fn commit(&self) {
        self.persist();
        self.notifier.send_replace(self.names.clone());
    }

    fn persist(&self) {
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(&self.names) {
            Ok(json) => {
                if let Err(e) = fs::write(&self.path, json) {
                    warn!(path = %self.path.display(), error = %e, "could not write favorites");
                }
            }
            Err(e) => warn!(error = %e, "could not serialize favorites"),
        }
    }

    /// Number of favorites (for testing).
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
