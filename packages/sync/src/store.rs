//! Durable slot for the last unsynced snapshot.
//!
//! The slot is written before every submission and cleared on success, so
//! a snapshot that never got acknowledged survives a restart.

use crate::errors::StoreError;
use chrono::{DateTime, Utc};
use easel_tree::Snapshot;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSnapshot {
    pub snapshot: Snapshot,
    pub saved_at: DateTime<Utc>,
}

impl PendingSnapshot {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            saved_at: Utc::now(),
        }
    }
}

pub trait SnapshotStore {
    fn load_pending(&mut self) -> Result<Option<PendingSnapshot>, StoreError>;

    fn save_pending(&mut self, pending: &PendingSnapshot) -> Result<(), StoreError>;

    fn clear_pending(&mut self) -> Result<(), StoreError>;
}

/// In-memory store; clones share the same slot
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Rc<RefCell<Option<PendingSnapshot>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with a pending snapshot, as if left by a crash
    pub fn with_pending(snapshot: Snapshot) -> Self {
        let store = Self::new();
        *store.slot.borrow_mut() = Some(PendingSnapshot::new(snapshot));
        store
    }

    pub fn peek(&self) -> Option<PendingSnapshot> {
        self.slot.borrow().clone()
    }
}

impl SnapshotStore for MemoryStore {
    fn load_pending(&mut self) -> Result<Option<PendingSnapshot>, StoreError> {
        Ok(self.slot.borrow().clone())
    }

    fn save_pending(&mut self, pending: &PendingSnapshot) -> Result<(), StoreError> {
        *self.slot.borrow_mut() = Some(pending.clone());
        Ok(())
    }

    fn clear_pending(&mut self) -> Result<(), StoreError> {
        self.slot.borrow_mut().take();
        Ok(())
    }
}

/// JSON file store
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write leaves the previous slot intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotStore for FileStore {
    fn load_pending(&mut self) -> Result<Option<PendingSnapshot>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let pending = serde_json::from_str(&content)?;
        Ok(Some(pending))
    }

    fn save_pending(&mut self, pending: &PendingSnapshot) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.tmp_path();
        fs::write(&tmp, serde_json::to_string_pretty(pending)?)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "Saved pending snapshot");
        Ok(())
    }

    fn clear_pending(&mut self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn snapshot() -> Snapshot {
        Snapshot::element("main", "root").with_child(Snapshot::text("draft"))
    }

    #[test]
    fn test_memory_store_clones_share_slot() {
        let store = MemoryStore::new();
        let mut writer = store.clone();
        writer.save_pending(&PendingSnapshot::new(snapshot())).unwrap();

        assert_eq!(store.peek().unwrap().snapshot, snapshot());
        writer.clear_pending().unwrap();
        assert!(store.peek().is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::new(dir.path().join("state/pending.json"));

        assert!(store.load_pending().unwrap().is_none());

        let pending = PendingSnapshot::new(snapshot());
        store.save_pending(&pending).unwrap();
        assert_eq!(store.load_pending().unwrap(), Some(pending));
        assert!(!store.tmp_path().exists());

        store.clear_pending().unwrap();
        store.clear_pending().unwrap();
        assert!(store.load_pending().unwrap().is_none());
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pending.json");
        fs::write(&path, "not json").unwrap();

        let mut store = FileStore::new(path);
        assert!(matches!(store.load_pending(), Err(StoreError::Json(_))));
    }
}
