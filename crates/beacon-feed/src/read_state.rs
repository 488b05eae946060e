//! Persisted read/unread acknowledgement state.
//!
//! One durable key: a JSON array of notification id strings. Loaded once at
//! startup, written on every mutation, pruned to the server snapshot on
//! each full refresh.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;

use beacon_core::AppResult;

/// Durable store for the set of acknowledged notification ids.
pub trait ReadStateStore: Send + Sync {
    /// Load the persisted id set; an absent store yields an empty set.
    fn load(&self) -> AppResult<HashSet<String>>;

    /// Persist the full id set.
    fn save(&self, ids: &HashSet<String>) -> AppResult<()>;
}

/// File-backed store holding the serialized id set at a fixed path.
#[derive(Debug, Clone)]
pub struct FileReadStateStore {
    path: PathBuf,
}

impl FileReadStateStore {
    /// Creates a store at the given path. The file is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReadStateStore for FileReadStateStore {
    fn load(&self) -> AppResult<HashSet<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let ids: Vec<String> = serde_json::from_str(&raw)?;
                Ok(ids.into_iter().collect())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashSet::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, ids: &HashSet<String>) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Sorted output keeps the file diff-stable.
        let mut sorted: Vec<&String> = ids.iter().collect();
        sorted.sort();
        std::fs::write(&self.path, serde_json::to_string(&sorted)?)?;
        Ok(())
    }
}

/// In-memory store for ephemeral sessions and tests.
#[derive(Debug, Default)]
pub struct MemoryReadStateStore {
    ids: Mutex<HashSet<String>>,
}

impl MemoryReadStateStore {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReadStateStore for MemoryReadStateStore {
    fn load(&self) -> AppResult<HashSet<String>> {
        Ok(self
            .ids
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }

    fn save(&self, ids: &HashSet<String>) -> AppResult<()> {
        *self.ids.lock().unwrap_or_else(|e| e.into_inner()) = ids.clone();
        Ok(())
    }
}
