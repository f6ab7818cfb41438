//! Key-value persistence backends
//!
//! The session store only needs string slots addressed by string keys, so any backend
//! offering get/set/remove can stand in for browser local storage.

use nexus_core::{storage_error, validation_error, ErrorContext, NexusError, NexusResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// String slots addressed by string keys
pub trait KeyValueStore: Send + Sync {
    /// Read a slot; `Ok(None)` when it was never written or has been removed
    fn get(&self, key: &str) -> NexusResult<Option<String>>;

    /// Overwrite a slot
    fn set(&self, key: &str, value: &str) -> NexusResult<()>;

    /// Delete a slot. Removing an absent slot succeeds.
    fn remove(&self, key: &str) -> NexusResult<()>;
}

/// In-memory store for tests and throwaway sessions. Clones share the same slots.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    slots: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of occupied slots
    pub fn len(&self) -> NexusResult<usize> {
        let slots = self.slots.read().map_err(|_| poisoned())?;
        Ok(slots.len())
    }

    pub fn is_empty(&self) -> NexusResult<bool> {
        Ok(self.len()? == 0)
    }
}

fn poisoned() -> NexusError {
    storage_error!("Memory store lock poisoned", "memory_store")
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> NexusResult<Option<String>> {
        let slots = self.slots.read().map_err(|_| poisoned())?;
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> NexusResult<()> {
        let mut slots = self.slots.write().map_err(|_| poisoned())?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> NexusResult<()> {
        let mut slots = self.slots.write().map_err(|_| poisoned())?;
        slots.remove(key);
        Ok(())
    }
}

/// File-backed store: each slot is `<data_dir>/<key>.json`
#[derive(Clone, Debug)]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `data_dir`, creating the directory if needed
    pub fn new<P: AsRef<Path>>(data_dir: P) -> NexusResult<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();

        std::fs::create_dir_all(&data_dir).map_err(|e| NexusError::Storage {
            message: format!(
                "Failed to create data directory {}: {}",
                data_dir.display(),
                e
            ),
            source: Some(Box::new(e)),
            context: ErrorContext::new("file_store")
                .with_operation("create_dir")
                .with_suggestion("Check storage.data_dir in your configuration"),
        })?;

        info!("File store initialized at: {}", data_dir.display());

        Ok(Self { data_dir })
    }

    fn slot_path(&self, key: &str) -> NexusResult<PathBuf> {
        validate_key(key)?;
        Ok(self.data_dir.join(format!("{}.json", key)))
    }
}

/// Keys become file names, so only a conservative character set is accepted
fn validate_key(key: &str) -> NexusResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

    if valid {
        Ok(())
    } else {
        Err(validation_error!(
            format!("Invalid storage key '{}'", key),
            "key",
            "file_store"
        ))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> NexusResult<Option<String>> {
        let path = self.slot_path(key)?;

        match std::fs::read_to_string(&path) {
            Ok(content) => {
                debug!("Read slot {} from {}", key, path.display());
                Ok(Some(content))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(NexusError::Storage {
                message: format!("Failed to read {}: {}", path.display(), e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("file_store")
                    .with_operation("get")
                    .with_metadata("key", key),
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> NexusResult<()> {
        let path = self.slot_path(key)?;
        // Write then rename so a crash never leaves a half-written slot
        let tmp_path = path.with_extension("json.tmp");

        if let Err(e) = std::fs::write(&tmp_path, value)
            .and_then(|_| std::fs::rename(&tmp_path, &path))
        {
            if let Err(cleanup) = std::fs::remove_file(&tmp_path) {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove {}: {}", tmp_path.display(), cleanup);
                }
            }

            return Err(NexusError::Storage {
                message: format!("Failed to write {}: {}", path.display(), e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("file_store")
                    .with_operation("set")
                    .with_metadata("key", key)
                    .with_suggestion("Check that the data directory is writable"),
            });
        }

        debug!("Wrote slot {} to {}", key, path.display());
        Ok(())
    }

    fn remove(&self, key: &str) -> NexusResult<()> {
        let path = self.slot_path(key)?;

        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed slot {} ({})", key, path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(NexusError::Storage {
                message: format!("Failed to remove {}: {}", path.display(), e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("file_store")
                    .with_operation("remove")
                    .with_metadata("key", key),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_basic_operations() {
        let store = MemoryStore::new();
        assert!(store.is_empty().unwrap());
        assert_eq!(store.get("missing").unwrap(), None);

        store.set("a", "1").unwrap();
        store.set("a", "2").unwrap();
        assert_eq!(store.get("a").unwrap(), Some("2".to_string()));
        assert_eq!(store.len().unwrap(), 1);

        store.remove("a").unwrap();
        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn test_memory_store_reports_poisoned_lock() {
        let store = MemoryStore::new();
        let handle = store.clone();

        let _ = std::thread::spawn(move || {
            let _guard = handle.slots.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        assert!(matches!(store.len(), Err(NexusError::Storage { .. })));
        assert!(matches!(store.is_empty(), Err(NexusError::Storage { .. })));
        assert!(matches!(store.get("a"), Err(NexusError::Storage { .. })));
    }

    #[test]
    fn test_memory_store_clones_share_slots() {
        let store = MemoryStore::new();
        let handle = store.clone();

        handle.set("shared", "value").unwrap();
        assert_eq!(store.get("shared").unwrap(), Some("value".to_string()));
    }

    #[test]
    fn test_file_store_operations() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("data")).unwrap();

        assert_eq!(store.get("nexus_all_users").unwrap(), None);

        store.set("nexus_all_users", "[]").unwrap();
        assert!(dir.path().join("data/nexus_all_users.json").exists());
        assert_eq!(
            store.get("nexus_all_users").unwrap(),
            Some("[]".to_string())
        );

        store.remove("nexus_all_users").unwrap();
        assert_eq!(store.get("nexus_all_users").unwrap(), None);
        // Removing twice is fine
        store.remove("nexus_all_users").unwrap();
    }

    #[test]
    fn test_file_store_failed_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        // A directory in the slot's place makes the final rename fail
        std::fs::create_dir(dir.path().join("blocked.json")).unwrap();
        std::fs::write(dir.path().join("blocked.json/keep"), "x").unwrap();

        match store.set("blocked", "value") {
            Err(NexusError::Storage { .. }) => {}
            other => panic!("expected storage error, got {:?}", other),
        }
        assert!(!dir.path().join("blocked.json.tmp").exists());
        assert!(dir.path().join("blocked.json").is_dir());
    }

    #[test]
    fn test_file_store_rejects_unsafe_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        for key in ["", "../escape", ".hidden", "a/b", "with space"] {
            match store.set(key, "x") {
                Err(NexusError::Validation { field, .. }) => {
                    assert_eq!(field.as_deref(), Some("key"))
                }
                other => panic!("expected validation error for {:?}, got {:?}", key, other),
            }
        }

        assert!(validate_key("nexus.v2-users_1").is_ok());
    }
}
