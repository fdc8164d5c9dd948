//! JSON file store.

use crate::{KeyValueStore, StorageError, StorageResult};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Durable store that keeps every entry in a single JSON object on disk.
///
/// The whole file is rewritten on each mutation through a temporary sibling
/// and an atomic rename, so a crash leaves either the old or the new
/// contents, never a partial file. The in-memory map only changes once the
/// write has succeeded.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    data: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or create on first write) the store at `path`.
    ///
    /// An unreadable or corrupt file is logged and replaced by an empty store.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => match serde_json::from_str(&content) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Discarding corrupt store file");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StorageError::Io(e)),
        };

        debug!(path = %path.display(), entries = data.len(), "Opened file store");
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, data: &BTreeMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let encoded =
            serde_json::to_vec(data).map_err(|e| StorageError::Encoding(e.to_string()))?;

        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut file = std::fs::File::create(&tmp_path)?;
            file.write_all(&encoded)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut data = self.data.lock();
        let mut updated = data.clone();
        updated.insert(key.to_string(), value.to_string());
        self.flush(&updated)?;
        *data = updated;
        Ok(())
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.data.lock().get(key).cloned())
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        let mut data = self.data.lock();
        if !data.contains_key(key) {
            return Ok(false);
        }

        let mut updated = data.clone();
        updated.remove(key);
        self.flush(&updated)?;
        *data = updated;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        {
            let store = FileStore::open(&path).unwrap();
            store.set("tally.user.id", "user-1").unwrap();
            store.set("other", "value").unwrap();
            assert!(store.delete("other").unwrap());
        }

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("tally.user.id").unwrap().as_deref(),
            Some("user-1")
        );
        assert!(!reopened.has("other").unwrap());
    }

    #[test]
    fn test_missing_file_is_empty_until_first_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("anything").unwrap(), None);
        assert!(!path.exists());

        store.set("k", "v").unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_discarded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "v").unwrap();
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_failed_write_leaves_memory_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = FileStore::open(&path).unwrap();
        store.set("k", "old").unwrap();

        // A directory in the temp file's place makes every write fail.
        std::fs::create_dir(path.with_extension("json.tmp")).unwrap();
        assert!(store.set("k", "new").is_err());
        assert!(store.delete("k").is_err());

        assert_eq!(store.get("k").unwrap().as_deref(), Some("old"));
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("k").unwrap().as_deref(), Some("old"));
    }

    #[test]
    fn test_delete_missing_key_does_not_create_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = FileStore::open(&path).unwrap();
        assert!(!store.delete("nope").unwrap());
        assert!(!path.exists());
    }
}
