//! Persistence for the Tally client.
//!
//! This crate provides:
//! - [`KeyValueStore`]: the string key-value seam the client persists through
//! - [`MemoryStore`] and [`FileStore`]: in-process and JSON-file backends
//! - [`PersistedState`]: typed accessors for the values the client owns

mod file;
mod keys;
mod memory;
mod state;
mod traits;

pub use file::FileStore;
pub use keys::StorageKeys;
pub use memory::MemoryStore;
pub use state::PersistedState;
pub use traits::KeyValueStore;

use tally_config_and_utils::Paths;
use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific failure
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Open the default file-backed store under the given paths.
pub fn create_file_store(paths: &Paths) -> StorageResult<FileStore> {
    FileStore::open(paths.store_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn state() -> PersistedState {
        PersistedState::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_user_id_roundtrip() {
        let state = state();
        assert_eq!(state.user_id().unwrap(), None);

        state.set_user_id("user-123").unwrap();
        assert_eq!(state.user_id().unwrap().as_deref(), Some("user-123"));
    }

    #[test]
    fn test_blank_values_read_as_absent() {
        let state = state();
        state.set_user_id("").unwrap();
        state.set_experiments_json("").unwrap();

        assert_eq!(state.user_id().unwrap(), None);
        assert_eq!(state.experiments_json().unwrap(), None);
    }

    #[test]
    fn test_experiment_values_use_namespaced_keys() {
        let store = Arc::new(MemoryStore::new());
        let state = PersistedState::new(store.clone());

        state
            .set_experiments_json(r#"[{"name":["x"],"variants":[100]}]"#)
            .unwrap();
        state.set_experiments_version("42").unwrap();

        assert_eq!(
            store.get(StorageKeys::EXPERIMENTS).unwrap().as_deref(),
            Some(r#"[{"name":["x"],"variants":[100]}]"#)
        );
        assert_eq!(
            store.get(StorageKeys::EXPERIMENTS_VERSION).unwrap().as_deref(),
            Some("42")
        );
    }

    #[test]
    fn test_create_file_store_uses_paths() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let store = create_file_store(&paths).unwrap();
        assert_eq!(store.path(), paths.store_file().as_path());
    }
}
