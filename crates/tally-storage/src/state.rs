//! Typed access to the client's persisted values.

use crate::{KeyValueStore, StorageKeys, StorageResult};
use std::sync::Arc;

/// High-level API over the raw key-value store.
///
/// Every persisted value the client owns goes through here so key names live
/// in one place.
#[derive(Clone)]
pub struct PersistedState {
    store: Arc<dyn KeyValueStore>,
}

impl PersistedState {
    /// Create a new state accessor over the given backend
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    // ==========================================
    // User identity
    // ==========================================

    /// Stored user id; blank values count as absent.
    pub fn user_id(&self) -> StorageResult<Option<String>> {
        self.get_non_empty(StorageKeys::USER_ID)
    }

    pub fn set_user_id(&self, user_id: &str) -> StorageResult<()> {
        self.store.set(StorageKeys::USER_ID, user_id)
    }

    // ==========================================
    // Experiments
    // ==========================================

    /// Last experiment definition JSON, verbatim as the server sent it.
    pub fn experiments_json(&self) -> StorageResult<Option<String>> {
        self.get_non_empty(StorageKeys::EXPERIMENTS)
    }

    pub fn set_experiments_json(&self, json: &str) -> StorageResult<()> {
        self.store.set(StorageKeys::EXPERIMENTS, json)
    }

    /// Last `X-AB-Version` value echoed back to the server.
    pub fn experiments_version(&self) -> StorageResult<Option<String>> {
        self.get_non_empty(StorageKeys::EXPERIMENTS_VERSION)
    }

    pub fn set_experiments_version(&self, version: &str) -> StorageResult<()> {
        self.store.set(StorageKeys::EXPERIMENTS_VERSION, version)
    }

    // ==========================================
    // Event queue
    // ==========================================

    /// Serialized queue snapshot.
    pub fn queue_snapshot(&self) -> StorageResult<Option<String>> {
        self.get_non_empty(StorageKeys::EVENT_QUEUE)
    }

    pub fn set_queue_snapshot(&self, snapshot: &str) -> StorageResult<()> {
        self.store.set(StorageKeys::EVENT_QUEUE, snapshot)
    }

    fn get_non_empty(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.store.get(key)?.filter(|value| !value.is_empty()))
    }
}

impl std::fmt::Debug for PersistedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedState").finish_non_exhaustive()
    }
}
