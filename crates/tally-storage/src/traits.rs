//! Storage trait definitions.

use crate::StorageResult;

/// Trait for string key-value backends.
///
/// Implementations must be safe to call from any thread; writes are expected
/// to be durable once `set` returns.
pub trait KeyValueStore: Send + Sync {
    /// Store a value
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Retrieve a value
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Delete a value, returning whether it existed
    fn delete(&self, key: &str) -> StorageResult<bool>;

    /// Check if a key exists
    fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
