//! In-process key-value store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{KeyValueStore, StorageError};

/// Key-value store held in memory.
///
/// Nothing survives the process; used by tests and by sessions that should
/// not touch disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with one value already written.
    #[must_use]
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            entries: Mutex::new(HashMap::from([(key.into(), value.into())])),
        }
    }

    /// Current value under `key`, bypassing the async interface.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Unavailable("Lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.get(key)
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Unavailable("Lock poisoned".to_string()))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_missing_key() {
        let store = MemoryStore::new();
        assert_eq!(store.read("cart").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let store = MemoryStore::new();
        store.write("cart", "[]").await.unwrap();
        store.write("cart", "[1]").await.unwrap();
        assert_eq!(store.read("cart").await.unwrap().as_deref(), Some("[1]"));
        assert_eq!(store.read("other").await.unwrap(), None);
    }

    #[test]
    fn test_with_entry() {
        let store = MemoryStore::with_entry("cart", "[]");
        assert_eq!(store.get("cart").unwrap().as_deref(), Some("[]"));
    }
}
