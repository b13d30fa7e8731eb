//! Key-value persistence for cart snapshots.
//!
//! The cart manager only needs whole-value reads and writes under a single
//! key; there are no transactions and the last writer wins.
//!
//! - [`MemoryStore`] - In-process map, for tests and ephemeral sessions
//! - [`FileStore`] - One file per key under a directory, written atomically

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur reading or writing a store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store cannot serve requests.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Whole-value key-value persistence.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`, `None` if nothing has been written.
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value under `key`.
    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}
