//! Persistent key-value storage and the typed JSON adapter on top of it.
//!
//! Every collection store mirrors its in-memory state into a single key of a
//! [`KeyValueStorage`]. Backends only deal with raw strings; serialization and
//! corruption handling live in [`PersistenceAdapter`].

mod key;
mod memory_storage;
mod persistence;
mod sqlite_storage;

pub use key::{StorageKey, ANONYMOUS_NAMESPACE};
pub use memory_storage::MemoryStorage;
pub use persistence::{LoadError, PersistenceAdapter};
pub use sqlite_storage::SqliteStorage;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded writing '{key}': {needed} bytes needed, {available} available")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Raw string storage keyed by string, the analogue of a browser's local
/// key-value storage.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait KeyValueStorage: Send + Sync {
    /// Returns the value stored under `key`.
    /// Returns Ok(None) if the key was never written or was removed.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Returns all stored keys, sorted.
    fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Returns the number of bytes currently used by keys and values.
    fn used_bytes(&self) -> Result<usize, StorageError>;
}
