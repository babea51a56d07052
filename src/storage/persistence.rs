use super::{KeyValueStorage, StorageError, StorageKey};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read '{key}': {source}")]
    Storage {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("malformed value under '{key}': {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Typed JSON view over a [`KeyValueStorage`].
#[derive(Clone)]
pub struct PersistenceAdapter {
    storage: Arc<dyn KeyValueStorage>,
}

impl PersistenceAdapter {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        PersistenceAdapter { storage }
    }

    pub fn storage(&self) -> &Arc<dyn KeyValueStorage> {
        &self.storage
    }

    /// Reads and parses the value under `key`.
    /// Returns Ok(None) if the key is absent.
    pub fn try_load<T: DeserializeOwned>(&self, key: &StorageKey) -> Result<Option<T>, LoadError> {
        let raw = self
            .storage
            .get(key.as_str())
            .map_err(|source| LoadError::Storage {
                key: key.to_string(),
                source,
            })?;

        match raw {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| LoadError::Malformed {
                    key: key.to_string(),
                    source,
                }),
        }
    }

    /// Like [`Self::try_load`], but unreadable or malformed data counts as
    /// absent.
    pub fn load<T: DeserializeOwned>(&self, key: &StorageKey) -> Option<T> {
        match self.try_load(key) {
            Ok(value) => value,
            Err(err) => {
                warn!("Ignoring persisted data: {}", err);
                None
            }
        }
    }

    pub fn save<T: Serialize + ?Sized>(&self, key: &StorageKey, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(value)?;
        self.storage.set(key.as_str(), &json)
    }

    pub fn delete(&self, key: &StorageKey) -> Result<(), StorageError> {
        self.storage.remove(key.as_str())
    }
}
