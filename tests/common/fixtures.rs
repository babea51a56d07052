//! Fixtures for end-to-end tests: temp storage, demo catalog and a
//! storage backend that refuses every write.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tubeshelf::catalog::{Catalog, StaticCatalog};
use tubeshelf::collections::VideoRef;
use tubeshelf::config::AppConfig;
use tubeshelf::storage::{KeyValueStorage, MemoryStorage, SqliteStorage, StorageError};
use tubeshelf::Library;

pub fn demo_catalog() -> StaticCatalog {
    tubeshelf::catalog::load_catalog(None).expect("demo catalog should load")
}

pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).expect("valid timestamp")
}

/// A library with its storage and the catalog its tests pick videos from.
///
/// The temp directory lives as long as the fixture, so the SQLite file can
/// be reopened with [`TestLibrary::reopen`].
pub struct TestLibrary {
    pub library: Library,
    pub storage: Arc<dyn KeyValueStorage>,
    pub catalog: StaticCatalog,
    pub config: AppConfig,
    db_path: Option<PathBuf>,
    _dir: Option<TempDir>,
}

impl TestLibrary {
    /// Library over a fresh SQLite file in a temp directory.
    pub fn on_disk() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let db_path = dir.path().join("tubeshelf.db");
        let config = AppConfig {
            storage_path: Some(db_path.clone()),
            ..Default::default()
        };
        let storage: Arc<dyn KeyValueStorage> =
            Arc::new(SqliteStorage::new(&db_path).expect("sqlite storage"));
        Self::build(storage, config, Some(db_path), Some(dir))
    }

    pub fn in_memory() -> Self {
        Self::with_storage(Arc::new(MemoryStorage::new()))
    }

    pub fn with_storage(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self::build(storage, AppConfig::default(), None, None)
    }

    pub fn with_config(config: AppConfig) -> Self {
        let storage = tubeshelf::library::open_storage(&config).expect("storage");
        Self::build(storage, config, None, None)
    }

    fn build(
        storage: Arc<dyn KeyValueStorage>,
        config: AppConfig,
        db_path: Option<PathBuf>,
        dir: Option<TempDir>,
    ) -> Self {
        TestLibrary {
            library: Library::open(storage.clone(), &config),
            storage,
            catalog: demo_catalog(),
            config,
            db_path,
            _dir: dir,
        }
    }

    /// Drops the library and opens a new one over the same storage.
    ///
    /// For on-disk fixtures the SQLite file is reopened from scratch, as a
    /// restarted process would.
    pub fn reopen(self) -> Self {
        let TestLibrary {
            library,
            storage,
            catalog,
            config,
            db_path,
            _dir,
        } = self;
        drop(library);
        let storage = match &db_path {
            Some(path) => {
                drop(storage);
                Arc::new(SqliteStorage::new(path).expect("reopen sqlite storage"))
                    as Arc<dyn KeyValueStorage>
            }
            None => storage,
        };
        TestLibrary {
            library: Library::open(storage.clone(), &config),
            storage,
            catalog,
            config,
            db_path,
            _dir,
        }
    }

    pub fn video(&self, id: &str) -> VideoRef {
        self.catalog
            .video_ref(id)
            .unwrap_or_else(|| panic!("video {} not in demo catalog", id))
    }
}

/// Reads normally but fails every write, like a browser storage that is
/// full or disabled.
pub struct FailingStorage {
    inner: MemoryStorage,
}

impl FailingStorage {
    /// Wraps storage that already holds `entries`.
    pub fn seeded(entries: &[(&str, &str)]) -> Self {
        let inner = MemoryStorage::new();
        for (key, value) in entries {
            inner.set(key, value).expect("seed storage");
        }
        FailingStorage { inner }
    }
}

impl KeyValueStorage for FailingStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("writes disabled".to_string()))
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("writes disabled".to_string()))
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.inner.keys()
    }

    fn used_bytes(&self) -> Result<usize, StorageError> {
        self.inner.used_bytes()
    }
}
