//! Tubeshelf Library
//!
//! Persisted per-user collections of a video-sharing client: watch history,
//! liked videos, watch later, channel subscriptions and authored posts, plus
//! the session store that decides whose collections are open.

pub mod catalog;
pub mod collections;
pub mod config;
pub mod events;
pub mod library;
pub mod session;
pub mod settings;
pub mod sqlite_persistence;
pub mod storage;

// Re-export commonly used types for convenience
pub use catalog::{Catalog, StaticCatalog};
pub use collections::{ChangeNotifier, Committed, Subscription};
pub use events::ChangeEvent;
pub use library::{Library, UserCollections, WatchOutcome};
pub use session::{Guarded, Identity, SessionStore};
pub use storage::{KeyValueStorage, MemoryStorage, PersistenceAdapter, SqliteStorage};
