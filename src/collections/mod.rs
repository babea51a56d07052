mod history;
mod liked;
mod models;
mod observer;
mod posts;
mod store;
mod subscriptions;
mod watch_later;

pub use history::{group_by_day, DayGroup, DayLabel, HistoryStore};
pub use liked::LikedVideos;
pub use models::{
    AuthoredPost, ChannelId, CollectionItem, HistoryEntry, InlineImage, PostDraft, VideoRef,
    Visibility,
};
pub use observer::{ChangeNotifier, Subscription};
pub use posts::PostStore;
pub use store::{CollectionStore, InsertPolicy};
pub use subscriptions::Subscriptions;
pub use watch_later::WatchLater;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::storage::StorageError;

/// The user scoped collections, each persisted under its own key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    History,
    LikedVideos,
    WatchLater,
    Subscriptions,
    Posts,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 5] = [
        CollectionKind::History,
        CollectionKind::LikedVideos,
        CollectionKind::WatchLater,
        CollectionKind::Subscriptions,
        CollectionKind::Posts,
    ];

    /// Prefix of the storage key, completed by the user handle.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            CollectionKind::History => "watch_history",
            CollectionKind::LikedVideos => "liked_videos",
            CollectionKind::WatchLater => "watch_later",
            CollectionKind::Subscriptions => "subscriptions",
            CollectionKind::Posts => "authored_posts",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_prefix())
    }
}

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("invalid item: {0}")]
    InvalidItem(String),

    #[error("image rejected: {0}")]
    ImageRejected(String),

    #[error("image is {size} bytes, at most {max} are allowed")]
    ImageTooLarge { size: usize, max: usize },
}

/// Result of a mutation that was applied in memory.
///
/// The in-memory collection is always updated; `save_error` tells whether the
/// change also reached storage and may therefore survive a reload.
#[derive(Debug)]
pub struct Committed<T> {
    value: T,
    save_error: Option<StorageError>,
}

impl<T> Committed<T> {
    pub(crate) fn new(value: T, save_result: Result<(), StorageError>) -> Self {
        Committed {
            value,
            save_error: save_result.err(),
        }
    }

    /// A mutation that turned out to be a no-op, so nothing had to be saved.
    pub(crate) fn unchanged(value: T) -> Self {
        Committed {
            value,
            save_error: None,
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn is_persisted(&self) -> bool {
        self.save_error.is_none()
    }

    pub fn save_error(&self) -> Option<&StorageError> {
        self.save_error.as_ref()
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Committed<U> {
        Committed {
            value: f(self.value),
            save_error: self.save_error,
        }
    }
}
