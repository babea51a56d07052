use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use super::{
    ChangeNotifier, CollectionError, CollectionItem, CollectionKind, Committed, Subscription,
};
use crate::events::ChangeEvent;
use crate::storage::{PersistenceAdapter, StorageError, StorageKey};

/// How `add` places an item in the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPolicy {
    /// Newest first; adding an existing id moves it to the front with the new
    /// value instead of duplicating it.
    BumpToFront,
    /// Newest first; every add creates a new entry.
    Prepend,
    /// Insertion order; an id is either present once or absent.
    Membership,
}

impl InsertPolicy {
    fn inserts_at_front(&self) -> bool {
        !matches!(self, InsertPolicy::Membership)
    }

    fn unique_ids(&self) -> bool {
        !matches!(self, InsertPolicy::Prepend)
    }
}

/// One user scoped collection, kept in memory and mirrored to storage.
///
/// Storage is read once, when the store is opened. Every mutation updates the
/// in-memory copy, then saves it, then notifies subscribers.
pub struct CollectionStore<T: CollectionItem> {
    kind: CollectionKind,
    key: StorageKey,
    policy: InsertPolicy,
    max_len: Option<usize>,
    persistence: PersistenceAdapter,
    notifier: ChangeNotifier,
    items: Mutex<Vec<T>>,
}

impl<T: CollectionItem> CollectionStore<T> {
    pub fn open(
        kind: CollectionKind,
        key: StorageKey,
        policy: InsertPolicy,
        max_len: Option<usize>,
        persistence: PersistenceAdapter,
        notifier: ChangeNotifier,
    ) -> Self {
        let items = Self::load_items(kind, &key, policy, max_len, &persistence);
        debug!("Opened {} under '{}' with {} items", kind, key, items.len());
        CollectionStore {
            kind,
            key,
            policy,
            max_len,
            persistence,
            notifier,
            items: Mutex::new(items),
        }
    }

    fn load_items(
        kind: CollectionKind,
        key: &StorageKey,
        policy: InsertPolicy,
        max_len: Option<usize>,
        persistence: &PersistenceAdapter,
    ) -> Vec<T> {
        let Some(mut items) = persistence.load::<Vec<T>>(key) else {
            return Vec::new();
        };

        if let Some(err) = items.iter().find_map(|item| item.validate().err()) {
            warn!("Ignoring persisted {} under '{}': {}", kind, key, err);
            return Vec::new();
        }

        if policy.unique_ids() {
            let mut seen = HashSet::new();
            let before = items.len();
            items.retain(|item| seen.insert(item.item_id().to_string()));
            if items.len() != before {
                warn!(
                    "Dropped {} duplicate entries from persisted {}",
                    before - items.len(),
                    kind
                );
            }
        }

        if policy.inserts_at_front() {
            items.sort_by(|a, b| b.recency().cmp(&a.recency()));
        }

        if let Some(max_len) = max_len {
            trim_to(&mut items, max_len, policy);
        }
        items
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn key(&self) -> &StorageKey {
        &self.key
    }

    pub fn max_len(&self) -> Option<usize> {
        self.max_len
    }

    fn items(&self) -> MutexGuard<'_, Vec<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the collection, newest first for front inserting policies,
    /// insertion order otherwise.
    pub fn get_all(&self) -> Vec<T> {
        self.items().clone()
    }

    pub fn get(&self, id: &str) -> Option<T> {
        self.items().iter().find(|item| item.item_id() == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items().iter().any(|item| item.item_id() == id)
    }

    /// Inserts `item` according to the store's [`InsertPolicy`].
    /// The committed value is false only when a membership collection
    /// already contained the id.
    pub fn add(&self, item: T) -> Result<Committed<bool>, CollectionError> {
        item.validate()?;
        let id = item.item_id().to_string();

        let (save_result, evicted) = {
            let mut items = self.items();
            if self.policy == InsertPolicy::Membership
                && items.iter().any(|existing| existing.item_id() == id)
            {
                return Ok(Committed::unchanged(false));
            }
            let evicted = self.insert(&mut items, item);
            (self.persist(&items), evicted)
        };

        self.notifier.publish(&ChangeEvent::ItemAdded {
            collection: self.kind,
            id,
        });
        self.publish_removed(evicted);
        Ok(Committed::new(true, save_result))
    }

    /// Removes every entry with the given id and returns how many there were.
    /// Removing an absent id changes nothing and saves nothing.
    pub fn remove(&self, id: &str) -> Committed<usize> {
        let (save_result, removed) = {
            let mut items = self.items();
            let before = items.len();
            items.retain(|item| item.item_id() != id);
            let removed = before - items.len();
            if removed == 0 {
                return Committed::unchanged(0);
            }
            (self.persist(&items), removed)
        };

        self.notifier.publish(&ChangeEvent::ItemRemoved {
            collection: self.kind,
            id: id.to_string(),
        });
        Committed::new(removed, save_result)
    }

    /// Adds `item` if its id is absent, removes it otherwise.
    /// The committed value is the resulting membership.
    pub fn toggle(&self, item: T) -> Result<Committed<bool>, CollectionError> {
        item.validate()?;
        let id = item.item_id().to_string();

        let (save_result, present, evicted) = {
            let mut items = self.items();
            let before = items.len();
            items.retain(|existing| existing.item_id() != id);
            if items.len() != before {
                (self.persist(&items), false, Vec::new())
            } else {
                let evicted = self.insert(&mut items, item);
                (self.persist(&items), true, evicted)
            }
        };

        let event = if present {
            ChangeEvent::ItemAdded {
                collection: self.kind,
                id,
            }
        } else {
            ChangeEvent::ItemRemoved {
                collection: self.kind,
                id,
            }
        };
        self.notifier.publish(&event);
        self.publish_removed(evicted);
        Ok(Committed::new(present, save_result))
    }

    pub fn clear(&self) -> Committed<()> {
        let save_result = {
            let mut items = self.items();
            items.clear();
            self.persist(&items)
        };

        self.notifier.publish(&ChangeEvent::CollectionCleared {
            collection: self.kind,
        });
        Committed::new((), save_result)
    }

    /// Registers `callback` for changes to collections of this kind. Events
    /// carry no namespace, so with a shared notifier the callback also fires
    /// for the same kind stored under another handle.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let kind = self.kind;
        self.notifier.subscribe(move |event| {
            if event.collection() == Some(kind) {
                callback(event);
            }
        })
    }

    fn insert(&self, items: &mut Vec<T>, item: T) -> Vec<T> {
        match self.policy {
            InsertPolicy::BumpToFront => {
                items.retain(|existing| existing.item_id() != item.item_id());
                insert_newest_first(items, item);
            }
            InsertPolicy::Prepend => insert_newest_first(items, item),
            InsertPolicy::Membership => items.push(item),
        }
        match self.max_len {
            Some(max_len) => trim_to(items, max_len, self.policy),
            None => Vec::new(),
        }
    }

    fn persist(&self, items: &[T]) -> Result<(), StorageError> {
        let result = self.persistence.save(&self.key, items);
        if let Err(err) = &result {
            warn!(
                "Failed to persist {} under '{}', changes are kept in memory only: {}",
                self.kind, self.key, err
            );
        }
        result
    }

    fn publish_removed(&self, removed: Vec<T>) {
        for item in removed {
            self.notifier.publish(&ChangeEvent::ItemRemoved {
                collection: self.kind,
                id: item.item_id().to_string(),
            });
        }
    }
}

/// Inserts `item` ahead of every entry that is not newer than it, so the
/// collection stays newest first even when `item` carries an older time.
fn insert_newest_first<T: CollectionItem>(items: &mut Vec<T>, item: T) {
    let position = items
        .iter()
        .position(|existing| existing.recency() <= item.recency())
        .unwrap_or(items.len());
    items.insert(position, item);
}

/// Drops the oldest entries beyond `max_len` and returns them.
fn trim_to<T>(items: &mut Vec<T>, max_len: usize, policy: InsertPolicy) -> Vec<T> {
    if items.len() <= max_len {
        return Vec::new();
    }
    if policy.inserts_at_front() {
        items.split_off(max_len)
    } else {
        let excess = items.len() - max_len;
        items.drain(..excess).collect()
    }
}
