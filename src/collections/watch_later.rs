use super::{
    ChangeNotifier, CollectionError, CollectionKind, CollectionStore, Committed, InsertPolicy,
    Subscription, VideoRef,
};
use crate::events::ChangeEvent;
use crate::storage::{PersistenceAdapter, StorageKey};

/// Queue of videos saved for later, oldest first.
pub struct WatchLater {
    store: CollectionStore<VideoRef>,
}

impl WatchLater {
    pub fn open(
        handle: Option<&str>,
        persistence: PersistenceAdapter,
        notifier: ChangeNotifier,
    ) -> Self {
        let kind = CollectionKind::WatchLater;
        WatchLater {
            store: CollectionStore::open(
                kind,
                StorageKey::scoped(kind.key_prefix(), handle),
                InsertPolicy::Membership,
                None,
                persistence,
                notifier,
            ),
        }
    }

    pub fn toggle(&self, video: VideoRef) -> Result<Committed<bool>, CollectionError> {
        self.store.toggle(video)
    }

    /// Queues `video`; queuing it twice keeps a single entry.
    pub fn enqueue(&self, video: VideoRef) -> Result<Committed<bool>, CollectionError> {
        self.store.add(video)
    }

    pub fn contains(&self, video_id: &str) -> bool {
        self.store.contains(video_id)
    }

    pub fn get_all(&self) -> Vec<VideoRef> {
        self.store.get_all()
    }

    /// The video that has been waiting the longest.
    pub fn next(&self) -> Option<VideoRef> {
        self.store.get_all().into_iter().next()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn remove(&self, video_id: &str) -> Committed<usize> {
        self.store.remove(video_id)
    }

    pub fn clear(&self) -> Committed<()> {
        self.store.clear()
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.store.subscribe(callback)
    }
}
