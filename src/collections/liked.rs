use super::{
    ChangeNotifier, CollectionError, CollectionKind, CollectionStore, Committed, InsertPolicy,
    Subscription, VideoRef,
};
use crate::events::ChangeEvent;
use crate::storage::{PersistenceAdapter, StorageKey};

/// Videos the user liked, in the order they were liked.
pub struct LikedVideos {
    store: CollectionStore<VideoRef>,
}

impl LikedVideos {
    pub fn open(
        handle: Option<&str>,
        persistence: PersistenceAdapter,
        notifier: ChangeNotifier,
    ) -> Self {
        let kind = CollectionKind::LikedVideos;
        LikedVideos {
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

    /// Likes `video` if it was not liked, unlikes it otherwise.
    /// Returns whether the video is liked afterwards.
    pub fn toggle(&self, video: VideoRef) -> Result<Committed<bool>, CollectionError> {
        self.store.toggle(video)
    }

    pub fn is_liked(&self, video_id: &str) -> bool {
        self.store.contains(video_id)
    }

    pub fn get_all(&self) -> Vec<VideoRef> {
        self.store.get_all()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn unlike(&self, video_id: &str) -> Committed<usize> {
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
