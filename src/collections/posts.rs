use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use super::{
    AuthoredPost, ChangeNotifier, CollectionError, CollectionKind, CollectionStore, Committed,
    InsertPolicy, PostDraft, Subscription, Visibility,
};
use crate::events::ChangeEvent;
use crate::session::{Guarded, SessionStore};
use crate::storage::{PersistenceAdapter, StorageKey};

/// Posts written by the user, newest first.
pub struct PostStore {
    store: CollectionStore<AuthoredPost>,
}

impl PostStore {
    pub fn open(
        handle: Option<&str>,
        max_posts: Option<usize>,
        persistence: PersistenceAdapter,
        notifier: ChangeNotifier,
    ) -> Self {
        let kind = CollectionKind::Posts;
        PostStore {
            store: CollectionStore::open(
                kind,
                StorageKey::scoped(kind.key_prefix(), handle),
                InsertPolicy::Prepend,
                max_posts,
                persistence,
                notifier,
            ),
        }
    }

    /// Turns `draft` into a post. Only a logged in user can publish.
    pub fn publish(
        &self,
        session: &SessionStore,
        draft: PostDraft,
        now: DateTime<Utc>,
    ) -> Guarded<Result<Committed<AuthoredPost>, CollectionError>> {
        session.require_identity().map(|identity| {
            let post = AuthoredPost {
                id: Uuid::new_v4().to_string(),
                message: draft.message.trim().to_string(),
                image: draft.image,
                created_at: now,
                visibility: draft.visibility,
            };
            let committed = self.store.add(post.clone())?;
            info!("{} published post {}", identity.handle, post.id);
            Ok(committed.map(|_| post))
        })
    }

    pub fn delete(&self, post_id: &str) -> Committed<usize> {
        self.store.remove(post_id)
    }

    pub fn get(&self, post_id: &str) -> Option<AuthoredPost> {
        self.store.get(post_id)
    }

    pub fn get_all(&self) -> Vec<AuthoredPost> {
        self.store.get_all()
    }

    /// Posts other people would see on the profile page.
    pub fn public_posts(&self) -> Vec<AuthoredPost> {
        self.store
            .get_all()
            .into_iter()
            .filter(|post| post.visibility == Visibility::Public)
            .collect()
    }

    pub fn contains(&self, post_id: &str) -> bool {
        self.store.contains(post_id)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
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
