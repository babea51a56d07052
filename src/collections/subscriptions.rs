use super::{
    ChangeNotifier, ChannelId, CollectionError, CollectionKind, CollectionStore, Committed,
    InsertPolicy, Subscription,
};
use crate::events::ChangeEvent;
use crate::storage::{PersistenceAdapter, StorageKey};

/// Channels the user subscribed to, persisted as a plain array of ids.
pub struct Subscriptions {
    store: CollectionStore<ChannelId>,
}

impl Subscriptions {
    pub fn open(
        handle: Option<&str>,
        persistence: PersistenceAdapter,
        notifier: ChangeNotifier,
    ) -> Self {
        let kind = CollectionKind::Subscriptions;
        Subscriptions {
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

    /// Subscribes to `channel_id` if not subscribed, unsubscribes otherwise.
    /// Returns whether the user is subscribed afterwards.
    pub fn toggle(&self, channel_id: &str) -> Result<Committed<bool>, CollectionError> {
        self.store.toggle(ChannelId::new(channel_id))
    }

    pub fn is_subscribed(&self, channel_id: &str) -> bool {
        self.store.contains(channel_id)
    }

    pub fn get_all(&self) -> Vec<ChannelId> {
        self.store.get_all()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn unsubscribe(&self, channel_id: &str) -> Committed<usize> {
        self.store.remove(channel_id)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStorage, MemoryStorage};
    use std::sync::Arc;

    #[test]
    fn toggles_channel_membership() {
        let storage = Arc::new(MemoryStorage::new());
        let subscriptions = Subscriptions::open(
            Some("bob"),
            PersistenceAdapter::new(storage.clone()),
            ChangeNotifier::new(),
        );

        assert!(subscriptions.toggle("c1").unwrap().into_value());
        assert!(subscriptions.toggle("c2").unwrap().into_value());
        assert!(subscriptions.is_subscribed("c1"));
        assert_eq!(
            storage.get("subscriptions_bob").unwrap().as_deref(),
            Some(r#"["c1","c2"]"#)
        );

        assert!(!subscriptions.toggle("c1").unwrap().into_value());
        assert_eq!(subscriptions.get_all(), vec![ChannelId::new("c2")]);
    }

    #[test]
    fn unsubscribing_unknown_channel_is_a_no_op() {
        let subscriptions = Subscriptions::open(
            None,
            PersistenceAdapter::new(Arc::new(MemoryStorage::new())),
            ChangeNotifier::new(),
        );
        subscriptions.toggle("c1").unwrap();

        assert_eq!(*subscriptions.unsubscribe("c9").value(), 0);
        assert_eq!(subscriptions.len(), 1);
    }

    #[test]
    fn rejects_empty_channel_id() {
        let subscriptions = Subscriptions::open(
            None,
            PersistenceAdapter::new(Arc::new(MemoryStorage::new())),
            ChangeNotifier::new(),
        );
        assert!(subscriptions.toggle("").is_err());
        assert!(subscriptions.is_empty());
    }
}
