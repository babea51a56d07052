//! Publish/subscribe plumbing between stores and their consumers.
//!
//! A consumer registers a callback once and keeps the returned
//! [`Subscription`]; dropping it unregisters the callback.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use crate::events::ChangeEvent;

type Callback = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    observers: Vec<(u64, Callback)>,
}

#[derive(Clone, Default)]
pub struct ChangeNotifier {
    registry: Arc<Mutex<Registry>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let callback: Callback = Arc::new(callback);
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.observers.push((id, callback));
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Delivers `event` to every current subscriber, in subscription order.
    pub fn publish(&self, event: &ChangeEvent) {
        // Callbacks run without the registry lock held, so they may subscribe,
        // unsubscribe or read the store that published.
        let observers: Vec<Callback> = self
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .observers
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in observers {
            callback(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .observers
            .len()
    }
}

/// Keeps a callback registered for as long as it is alive.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Explicitly ends the subscription. Same as dropping it.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .observers
                .retain(|(id, _)| *id != self.id);
        }
    }
}
