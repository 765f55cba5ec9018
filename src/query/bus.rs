//! Publish/subscribe channel for cache invalidation events.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Callback invoked with the invalidated namespace.
pub type Listener = Box<dyn Fn(&str) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Mutations publish `invalidate(namespace)`; active queries subscribe and
/// mark themselves for refetch.
///
/// Listeners run synchronously inside [`InvalidationBus::publish`] and must
/// not subscribe or unsubscribe from within the callback.
#[derive(Default)]
pub struct InvalidationBus {
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for InvalidationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvalidationBus")
            .field("listeners", &self.len())
            .finish()
    }
}

impl InvalidationBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Notifies every listener. Returns how many were called.
    pub fn publish(&self, namespace: &str) -> usize {
        let listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        for (_, listener) in listeners.iter() {
            listener(namespace);
        }
        log::debug!("Invalidated {namespace}, notified {} listener(s)", listeners.len());
        listeners.len()
    }

    pub fn len(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn publish_reaches_every_subscriber_until_unsubscribed() {
        let bus = InvalidationBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let first = {
            let hits = Arc::clone(&hits);
            bus.subscribe(Box::new(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            }))
        };
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = Arc::clone(&seen);
            bus.subscribe(Box::new(move |ns| {
                seen.lock().unwrap().push(ns.to_string());
            }));
        }

        assert_eq!(bus.publish("contacts"), 2);
        assert!(bus.unsubscribe(first));
        assert!(!bus.unsubscribe(first));
        assert_eq!(bus.publish("contacts"), 1);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock().unwrap(), vec!["contacts", "contacts"]);
    }
}
