//! In-memory broadcaster.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use crate::bus::{Broadcaster, Listener, Subscription};

struct Registry<M> {
    next_id: u64,
    listeners: Vec<(u64, Listener<M>)>,
}

impl<M> Registry<M> {
    fn remove(&mut self, id: u64) {
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
    }
}

/// In-memory pub/sub.
///
/// - No IO / no async
/// - Listeners are invoked outside the registry lock, so a listener may
///   publish or (un)subscribe without deadlocking
/// - Cheap to clone; clones share the same listener list
pub struct InMemoryBroadcaster<M> {
    registry: Arc<Mutex<Registry<M>>>,
}

impl<M> InMemoryBroadcaster<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .len()
    }
}

impl<M> Default for InMemoryBroadcaster<M> {
    fn default() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }
}

impl<M> Clone for InMemoryBroadcaster<M> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<M> core::fmt::Debug for InMemoryBroadcaster<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryBroadcaster")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl<M> Broadcaster<M> for InMemoryBroadcaster<M>
where
    M: 'static,
{
    fn publish(&self, message: &M) {
        let listeners: Vec<Listener<M>> = self
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        tracing::trace!(listeners = listeners.len(), "broadcasting message");

        for listener in listeners {
            listener(message);
        }
    }

    fn subscribe(&self, listener: Listener<M>) -> Subscription {
        let id = {
            let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.listeners.push((id, listener));
            id
        };

        let registry: Weak<Mutex<Registry<M>>> = Arc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(id);
            }
        })
    }
}
