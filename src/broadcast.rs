//! Reset broadcast
//!
//! Provides the `ResetListener` trait and `ResetBroadcast` registry. Views
//! that keep draft state (the editor, for one) register here and discard
//! their state when a session reset is announced.

use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// Trait for components that react to a session reset
#[cfg_attr(test, mockall::automock)]
pub trait ResetListener: Send + Sync {
    /// Name of the listener for logging and debugging
    fn name(&self) -> &'static str;

    /// Called before the host clears its session state.
    ///
    /// Listeners are not awaited and cannot report back.
    fn on_reset(&self);
}

/// Identifier returned by [`ResetBroadcast::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, Arc<dyn ResetListener>)>,
}

/// Registry that fans a reset notice out to every listener
#[derive(Default)]
pub struct ResetBroadcast {
    listeners: RwLock<Listeners>,
}

impl ResetBroadcast {
    /// Create an empty broadcast
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn register(&self, listener: Arc<dyn ResetListener>) -> ListenerId {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let id = ListenerId(listeners.next_id);
        listeners.next_id += 1;
        info!(listener = listener.name(), "Registered reset listener");
        listeners.entries.push((id, listener));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unregister(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.entries.len();
        listeners.entries.retain(|(entry_id, _)| *entry_id != id);
        before != listeners.entries.len()
    }

    /// Notify all listeners in registration order
    ///
    /// Returns the number of listeners notified.
    pub fn broadcast(&self) -> usize {
        // Snapshot so a listener may register or unregister while being notified
        let snapshot: Vec<Arc<dyn ResetListener>> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in &snapshot {
            debug!(listener = listener.name(), "Delivering reset");
            listener.on_reset();
        }

        snapshot.len()
    }

    /// Check if any listeners are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the number of registered listeners
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl ResetListener for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn on_reset(&self) {
            self.log
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(self.name);
        }
    }

    #[test]
    fn test_empty_broadcast() {
        let broadcast = ResetBroadcast::new();
        assert!(broadcast.is_empty());
        assert_eq!(broadcast.broadcast(), 0);
    }

    #[test]
    fn test_listeners_run_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let broadcast = ResetBroadcast::new();
        broadcast.register(Arc::new(Recorder {
            name: "editor",
            log: log.clone(),
        }));
        broadcast.register(Arc::new(Recorder {
            name: "outline",
            log: log.clone(),
        }));

        assert_eq!(broadcast.broadcast(), 2);
        assert_eq!(
            *log.lock().unwrap_or_else(PoisonError::into_inner),
            vec!["editor", "outline"]
        );
    }

    #[test]
    fn test_unregister() {
        let mut listener = MockResetListener::new();
        listener.expect_name().return_const("editor");
        listener.expect_on_reset().never();

        let broadcast = ResetBroadcast::new();
        let id = broadcast.register(Arc::new(listener));
        assert_eq!(broadcast.len(), 1);

        assert!(broadcast.unregister(id));
        assert!(!broadcast.unregister(id));
        assert_eq!(broadcast.broadcast(), 0);
    }
}
