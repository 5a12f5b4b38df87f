//! Subscription registry: the set of destinations the client wants frames
//! for.
//!
//! One fixed personal queue plus caller-registered ad-hoc topics. Entries
//! carry a monotonically increasing generation tag so that a stale
//! unsubscribe from a superseded [`Subscription`](crate::Subscription)
//! handle cannot remove a newer entry that reused the same destination.
//!
//! Lifecycle rules (enforced by the coordinator, encoded here):
//!
//! - the personal queue is re-activated on every successful (re)connect;
//! - ad-hoc topics are deactivated on disconnect and are *not* re-activated
//!   automatically; callers re-subscribe after `on_connect`.

use std::collections::HashMap;
use std::sync::Arc;

/// Handler invoked with the raw payload of an ad-hoc topic frame.
pub type TopicHandler = Arc<dyn Fn(serde_json::Value) + Send + Sync>;

struct TopicEntry {
    handler: TopicHandler,
    active: bool,
    generation: u64,
}

/// Tracks desired subscriptions. Owned by the coordinator task; all access
/// is single-threaded.
pub(crate) struct SubscriptionRegistry {
    /// Active personal-queue destination, set while connected.
    personal: Option<String>,
    topics: HashMap<String, TopicEntry>,
    next_generation: u64,
}

impl SubscriptionRegistry {
    pub(crate) fn new() -> Self {
        Self {
            personal: None,
            topics: HashMap::new(),
            next_generation: 1,
        }
    }

    /// Record the personal queue as subscribed.
    pub(crate) fn set_personal(&mut self, destination: String) {
        self.personal = Some(destination);
    }

    /// Drop the personal queue (on disconnect).
    pub(crate) fn clear_personal(&mut self) {
        self.personal = None;
    }

    pub(crate) fn is_personal(&self, destination: &str) -> bool {
        self.personal.as_deref() == Some(destination)
    }

    /// Register (or atomically replace) a topic handler.
    ///
    /// Returns the generation tag the caller must present to unsubscribe.
    /// Replacement leaves no window where both handlers are live: the old
    /// entry is gone the moment this returns.
    pub(crate) fn register(&mut self, destination: String, handler: TopicHandler) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        self.topics.insert(
            destination,
            TopicEntry {
                handler,
                active: true,
                generation,
            },
        );
        generation
    }

    /// Remove a topic entry.
    ///
    /// With a generation tag, the entry is only removed if the tag matches;
    /// a stale unsubscribe from a replaced handle is ignored. Without one,
    /// removal is unconditional. Returns whether an entry was removed.
    pub(crate) fn remove(&mut self, destination: &str, generation: Option<u64>) -> bool {
        let matches = match generation {
            Some(generation) => self
                .topics
                .get(destination)
                .is_some_and(|e| e.generation == generation),
            None => self.topics.contains_key(destination),
        };
        if matches {
            self.topics.remove(destination);
        }
        matches
    }

    /// Handler for an active topic entry.
    pub(crate) fn topic_handler(&self, destination: &str) -> Option<TopicHandler> {
        self.topics
            .get(destination)
            .filter(|e| e.active)
            .map(|e| e.handler.clone())
    }

    /// Deactivate every ad-hoc topic and drop the personal queue.
    ///
    /// Called when the transport is lost. Handlers stay registered so a
    /// stale unsubscribe can still be matched, but no frames are routed to
    /// them until the caller re-subscribes.
    pub(crate) fn deactivate_all(&mut self) {
        self.personal = None;
        for entry in self.topics.values_mut() {
            entry.active = false;
        }
    }

    /// Remove everything. Called on session end and shutdown.
    pub(crate) fn clear(&mut self) {
        self.personal = None;
        self.topics.clear();
    }

    /// Number of registered (active or not) topic entries.
    #[cfg(test)]
    pub(crate) fn topic_count(&self) -> usize {
        self.topics.len()
    }
}
