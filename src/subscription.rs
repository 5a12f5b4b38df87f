//! Subscription handles and destination helpers.
//!
//! [`subscribe`](crate::ConnectionCoordinator::subscribe) returns a
//! [`Subscription`]; dropping it (or calling
//! [`unsubscribe`](Subscription::unsubscribe)) removes the topic from the
//! registry and, when connected, tells the server to stop publishing.
//! Unsubscribes are tagged with the entry's generation so a stale handle
//! can never remove a newer subscription that reused the same destination.

use log::debug;
use tokio::sync::mpsc;

/// The fixed personal-queue destination for a user.
pub fn personal_queue(user_id: i64) -> String {
    format!("/user/{}/queue/notifications", user_id)
}

/// The live waitlist-counter topic for a restaurant.
pub fn restaurant_waiting_topic(restaurant_id: i64) -> String {
    format!("/topic/restaurant/{}/waiting", restaurant_id)
}

/// Handle for one ad-hoc topic subscription.
///
/// Unsubscribing is idempotent: calling [`unsubscribe`](Self::unsubscribe)
/// more than once has no effect after the first call. `Drop` fires a
/// best-effort unsubscribe if the handle was never closed explicitly.
#[derive(Debug)]
pub struct Subscription {
    destination: String,
    generation: u64,
    unsub_tx: mpsc::Sender<(String, u64)>,
    closed: bool,
}

impl Subscription {
    pub(crate) fn new(
        destination: String,
        generation: u64,
        unsub_tx: mpsc::Sender<(String, u64)>,
    ) -> Self {
        Self {
            destination,
            generation,
            unsub_tx,
            closed: false,
        }
    }

    /// The destination this handle is subscribed to.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Remove the subscription. Safe to call more than once.
    pub async fn unsubscribe(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        debug!("[SUB] Unsubscribing from {}", self.destination);
        let _ = self
            .unsub_tx
            .send((self.destination.clone(), self.generation))
            .await;
    }

    /// Returns `true` once [`unsubscribe`](Self::unsubscribe) has run.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self
                .unsub_tx
                .try_send((self.destination.clone(), self.generation));
        }
    }
}
