//! Inbound frame dispatch.
//!
//! The single entry point for everything the transport delivers. Routing by
//! destination:
//!
//! - personal-queue frames decode as [`Notification`], update the store and
//!   fire the `on_notification` alert hook;
//! - ad-hoc topic frames go only to the handler registered for that topic;
//! - anything that fails to parse is logged and dropped; a malformed frame
//!   never crashes the client or closes the connection.

use crate::{
    event_handlers::EventHandlers,
    models::{Notification, ServerFrame},
    registry::SubscriptionRegistry,
    store::NotificationStore,
};
use log::{debug, warn};
use std::sync::Arc;

/// Routes inbound frames. Owned by the coordinator task.
pub(crate) struct Dispatcher {
    pub(crate) registry: SubscriptionRegistry,
    store: Arc<NotificationStore>,
    handlers: EventHandlers,
}

impl Dispatcher {
    pub(crate) fn new(store: Arc<NotificationStore>, handlers: EventHandlers) -> Self {
        Self {
            registry: SubscriptionRegistry::new(),
            store,
            handlers,
        }
    }

    /// Drop all notification state. Invoked on session end.
    pub(crate) fn clear_store(&self) {
        self.store.clear();
    }

    /// Parse and route one raw text frame.
    pub(crate) fn dispatch_text(&self, text: &str) {
        match serde_json::from_str::<ServerFrame>(text) {
            Ok(ServerFrame::Message {
                destination,
                payload,
            }) => self.route(&destination, payload),
            Ok(ServerFrame::Error { code, message }) => {
                warn!("[DISPATCH] Server error frame: {} ({})", message, code);
            },
            Err(e) => {
                warn!("[DISPATCH] Dropping unparsable frame: {}", e);
            },
        }
    }

    fn route(&self, destination: &str, payload: serde_json::Value) {
        if self.registry.is_personal(destination) {
            match serde_json::from_value::<Notification>(payload) {
                Ok(notification) => {
                    debug!(
                        "[DISPATCH] Notification on personal queue: {:?} '{}'",
                        notification.kind, notification.title
                    );
                    self.store.receive_push(notification.clone());
                    self.handlers.emit_notification(notification);
                },
                Err(e) => {
                    warn!("[DISPATCH] Dropping malformed notification payload: {}", e);
                },
            }
        } else if let Some(handler) = self.registry.topic_handler(destination) {
            handler(payload);
        } else {
            debug!("[DISPATCH] No subscription for '{}', dropping frame", destination);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::{AuthApi, NotificationApi};
    use crate::session::SessionManager;
    use crate::signals::SignalSource;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn make_store() -> Arc<NotificationStore> {
        let http = reqwest::Client::new();
        let auth_api = AuthApi::new("http://127.0.0.1:9".to_string(), http.clone());
        let session = SessionManager::new(
            auth_api,
            SignalSource::new(),
            Duration::from_secs(1800),
        );
        let api = NotificationApi::new("http://127.0.0.1:9".to_string(), http, session);
        Arc::new(NotificationStore::new(api))
    }

    fn notification_frame(destination: &str) -> String {
        json!({
            "type": "message",
            "destination": destination,
            "payload": {
                "id": 5,
                "type": "NEW_REVIEW",
                "title": "New review",
                "message": "Someone reviewed your restaurant",
                "isRead": false,
                "createdAt": "2025-04-02T18:30:00Z"
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_personal_frame_updates_store_and_alerts() {
        let store = make_store();
        let alerts = Arc::new(AtomicU32::new(0));
        let alerts_clone = alerts.clone();
        let handlers = EventHandlers::new().on_notification(move |_| {
            alerts_clone.fetch_add(1, Ordering::SeqCst);
        });

        let mut dispatcher = Dispatcher::new(store.clone(), handlers);
        dispatcher
            .registry
            .set_personal("/user/42/queue/notifications".to_string());

        dispatcher.dispatch_text(&notification_frame("/user/42/queue/notifications"));

        assert_eq!(store.unread_count(), 1);
        assert_eq!(store.notifications().len(), 1);
        assert_eq!(alerts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_topic_frame_reaches_registered_handler_only() {
        let store = make_store();
        let hits = Arc::new(AtomicU32::new(0));
        let hits_clone = hits.clone();

        let mut dispatcher = Dispatcher::new(store.clone(), EventHandlers::new());
        dispatcher.registry.register(
            "/topic/restaurant/7/waiting".to_string(),
            Arc::new(move |payload| {
                assert_eq!(payload["waitingCount"], 3);
                hits_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let frame = json!({
            "type": "message",
            "destination": "/topic/restaurant/7/waiting",
            "payload": { "waitingCount": 3 }
        })
        .to_string();
        dispatcher.dispatch_text(&frame);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        // Topic frames never touch the notification store.
        assert_eq!(store.unread_count(), 0);
        assert!(store.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_unparsable_frame_is_dropped_silently() {
        let store = make_store();
        let mut dispatcher = Dispatcher::new(store.clone(), EventHandlers::new());
        dispatcher
            .registry
            .set_personal("/user/42/queue/notifications".to_string());

        dispatcher.dispatch_text("this is not json");
        dispatcher.dispatch_text(r#"{"type":"message"}"#);
        dispatcher.dispatch_text(r#"{"type":"hologram","destination":"x"}"#);

        assert_eq!(store.unread_count(), 0);
        assert!(store.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_notification_payload_is_dropped() {
        let store = make_store();
        let mut dispatcher = Dispatcher::new(store.clone(), EventHandlers::new());
        dispatcher
            .registry
            .set_personal("/user/42/queue/notifications".to_string());

        let frame = json!({
            "type": "message",
            "destination": "/user/42/queue/notifications",
            "payload": { "surprise": true }
        })
        .to_string();
        dispatcher.dispatch_text(&frame);

        assert_eq!(store.unread_count(), 0);
        assert!(store.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_frame_for_inactive_topic_is_dropped() {
        let store = make_store();
        let hits = Arc::new(AtomicU32::new(0));
        let hits_clone = hits.clone();

        let mut dispatcher = Dispatcher::new(store, EventHandlers::new());
        dispatcher.registry.register(
            "/topic/restaurant/7/waiting".to_string(),
            Arc::new(move |_| {
                hits_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );
        dispatcher.registry.deactivate_all();

        let frame = json!({
            "type": "message",
            "destination": "/topic/restaurant/7/waiting",
            "payload": {}
        })
        .to_string();
        dispatcher.dispatch_text(&frame);

        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
