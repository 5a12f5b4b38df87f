//! # bistro-link: Bistro realtime notification client
//!
//! Client library for the Bistro platform's realtime notification
//! subsystem. Maintains one live push connection per authenticated user,
//! multiplexes topic subscriptions over it, reconciles connection lifecycle
//! with session validity, and keeps a consistent in-memory notification
//! ledger fed by REST hydration and live pushes.
//!
//! ## Features
//!
//! - **Session management**: login, registration, federated token hand-off,
//!   automatic single-retry token refresh, 30-minute inactivity logout for
//!   non-persistent sessions
//! - **Push connection**: bearer-authenticated WebSocket with automatic
//!   reconnection (exponential backoff), keepalive pings, foreground-driven
//!   reconnect
//! - **Subscriptions**: a fixed personal queue re-established on every
//!   (re)connect, plus ad-hoc per-entity topics
//! - **Notification ledger**: newest-first ordering, incremental unread
//!   accounting, optimistic read/delete operations
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use bistro_link::{BistroLinkClient, EventHandlers};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = BistroLinkClient::builder()
//!     .base_url("https://api.bistro.example/api")
//!     .event_handlers(EventHandlers::new()
//!         .on_notification(|n| println!("🔔 {}", n.message)))
//!     .build()?;
//! client.init()?;
//!
//! client.session().login("alice@example.com", "secret", false).await?;
//! client.notifications().hydrate(20).await?;
//!
//! // Live waitlist counter for one restaurant; not restored after a
//! // reconnect; re-subscribe from on_connect if needed.
//! let topic = bistro_link::restaurant_waiting_topic(7);
//! let mut sub = client.subscribe(topic, |payload| {
//!     println!("waiting update: {}", payload);
//! }).await?;
//!
//! sub.unsubscribe().await;
//! client.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Host signals
//!
//! Forward platform events into [`SignalSource`] so the inactivity timer
//! and reconnect logic can react:
//!
//! ```rust,no_run
//! # fn example(client: &bistro_link::BistroLinkClient) {
//! let signals = client.signals();
//! signals.activity();    // on any pointer/key/scroll/touch event
//! signals.foreground();  // when the app becomes visible again
//! # }
//! ```

pub mod client;
pub mod connection;
pub mod error;
pub mod event_handlers;
pub mod models;
pub mod session;
pub mod signals;
pub mod store;
pub mod subscription;
pub mod timeouts;
pub mod transport;

mod dispatcher;
mod registry;
mod rest;

// Re-export main types for convenience
pub use client::{BistroLinkClient, BistroLinkClientBuilder};
pub use connection::ConnectionCoordinator;
pub use error::{BistroLinkError, Result};
pub use event_handlers::{ConnectionError, DisconnectReason, EventHandlers};
pub use models::{
    AuthResponse, ClientFrame, ConnectionOptions, ConnectionState, LoginRequest, Notification,
    NotificationKind, NotificationPage, RegisterRequest, ServerFrame, UnreadCountResponse, User,
};
pub use session::{AuthState, Session, SessionManager};
pub use signals::{HostSignal, SignalSource};
pub use store::NotificationStore;
pub use subscription::{personal_queue, restaurant_waiting_topic, Subscription};
pub use timeouts::BistroLinkTimeouts;
pub use transport::{Transport, TransportEvent, TransportLink, WsTransport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
