//! Main bistro-link client with builder pattern.
//!
//! [`BistroLinkClient`] is the owned service instance gluing the session
//! manager, the connection coordinator and the notification store together.
//! Construct it once at startup, call [`init`](BistroLinkClient::init) to
//! start the coordinator, and [`shutdown`](BistroLinkClient::shutdown) on
//! teardown. Consumers receive it by reference; there is no ambient global
//! state.

use crate::{
    connection::ConnectionCoordinator,
    dispatcher::Dispatcher,
    error::{BistroLinkError, Result},
    event_handlers::EventHandlers,
    models::{ConnectionOptions, ConnectionState},
    rest::{AuthApi, NotificationApi},
    session::SessionManager,
    signals::SignalSource,
    store::NotificationStore,
    subscription::Subscription,
    timeouts::BistroLinkTimeouts,
    transport::{resolve_push_url, Transport, WsTransport},
};
use std::sync::{Arc, OnceLock};

/// Main bistro-link client.
///
/// Use [`BistroLinkClientBuilder`] to construct instances with custom
/// configuration.
///
/// # Examples
///
/// ```rust,no_run
/// use bistro_link::BistroLinkClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = BistroLinkClient::builder()
///     .base_url("https://api.bistro.example/api")
///     .build()?;
/// client.init()?;
///
/// // Sign in; the coordinator connects and subscribes the personal queue.
/// client.session().login("alice@example.com", "secret", false).await?;
///
/// // Hydrate the ledger with the latest notifications.
/// client.notifications().hydrate(20).await?;
/// println!("{} unread", client.notifications().unread_count());
///
/// client.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct BistroLinkClient {
    base_url: String,
    session: Arc<SessionManager>,
    store: Arc<NotificationStore>,
    signals: SignalSource,
    timeouts: BistroLinkTimeouts,
    connection_options: ConnectionOptions,
    event_handlers: EventHandlers,
    transport: Arc<dyn Transport>,
    push_url: String,
    coordinator: OnceLock<ConnectionCoordinator>,
}

impl BistroLinkClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> BistroLinkClientBuilder {
        BistroLinkClientBuilder::new()
    }

    /// Start the connection coordinator.
    ///
    /// Must be called exactly once before any push-related operation. The
    /// coordinator idles until the session authenticates.
    pub fn init(&self) -> Result<()> {
        let dispatcher = Dispatcher::new(self.store.clone(), self.event_handlers.clone());
        let coordinator = ConnectionCoordinator::spawn(
            self.session.clone(),
            dispatcher,
            self.transport.clone(),
            self.push_url.clone(),
            self.timeouts.clone(),
            self.connection_options.clone(),
            self.event_handlers.clone(),
            self.signals.subscribe(),
        );
        self.coordinator.set(coordinator).map_err(|_| {
            BistroLinkError::ConfigurationError("Client is already initialized".to_string())
        })
    }

    /// Tear down the coordinator and stop session timers.
    ///
    /// When this returns, every subscription has been cleared and no
    /// handler will fire again. Session tokens are kept; this is component
    /// teardown, not logout.
    pub async fn shutdown(&self) {
        if let Some(coordinator) = self.coordinator.get() {
            coordinator.shutdown().await;
        }
        self.session.shutdown();
    }

    /// The session manager (login, logout, token refresh).
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// The notification store (hydration, read/delete operations).
    pub fn notifications(&self) -> &NotificationStore {
        &self.store
    }

    /// The host signal source; wire platform activity/visibility events
    /// into it.
    pub fn signals(&self) -> SignalSource {
        self.signals.clone()
    }

    /// The connection coordinator.
    pub fn connection(&self) -> Result<&ConnectionCoordinator> {
        self.coordinator.get().ok_or_else(|| {
            BistroLinkError::ConfigurationError(
                "Client is not initialized; call init() first".to_string(),
            )
        })
    }

    /// Current push connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.coordinator
            .get()
            .map(|c| c.state())
            .unwrap_or_default()
    }

    /// Subscribe to an ad-hoc topic destination.
    ///
    /// See [`ConnectionCoordinator::subscribe`] for the reconnect caveat.
    pub async fn subscribe(
        &self,
        destination: impl Into<String>,
        handler: impl Fn(serde_json::Value) + Send + Sync + 'static,
    ) -> Result<Subscription> {
        self.connection()?.subscribe(destination, handler).await
    }

    /// The configured REST base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The configured timeouts.
    pub fn timeouts(&self) -> &BistroLinkTimeouts {
        &self.timeouts
    }
}

/// Builder for configuring [`BistroLinkClient`] instances.
pub struct BistroLinkClientBuilder {
    base_url: Option<String>,
    timeouts: BistroLinkTimeouts,
    connection_options: ConnectionOptions,
    event_handlers: EventHandlers,
    transport: Option<Arc<dyn Transport>>,
}

impl BistroLinkClientBuilder {
    fn new() -> Self {
        Self {
            base_url: None,
            timeouts: BistroLinkTimeouts::default(),
            connection_options: ConnectionOptions::default(),
            event_handlers: EventHandlers::new(),
            transport: None,
        }
    }

    /// Set the REST base URL (required).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the timeout configuration for all operations.
    pub fn timeouts(mut self, timeouts: BistroLinkTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set connection options (reconnect behavior, push URL override).
    pub fn connection_options(mut self, options: ConnectionOptions) -> Self {
        self.connection_options = options;
        self
    }

    /// Set connection lifecycle event handlers.
    pub fn event_handlers(mut self, handlers: EventHandlers) -> Self {
        self.event_handlers = handlers;
        self
    }

    /// Replace the push transport. Mainly useful for tests; the default is
    /// the WebSocket transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<BistroLinkClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| BistroLinkError::ConfigurationError("base_url is required".into()))?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let push_url = resolve_push_url(&base_url, self.connection_options.push_url.as_deref())?;

        // Pooled HTTP client shared by every REST collaborator.
        let http_client = reqwest::Client::builder()
            .timeout(self.timeouts.request_timeout)
            .connect_timeout(self.timeouts.connection_timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .build()
            .map_err(|e| BistroLinkError::ConfigurationError(e.to_string()))?;

        let signals = SignalSource::new();
        let auth_api = AuthApi::new(base_url.clone(), http_client.clone());
        let session = SessionManager::new(
            auth_api,
            signals.clone(),
            self.timeouts.inactivity_timeout,
        );
        let notification_api =
            NotificationApi::new(base_url.clone(), http_client, session.clone());
        let store = Arc::new(NotificationStore::new(notification_api));

        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(WsTransport::new(self.timeouts.connection_timeout)));

        Ok(BistroLinkClient {
            base_url,
            session,
            store,
            signals,
            timeouts: self.timeouts,
            connection_options: self.connection_options,
            event_handlers: self.event_handlers,
            transport,
            push_url,
            coordinator: OnceLock::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_pattern() {
        let result = BistroLinkClient::builder()
            .base_url("http://localhost:8080/api")
            .timeouts(BistroLinkTimeouts::fast())
            .build();

        assert!(result.is_ok());
    }

    #[test]
    fn test_builder_missing_url() {
        let result = BistroLinkClient::builder().build();
        assert!(result.is_err());
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = BistroLinkClient::builder()
            .base_url("http://localhost:8080/api/")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/api");
    }

    #[tokio::test]
    async fn test_double_init_is_rejected() {
        let client = BistroLinkClient::builder()
            .base_url("http://localhost:8080/api")
            .build()
            .unwrap();
        client.init().unwrap();
        assert!(client.init().is_err());
        client.shutdown().await;
    }

    #[test]
    fn test_connection_requires_init() {
        let client = BistroLinkClient::builder()
            .base_url("http://localhost:8080/api")
            .build()
            .unwrap();
        assert!(client.connection().is_err());
        assert_eq!(client.connection_state(), ConnectionState::Disconnected);
    }
}
