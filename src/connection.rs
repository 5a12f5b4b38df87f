//! Connection coordination for the push transport.
//!
//! Owns at most one live push connection per session. A single background
//! task holds the transport link and serializes every state mutation:
//! connect/disconnect commands, subscription changes, inbound frames,
//! keepalive pings, and reconnect backoff all pass through one
//! `tokio::select!` loop, so two transports can never coexist.
//!
//! State machine:
//!
//! ```text
//! Disconnected --(session authenticated / connect())--> Connecting
//! Connecting   --(handshake ok)--> Connected
//! Connected    --(transport or protocol error)--> Reconnecting
//! Reconnecting --(backoff elapsed)--> Connecting
//! any state    --(session ends / disconnect())--> Disconnected
//! ```
//!
//! Leaving for Disconnected clears all subscriptions; a session end also
//! clears the notification ledger. Connection failures are never escalated
//! into session failures. Frames sent by the server while the client is
//! disconnected are not replayed (at-most-once delivery).

use crate::{
    dispatcher::Dispatcher,
    error::{BistroLinkError, Result},
    event_handlers::{ConnectionError, DisconnectReason, EventHandlers},
    models::{ClientFrame, ConnectionOptions, ConnectionState},
    registry::TopicHandler,
    session::SessionManager,
    signals::HostSignal,
    subscription::{personal_queue, Subscription},
    timeouts::BistroLinkTimeouts,
    transport::{Transport, TransportEvent, TransportLink},
};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant as TokioInstant;

/// Maximum sleep that won't overflow `Instant + Duration`; effectively
/// "never".
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

/// Commands sent from the public API to the background coordinator task.
enum CoordCmd {
    /// Request a connection attempt. No-op while connecting or connected.
    Connect,
    /// Close the connection and stay down until the next `Connect` or
    /// authentication transition.
    Disconnect,
    /// Register an ad-hoc topic subscription.
    Subscribe {
        destination: String,
        handler: TopicHandler,
        result_tx: oneshot::Sender<Result<u64>>,
    },
    /// Remove a subscription. With a generation tag, removal only happens
    /// when the tag matches the live entry (stale handles are ignored).
    Unsubscribe {
        destination: String,
        generation: Option<u64>,
    },
    /// Tear everything down. Subscriptions are cleared and the transport
    /// deactivated before the ack fires.
    Shutdown { done_tx: oneshot::Sender<()> },
}

/// Public handle to the coordinator task.
pub struct ConnectionCoordinator {
    cmd_tx: mpsc::Sender<CoordCmd>,
    /// Sender [`Subscription`] handles use from `unsubscribe()` / `Drop`.
    unsub_tx: mpsc::Sender<(String, u64)>,
    state_rx: watch::Receiver<ConnectionState>,
    _task: JoinHandle<()>,
    _unsub_bridge: JoinHandle<()>,
}

impl ConnectionCoordinator {
    /// Spawn the coordinator task. It idles in `Disconnected` until the
    /// session authenticates.
    pub(crate) fn spawn(
        session: Arc<SessionManager>,
        dispatcher: Dispatcher,
        transport: Arc<dyn Transport>,
        push_url: String,
        timeouts: BistroLinkTimeouts,
        options: ConnectionOptions,
        handlers: EventHandlers,
        signal_rx: broadcast::Receiver<HostSignal>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<CoordCmd>(256);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

        let auth_rx = session.auth_state();
        let task = tokio::spawn(coordinator_task(
            cmd_rx,
            auth_rx,
            signal_rx,
            dispatcher,
            transport,
            push_url,
            timeouts,
            options,
            handlers,
            state_tx,
        ));

        // Bridge task: forwards generation-tagged unsubscribes from
        // Subscription handles into coordinator commands.
        let (unsub_tx, mut unsub_rx) = mpsc::channel::<(String, u64)>(256);
        let cmd_tx_bridge = cmd_tx.clone();
        let unsub_bridge = tokio::spawn(async move {
            while let Some((destination, generation)) = unsub_rx.recv().await {
                let _ = cmd_tx_bridge
                    .send(CoordCmd::Unsubscribe {
                        destination,
                        generation: Some(generation),
                    })
                    .await;
            }
        });

        Self {
            cmd_tx,
            unsub_tx,
            state_rx,
            _task: task,
            _unsub_bridge: unsub_bridge,
        }
    }

    /// Request a connection attempt.
    ///
    /// Idempotent: a no-op while already connecting or connected. Requires
    /// an authenticated session; without one the request is ignored.
    pub async fn connect(&self) {
        let _ = self.cmd_tx.send(CoordCmd::Connect).await;
    }

    /// Close the connection and drop all subscriptions. The coordinator
    /// stays down until `connect()` or a fresh authentication transition.
    pub async fn disconnect(&self) {
        let _ = self.cmd_tx.send(CoordCmd::Disconnect).await;
    }

    /// Subscribe to an ad-hoc topic destination.
    ///
    /// Fails with [`WebSocketError`](BistroLinkError::WebSocketError) while
    /// not connected. The subscription is **not** re-established after a
    /// reconnect; re-subscribe from the `on_connect` handler if you need it
    /// to survive connection loss.
    pub async fn subscribe(
        &self,
        destination: impl Into<String>,
        handler: impl Fn(serde_json::Value) + Send + Sync + 'static,
    ) -> Result<Subscription> {
        let destination = destination.into();
        let (result_tx, result_rx) = oneshot::channel();
        self.cmd_tx
            .send(CoordCmd::Subscribe {
                destination: destination.clone(),
                handler: Arc::new(handler),
                result_tx,
            })
            .await
            .map_err(|_| {
                BistroLinkError::WebSocketError(
                    "Connection coordinator is not running".to_string(),
                )
            })?;

        let generation = result_rx.await.map_err(|_| {
            BistroLinkError::WebSocketError(
                "Coordinator stopped before confirming the subscription".to_string(),
            )
        })??;

        Ok(Subscription::new(
            destination,
            generation,
            self.unsub_tx.clone(),
        ))
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Subscribe to connection state transitions.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Tear down the coordinator. When this returns, every subscription has
    /// been cleared and the transport deactivated; no handler fires
    /// afterwards.
    pub async fn shutdown(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(CoordCmd::Shutdown { done_tx })
            .await
            .is_ok()
        {
            let _ = done_rx.await;
        }
    }
}

impl Drop for ConnectionCoordinator {
    fn drop(&mut self) {
        // Best-effort teardown signal.
        let (done_tx, _) = oneshot::channel();
        let _ = self.cmd_tx.try_send(CoordCmd::Shutdown { done_tx });
    }
}

// ── Background coordinator task ─────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
async fn coordinator_task(
    mut cmd_rx: mpsc::Receiver<CoordCmd>,
    mut auth_rx: watch::Receiver<crate::session::AuthState>,
    mut signal_rx: broadcast::Receiver<HostSignal>,
    mut dispatcher: Dispatcher,
    transport: Arc<dyn Transport>,
    push_url: String,
    timeouts: BistroLinkTimeouts,
    options: ConnectionOptions,
    handlers: EventHandlers,
    state_tx: watch::Sender<ConnectionState>,
) {
    let mut link: Option<Box<dyn TransportLink>> = None;
    // Whether the coordinator should hold a connection right now. Set by
    // authentication transitions and connect(); cleared by disconnect(),
    // session end, and reconnect give-up.
    let mut desired = auth_rx.borrow().is_authenticated();
    let mut reconnect_attempts: u32 = 0;
    let mut signals_closed = false;

    // Keepalive bookkeeping (armed only while connected).
    let has_keepalive = !timeouts.keepalive_interval.is_zero();
    let has_pong_timeout = has_keepalive && !timeouts.pong_timeout.is_zero();
    let mut idle_deadline = TokioInstant::now() + FAR_FUTURE;
    let mut awaiting_pong = false;
    let mut pong_deadline = TokioInstant::now() + FAR_FUTURE;

    loop {
        if let Some(ref mut active) = link {
            // ── Connected: multiplex frames, commands, keepalive ────────
            let idle_sleep = tokio::time::sleep_until(idle_deadline);
            tokio::pin!(idle_sleep);
            let pong_sleep = tokio::time::sleep_until(pong_deadline);
            tokio::pin!(pong_sleep);

            tokio::select! {
                biased;

                // Pong timeout: no frame since our last Ping.
                _ = &mut pong_sleep, if has_pong_timeout && awaiting_pong => {
                    warn!(
                        "[CONN] Pong timeout ({:?}), treating connection as dead",
                        timeouts.pong_timeout
                    );
                    handlers.emit_disconnect(DisconnectReason::new(format!(
                        "Pong timeout ({:?}), server unresponsive",
                        timeouts.pong_timeout
                    )));
                    awaiting_pong = false;
                    link = None;
                    dispatcher.registry.deactivate_all();
                    reconnect_attempts = 1;
                    state_tx.send_replace(ConnectionState::Reconnecting);
                    continue;
                }

                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(CoordCmd::Connect) => {
                            // Already connected; idempotent no-op.
                            debug!("[CONN] connect() while connected, ignoring");
                        },
                        Some(CoordCmd::Disconnect) => {
                            info!("[CONN] Client requested disconnect");
                            active.close().await;
                            link = None;
                            desired = false;
                            dispatcher.registry.clear();
                            state_tx.send_replace(ConnectionState::Disconnected);
                            handlers.emit_disconnect(
                                DisconnectReason::new("Client disconnected"),
                            );
                        },
                        Some(CoordCmd::Subscribe { destination, handler, result_tx }) => {
                            let result = active
                                .send(&ClientFrame::Subscribe {
                                    destination: destination.clone(),
                                })
                                .await;
                            let result = result.map(|()| {
                                dispatcher.registry.register(destination, handler)
                            });
                            let _ = result_tx.send(result);
                        },
                        Some(CoordCmd::Unsubscribe { destination, generation }) => {
                            if dispatcher.registry.remove(&destination, generation) {
                                let _ = active
                                    .send(&ClientFrame::Unsubscribe {
                                        destination: destination.clone(),
                                    })
                                    .await;
                            } else {
                                debug!(
                                    "[CONN] Ignoring stale unsubscribe for '{}'",
                                    destination
                                );
                            }
                        },
                        Some(CoordCmd::Shutdown { done_tx }) => {
                            active.close().await;
                            link = None;
                            dispatcher.registry.clear();
                            state_tx.send_replace(ConnectionState::Disconnected);
                            let _ = done_tx.send(());
                            return;
                        },
                        None => {
                            // Handle dropped; tear down.
                            active.close().await;
                            return;
                        },
                    }
                }

                changed = auth_rx.changed() => {
                    if changed.is_err() {
                        // Session manager gone; nothing left to coordinate.
                        active.close().await;
                        return;
                    }
                    if !auth_rx.borrow().is_authenticated() {
                        info!("[CONN] Session ended, disconnecting");
                        active.close().await;
                        link = None;
                        desired = false;
                        dispatcher.registry.clear();
                        dispatcher.clear_store();
                        state_tx.send_replace(ConnectionState::Disconnected);
                        handlers.emit_disconnect(DisconnectReason::new("Session ended"));
                    }
                    // Re-authentication (token refresh) needs no action on
                    // a live connection; the token matters at connect time.
                }

                signal = signal_rx.recv(), if !signals_closed => {
                    match signal {
                        // Already connected; visibility transitions are
                        // only interesting while down.
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(_)) => {},
                        Err(broadcast::error::RecvError::Closed) => {
                            signals_closed = true;
                        },
                    }
                }

                // Keepalive ping.
                _ = &mut idle_sleep, if has_keepalive && !awaiting_pong => {
                    if let Err(e) = active.ping().await {
                        warn!("[CONN] Keepalive ping failed: {}", e);
                        handlers.emit_disconnect(DisconnectReason::new(format!(
                            "Keepalive ping failed: {}",
                            e
                        )));
                        awaiting_pong = false;
                        link = None;
                        dispatcher.registry.deactivate_all();
                        reconnect_attempts = 1;
                        state_tx.send_replace(ConnectionState::Reconnecting);
                        continue;
                    }
                    if has_pong_timeout {
                        awaiting_pong = true;
                        pong_deadline = TokioInstant::now() + timeouts.pong_timeout;
                    }
                    idle_deadline = TokioInstant::now() + timeouts.keepalive_interval;
                }

                event = active.recv() => {
                    // Any inbound event proves the connection is alive.
                    idle_deadline = TokioInstant::now() + timeouts.keepalive_interval;
                    if awaiting_pong {
                        awaiting_pong = false;
                        pong_deadline = TokioInstant::now() + FAR_FUTURE;
                    }

                    match event {
                        Some(Ok(TransportEvent::Text(text))) => {
                            dispatcher.dispatch_text(&text);
                        },
                        Some(Ok(TransportEvent::Pong)) => {},
                        Some(Ok(TransportEvent::Closed { reason, code })) => {
                            let reason = match (reason, code) {
                                (Some(r), Some(c)) => DisconnectReason::with_code(r, c),
                                (Some(r), None) => DisconnectReason::new(r),
                                _ => DisconnectReason::new("Server closed connection"),
                            };
                            handlers.emit_disconnect(reason);
                            link = None;
                            dispatcher.registry.deactivate_all();
                            reconnect_attempts = 1;
                            state_tx.send_replace(ConnectionState::Reconnecting);
                        },
                        Some(Err(e)) => {
                            handlers.emit_error(ConnectionError::new(e.to_string(), true));
                            handlers.emit_disconnect(DisconnectReason::new(format!(
                                "Transport error: {}",
                                e
                            )));
                            link = None;
                            dispatcher.registry.deactivate_all();
                            reconnect_attempts = 1;
                            state_tx.send_replace(ConnectionState::Reconnecting);
                        },
                        None => {
                            handlers.emit_disconnect(
                                DisconnectReason::new("Transport stream ended"),
                            );
                            link = None;
                            dispatcher.registry.deactivate_all();
                            reconnect_attempts = 1;
                            state_tx.send_replace(ConnectionState::Reconnecting);
                        },
                    }
                }
            }
            continue;
        }

        // ── Not connected ───────────────────────────────────────────────

        let authenticated = auth_rx.borrow().is_authenticated();
        if !(desired && authenticated) {
            if *state_tx.borrow() != ConnectionState::Disconnected {
                state_tx.send_replace(ConnectionState::Disconnected);
            }

            tokio::select! {
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(CoordCmd::Connect) => {
                            if auth_rx.borrow().is_authenticated() {
                                desired = true;
                                reconnect_attempts = 0;
                            } else {
                                debug!("[CONN] connect() without a session, ignoring");
                            }
                        },
                        Some(CoordCmd::Disconnect) => {
                            desired = false;
                        },
                        Some(CoordCmd::Subscribe { result_tx, .. }) => {
                            let _ = result_tx.send(Err(BistroLinkError::WebSocketError(
                                "Not connected".to_string(),
                            )));
                        },
                        Some(CoordCmd::Unsubscribe { destination, generation }) => {
                            dispatcher.registry.remove(&destination, generation);
                        },
                        Some(CoordCmd::Shutdown { done_tx }) => {
                            dispatcher.registry.clear();
                            state_tx.send_replace(ConnectionState::Disconnected);
                            let _ = done_tx.send(());
                            return;
                        },
                        None => return,
                    }
                }
                changed = auth_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    if auth_rx.borrow().is_authenticated() {
                        info!("[CONN] Session authenticated, connecting");
                        desired = true;
                        reconnect_attempts = 0;
                    } else {
                        desired = false;
                        dispatcher.registry.clear();
                        dispatcher.clear_store();
                    }
                }
                signal = signal_rx.recv(), if !signals_closed => {
                    match signal {
                        Ok(HostSignal::Foreground) => {
                            if auth_rx.borrow().is_authenticated() {
                                info!("[CONN] Foregrounded while down, reconnecting");
                                desired = true;
                                reconnect_attempts = 0;
                            }
                        },
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(_)) => {},
                        Err(broadcast::error::RecvError::Closed) => {
                            signals_closed = true;
                        },
                    }
                }
            }
            continue;
        }

        // A connection is wanted. Apply backoff for retries.
        if reconnect_attempts > 0 {
            if let Some(max) = options.max_reconnect_attempts {
                if reconnect_attempts > max {
                    warn!("[CONN] Max reconnection attempts ({}) reached", max);
                    handlers.emit_error(ConnectionError::new(
                        format!("Max reconnection attempts ({}) reached", max),
                        false,
                    ));
                    desired = false;
                    reconnect_attempts = 0;
                    state_tx.send_replace(ConnectionState::Disconnected);
                    continue;
                }
            }

            state_tx.send_replace(ConnectionState::Reconnecting);
            let delay = options.backoff_delay_ms(reconnect_attempts - 1);
            info!(
                "[CONN] Reconnecting in {}ms (attempt {})",
                delay, reconnect_attempts
            );

            let sleep_fut = tokio::time::sleep(Duration::from_millis(delay));
            tokio::pin!(sleep_fut);
            let mut abort_wait = false;

            // Wait out the backoff, still serving commands. A foreground
            // transition skips the remaining delay.
            loop {
                tokio::select! {
                    biased;
                    cmd = cmd_rx.recv() => {
                        match cmd {
                            Some(CoordCmd::Connect) => {
                                // Explicit request: retry immediately.
                                break;
                            },
                            Some(CoordCmd::Disconnect) => {
                                desired = false;
                                state_tx.send_replace(ConnectionState::Disconnected);
                                abort_wait = true;
                                break;
                            },
                            Some(CoordCmd::Subscribe { result_tx, .. }) => {
                                let _ = result_tx.send(Err(BistroLinkError::WebSocketError(
                                    "Not connected".to_string(),
                                )));
                            },
                            Some(CoordCmd::Unsubscribe { destination, generation }) => {
                                dispatcher.registry.remove(&destination, generation);
                            },
                            Some(CoordCmd::Shutdown { done_tx }) => {
                                dispatcher.registry.clear();
                                state_tx.send_replace(ConnectionState::Disconnected);
                                let _ = done_tx.send(());
                                return;
                            },
                            None => return,
                        }
                    }
                    changed = auth_rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        if !auth_rx.borrow().is_authenticated() {
                            desired = false;
                            dispatcher.registry.clear();
                            dispatcher.clear_store();
                            state_tx.send_replace(ConnectionState::Disconnected);
                            abort_wait = true;
                            break;
                        }
                    }
                    signal = signal_rx.recv(), if !signals_closed => {
                        match signal {
                            Ok(HostSignal::Foreground) => break,
                            Ok(_) => {},
                            Err(broadcast::error::RecvError::Lagged(_)) => {},
                            Err(broadcast::error::RecvError::Closed) => {
                                signals_closed = true;
                            },
                        }
                    }
                    _ = &mut sleep_fut => break,
                }
            }
            if abort_wait {
                continue;
            }
        }

        // ── Attempt a connection ────────────────────────────────────────
        let (user_id, access_token) = match &*auth_rx.borrow() {
            crate::session::AuthState::Authenticated {
                user_id,
                access_token,
            } => (*user_id, access_token.clone()),
            crate::session::AuthState::Unauthenticated => {
                desired = false;
                continue;
            },
        };

        state_tx.send_replace(ConnectionState::Connecting);
        debug!("[CONN] Connecting to {}", push_url);

        match transport.connect(&push_url, &access_token).await {
            Ok(mut new_link) => {
                // Establish the personal queue before declaring victory;
                // a connection without it is useless.
                let destination = personal_queue(user_id);
                match new_link
                    .send(&ClientFrame::Subscribe {
                        destination: destination.clone(),
                    })
                    .await
                {
                    Ok(()) => {
                        info!("[CONN] Connected, personal queue subscribed");
                        dispatcher.registry.set_personal(destination);
                        reconnect_attempts = 0;
                        state_tx.send_replace(ConnectionState::Connected);
                        idle_deadline = TokioInstant::now() + effective_keepalive(&timeouts);
                        awaiting_pong = false;
                        pong_deadline = TokioInstant::now() + FAR_FUTURE;
                        link = Some(new_link);
                        handlers.emit_connect();
                    },
                    Err(e) => {
                        warn!("[CONN] Personal queue subscribe failed: {}", e);
                        new_link.close().await;
                        handlers.emit_error(ConnectionError::new(e.to_string(), true));
                        reconnect_attempts =
                            handle_attempt_failure(&options, &mut desired, reconnect_attempts);
                        if !desired {
                            state_tx.send_replace(ConnectionState::Disconnected);
                        }
                    },
                }
            },
            Err(e) => {
                warn!(
                    "[CONN] Connection attempt {} failed: {}",
                    reconnect_attempts + 1,
                    e
                );
                handlers.emit_error(ConnectionError::new(e.to_string(), true));
                reconnect_attempts =
                    handle_attempt_failure(&options, &mut desired, reconnect_attempts);
                if !desired {
                    state_tx.send_replace(ConnectionState::Disconnected);
                }
            },
        }
    }
}

/// Advance the retry counter after a failed attempt, or stand down when
/// auto-reconnect is disabled.
fn handle_attempt_failure(
    options: &ConnectionOptions,
    desired: &mut bool,
    reconnect_attempts: u32,
) -> u32 {
    if options.auto_reconnect {
        reconnect_attempts.saturating_add(1)
    } else {
        *desired = false;
        0
    }
}

fn effective_keepalive(timeouts: &BistroLinkTimeouts) -> Duration {
    if timeouts.keepalive_interval.is_zero() {
        FAR_FUTURE
    } else {
        timeouts.keepalive_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Dispatcher;
    use crate::rest::{AuthApi, NotificationApi};
    use crate::signals::SignalSource;
    use crate::store::NotificationStore;
    use async_trait::async_trait;

    /// Transport whose connects always fail; enough to exercise the
    /// coordinator's idle behavior without a server.
    struct UnreachableTransport;

    #[async_trait]
    impl Transport for UnreachableTransport {
        async fn connect(
            &self,
            _url: &str,
            _token: &str,
        ) -> Result<Box<dyn TransportLink>> {
            Err(BistroLinkError::NetworkError("unreachable".to_string()))
        }
    }

    fn make_coordinator() -> (ConnectionCoordinator, Arc<SessionManager>, SignalSource) {
        let signals = SignalSource::new();
        let http = reqwest::Client::new();
        let auth_api = AuthApi::new("http://127.0.0.1:9".to_string(), http.clone());
        let session = SessionManager::new(
            auth_api,
            signals.clone(),
            Duration::from_secs(1800),
        );
        let api = NotificationApi::new(
            "http://127.0.0.1:9".to_string(),
            http,
            session.clone(),
        );
        let store = Arc::new(NotificationStore::new(api));
        let dispatcher = Dispatcher::new(store, EventHandlers::new());

        let coordinator = ConnectionCoordinator::spawn(
            session.clone(),
            dispatcher,
            Arc::new(UnreachableTransport),
            "ws://127.0.0.1:9/ws".to_string(),
            BistroLinkTimeouts::fast(),
            ConnectionOptions::default().with_auto_reconnect(false),
            EventHandlers::new(),
            signals.subscribe(),
        );
        (coordinator, session, signals)
    }

    #[tokio::test]
    async fn test_starts_disconnected() {
        let (coordinator, _session, _signals) = make_coordinator();
        assert_eq!(coordinator.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_subscribe_while_disconnected_fails() {
        let (coordinator, _session, _signals) = make_coordinator();
        let err = coordinator
            .subscribe("/topic/restaurant/1/waiting", |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, BistroLinkError::WebSocketError(_)));
    }

    #[tokio::test]
    async fn test_connect_without_session_is_ignored() {
        let (coordinator, _session, _signals) = make_coordinator();
        coordinator.connect().await;
        tokio::task::yield_now().await;
        assert_eq!(coordinator.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_shutdown_acks_and_stops() {
        let (coordinator, _session, _signals) = make_coordinator();
        coordinator.shutdown().await;
        // After shutdown the command channel is gone; subscribe fails fast.
        let err = coordinator.subscribe("/topic/a", |_| {}).await.unwrap_err();
        assert!(matches!(err, BistroLinkError::WebSocketError(_)));
    }
}
