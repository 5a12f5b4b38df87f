#![allow(dead_code)]
//! Shared test plumbing: an in-process mock push transport plus wiremock
//! fixtures for the REST collaborators.

use async_trait::async_trait;
use bistro_link::{
    BistroLinkClient, BistroLinkTimeouts, ClientFrame, ConnectionOptions, ConnectionState,
    EventHandlers, Result, Transport, TransportEvent, TransportLink,
};
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const USER_ID: i64 = 42;
pub const PERSONAL_QUEUE: &str = "/user/42/queue/notifications";

// ── Mock transport ──────────────────────────────────────────────────────────

/// Transport whose connections are in-process channel pairs. Each
/// successful `connect` hands the test a [`ServerEnd`] through the hub.
pub struct MockTransport {
    connects: Arc<AtomicU32>,
    link_tx: mpsc::UnboundedSender<ServerEnd>,
}

/// Test-side view of the transport: connection counter plus the stream of
/// server ends, one per successful connect.
pub struct MockHub {
    connects: Arc<AtomicU32>,
    link_rx: mpsc::UnboundedReceiver<ServerEnd>,
}

/// The server side of one mock connection.
pub struct ServerEnd {
    event_tx: mpsc::UnboundedSender<Result<TransportEvent>>,
    sent_rx: mpsc::UnboundedReceiver<ClientFrame>,
    /// Access token the client presented at connect time.
    pub token: String,
}

struct MockLink {
    event_rx: mpsc::UnboundedReceiver<Result<TransportEvent>>,
    sent_tx: mpsc::UnboundedSender<ClientFrame>,
}

impl MockTransport {
    pub fn new() -> (Self, MockHub) {
        let connects = Arc::new(AtomicU32::new(0));
        let (link_tx, link_rx) = mpsc::unbounded_channel();
        (
            Self {
                connects: connects.clone(),
                link_tx,
            },
            MockHub { connects, link_rx },
        )
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, _url: &str, access_token: &str) -> Result<Box<dyn TransportLink>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        let _ = self.link_tx.send(ServerEnd {
            event_tx,
            sent_rx,
            token: access_token.to_string(),
        });
        Ok(Box::new(MockLink { event_rx, sent_tx }))
    }
}

#[async_trait]
impl TransportLink for MockLink {
    async fn send(&mut self, frame: &ClientFrame) -> Result<()> {
        self.sent_tx.send(frame.clone()).map_err(|_| {
            bistro_link::BistroLinkError::WebSocketError("mock connection closed".into())
        })
    }

    async fn recv(&mut self) -> Option<Result<TransportEvent>> {
        self.event_rx.recv().await
    }

    async fn ping(&mut self) -> Result<()> {
        Ok(())
    }

    async fn close(&mut self) {
        self.event_rx.close();
    }
}

impl MockHub {
    /// Number of transports created so far.
    pub fn connect_count(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }

    /// Wait for the next connection's server end.
    pub async fn next_link(&mut self) -> ServerEnd {
        tokio::time::timeout(Duration::from_secs(5), self.link_rx.recv())
            .await
            .expect("timed out waiting for a connection")
            .expect("transport dropped")
    }
}

impl ServerEnd {
    /// Deliver a raw text frame to the client.
    pub fn inject_text(&self, text: impl Into<String>) {
        let _ = self.event_tx.send(Ok(TransportEvent::Text(text.into())));
    }

    /// Deliver a notification push on `destination`.
    pub fn inject_notification(&self, destination: &str, id: Option<i64>, title: &str) {
        self.inject_text(
            json!({
                "type": "message",
                "destination": destination,
                "payload": {
                    "id": id,
                    "type": "RESERVATION_CONFIRMED",
                    "title": title,
                    "message": format!("{} body", title),
                    "isRead": false,
                    "createdAt": "2025-04-02T18:30:00Z"
                }
            })
            .to_string(),
        );
    }

    /// Deliver an arbitrary payload on a topic destination.
    pub fn inject_topic(&self, destination: &str, payload: serde_json::Value) {
        self.inject_text(
            json!({
                "type": "message",
                "destination": destination,
                "payload": payload
            })
            .to_string(),
        );
    }

    /// Close the connection from the server side.
    pub fn close(&self) {
        let _ = self.event_tx.send(Ok(TransportEvent::Closed {
            reason: Some("server closed".to_string()),
            code: Some(1000),
        }));
    }

    /// Wait for the next frame the client sent.
    pub async fn expect_frame(&mut self) -> ClientFrame {
        tokio::time::timeout(Duration::from_secs(5), self.sent_rx.recv())
            .await
            .expect("timed out waiting for a client frame")
            .expect("client link dropped")
    }

    /// Assert no frame arrives within `window`.
    pub async fn assert_no_frame(&mut self, window: Duration) {
        let got = tokio::time::timeout(window, self.sent_rx.recv()).await;
        if let Ok(Some(frame)) = got {
            panic!("unexpected client frame: {:?}", frame);
        }
    }
}

// ── REST fixtures ───────────────────────────────────────────────────────────

/// Mount the standard auth endpoints: login issues `at-1`/`rt-1`, the
/// current-user endpoint returns user 42, logout accepts anything.
pub async fn mount_auth(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "at-1",
            "refreshToken": "rt-1",
            "tokenType": "Bearer",
            "expiresIn": 3600
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/members/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": USER_ID,
            "email": "alice@example.com",
            "nickname": "alice",
            "role": "USER"
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

/// A notification JSON object for list fixtures.
pub fn notification_json(id: i64, is_read: bool) -> serde_json::Value {
    json!({
        "id": id,
        "type": "NEW_REVIEW",
        "title": format!("notification {}", id),
        "message": "body",
        "isRead": is_read,
        "createdAt": "2025-04-02T12:00:00Z"
    })
}

// ── Client harness ──────────────────────────────────────────────────────────

pub struct TestHarness {
    pub client: BistroLinkClient,
    pub hub: MockHub,
    pub api: MockServer,
}

/// Build an initialized client against a wiremock REST server and the mock
/// transport. Keepalive is disabled and reconnect delays are tight so tests
/// run in real time.
pub async fn harness_with(handlers: EventHandlers) -> TestHarness {
    let api = MockServer::start().await;
    mount_auth(&api).await;
    harness_against(api, handlers).await
}

/// Like [`harness_with`] but without the standard auth fixtures, for tests
/// that mount their own auth responses.
pub async fn harness_bare() -> TestHarness {
    let api = MockServer::start().await;
    harness_against(api, EventHandlers::new()).await
}

async fn harness_against(api: MockServer, handlers: EventHandlers) -> TestHarness {

    let (transport, hub) = MockTransport::new();
    let client = BistroLinkClient::builder()
        .base_url(api.uri())
        .timeouts(
            BistroLinkTimeouts::builder()
                .keepalive_interval_secs(0)
                .build(),
        )
        .connection_options(
            ConnectionOptions::default()
                .with_reconnect_delay_ms(10)
                .with_max_reconnect_delay_ms(50),
        )
        .event_handlers(handlers)
        .transport(Arc::new(transport))
        .build()
        .expect("client build failed");
    client.init().expect("init failed");

    TestHarness { client, hub, api }
}

pub async fn harness() -> TestHarness {
    harness_with(EventHandlers::new()).await
}

/// Wait until the connection reaches `want`.
pub async fn wait_for_state(rx: &mut watch::Receiver<ConnectionState>, want: ConnectionState) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if *rx.borrow() == want {
                return;
            }
            rx.changed().await.expect("state channel closed");
        }
    })
    .await
    .unwrap_or_else(|_| panic!("connection never reached {:?}", want));
}

/// Poll until `cond` holds.
pub async fn eventually(cond: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition never became true");
}
