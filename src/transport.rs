//! Push transport abstraction and the production WebSocket implementation.
//!
//! The connection coordinator drives the transport through the
//! [`Transport`] / [`TransportLink`] trait pair so that tests can substitute
//! an in-process fake. The production implementation, [`WsTransport`],
//! speaks WebSocket via tokio-tungstenite with the bearer token presented
//! in the upgrade request; authentication happens at connect time, not per
//! frame.

use crate::{
    error::{BistroLinkError, Result},
    models::ClientFrame,
};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use log::{debug, warn};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        client::IntoClientRequest,
        error::Error as WsError,
        http::header::{HeaderValue, AUTHORIZATION},
        protocol::Message,
    },
};

type WebSocketStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<TcpStream>>;

/// Maximum accepted text frame size (1 MiB). Larger frames are dropped.
const MAX_TEXT_FRAME_BYTES: usize = 1 << 20;

/// An event produced by a live transport link.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A text frame; the dispatcher parses it.
    Text(String),
    /// A pong (or equivalent liveness proof) from the server.
    Pong,
    /// The server closed the connection.
    Closed {
        /// Close reason, if the server supplied one.
        reason: Option<String>,
        /// Close code, if the server supplied one.
        code: Option<u16>,
    },
}

/// Factory for push connections.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Establish a connection to `url`, authenticating with `access_token`.
    async fn connect(&self, url: &str, access_token: &str) -> Result<Box<dyn TransportLink>>;
}

/// One live push connection.
///
/// Owned exclusively by the connection coordinator task; none of these
/// methods are called concurrently.
#[async_trait]
pub trait TransportLink: Send {
    /// Send a client frame.
    async fn send(&mut self, frame: &ClientFrame) -> Result<()>;

    /// Receive the next event. `None` means the stream ended.
    async fn recv(&mut self) -> Option<Result<TransportEvent>>;

    /// Send a liveness probe.
    async fn ping(&mut self) -> Result<()>;

    /// Close the connection gracefully. Idempotent best-effort.
    async fn close(&mut self);
}

/// Derive the push endpoint from the REST base URL.
///
/// `http(s)` maps to `ws(s)` and the `/ws` path is appended. An explicit
/// override is validated instead; a plaintext `ws://` override is refused
/// when the base URL is `https`.
pub(crate) fn resolve_push_url(base_url: &str, override_url: Option<&str>) -> Result<String> {
    let base = reqwest::Url::parse(base_url.trim()).map_err(|e| {
        BistroLinkError::ConfigurationError(format!("Invalid base_url '{}': {}", base_url, e))
    })?;

    if let Some(url) = override_url {
        let parsed = reqwest::Url::parse(url.trim()).map_err(|e| {
            BistroLinkError::ConfigurationError(format!(
                "Invalid push URL override '{}': {}",
                url, e
            ))
        })?;
        match parsed.scheme() {
            "ws" | "wss" => {},
            other => {
                return Err(BistroLinkError::ConfigurationError(format!(
                    "Unsupported push URL scheme '{}'; expected ws(s)",
                    other
                )));
            },
        }
        if base.scheme() == "https" && parsed.scheme() == "ws" {
            return Err(BistroLinkError::ConfigurationError(
                "Refusing insecure ws:// override when base_url uses https://".to_string(),
            ));
        }
        return Ok(parsed.to_string());
    }

    let mut push_url = base.clone();
    let scheme = match base.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(BistroLinkError::ConfigurationError(format!(
                "Unsupported base_url scheme '{}'; expected http(s) or ws(s)",
                other
            )));
        },
    };
    push_url.set_scheme(scheme).map_err(|_| {
        BistroLinkError::ConfigurationError(format!(
            "Cannot derive push URL from base_url '{}'",
            base_url
        ))
    })?;
    push_url.set_path("/ws");
    push_url.set_query(None);
    Ok(push_url.to_string())
}

// ── Production WebSocket transport ──────────────────────────────────────────

/// WebSocket-backed [`Transport`].
pub struct WsTransport {
    connection_timeout: Duration,
}

impl WsTransport {
    /// Create a WebSocket transport with the given handshake timeout.
    pub fn new(connection_timeout: Duration) -> Self {
        Self { connection_timeout }
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn connect(&self, url: &str, access_token: &str) -> Result<Box<dyn TransportLink>> {
        debug!("[TRANSPORT] Connecting to {}", url);

        let mut request = url.into_client_request().map_err(|e| {
            BistroLinkError::WebSocketError(format!("Failed to build WebSocket request: {}", e))
        })?;

        let header = HeaderValue::from_str(&format!("Bearer {}", access_token)).map_err(|e| {
            BistroLinkError::ConfigurationError(format!(
                "Invalid access token for Authorization header: {}",
                e
            ))
        })?;
        request.headers_mut().insert(AUTHORIZATION, header);

        let connect_result = tokio::time::timeout(self.connection_timeout, connect_async(request))
            .await
            .map_err(|_| {
                BistroLinkError::TimeoutError(format!(
                    "Connection timeout ({:?})",
                    self.connection_timeout
                ))
            })?;

        let stream = match connect_result {
            Ok((stream, _)) => stream,
            Err(WsError::Http(response)) => {
                let status = response.status();
                let message = match status.as_u16() {
                    401 => "Unauthorized: push endpoint requires a valid access token".to_string(),
                    403 => "Forbidden: access to push endpoint denied".to_string(),
                    code => format!("Push endpoint HTTP error: {}", code),
                };
                return Err(BistroLinkError::WebSocketError(message));
            },
            Err(e) => {
                return Err(BistroLinkError::WebSocketError(format!(
                    "Connection failed: {}",
                    e
                )));
            },
        };

        debug!("[TRANSPORT] Connected");
        Ok(Box::new(WsLink { stream }))
    }
}

struct WsLink {
    stream: WebSocketStream,
}

#[async_trait]
impl TransportLink for WsLink {
    async fn send(&mut self, frame: &ClientFrame) -> Result<()> {
        let payload = serde_json::to_string(frame).map_err(|e| {
            BistroLinkError::InternalError(format!("Failed to serialize frame: {}", e))
        })?;
        self.stream
            .send(Message::Text(payload.into()))
            .await
            .map_err(|e| BistroLinkError::WebSocketError(format!("Failed to send frame: {}", e)))
    }

    async fn recv(&mut self) -> Option<Result<TransportEvent>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => {
                    if text.len() > MAX_TEXT_FRAME_BYTES {
                        warn!("[TRANSPORT] Dropping oversized frame ({} bytes)", text.len());
                        continue;
                    }
                    return Some(Ok(TransportEvent::Text(text.as_str().to_string())));
                },
                Ok(Message::Binary(data)) => {
                    // The push protocol is text-only.
                    warn!(
                        "[TRANSPORT] Dropping unexpected binary frame ({} bytes)",
                        data.len()
                    );
                },
                Ok(Message::Ping(payload)) => {
                    let _ = self.stream.send(Message::Pong(payload)).await;
                },
                Ok(Message::Pong(_)) => return Some(Ok(TransportEvent::Pong)),
                Ok(Message::Close(frame)) => {
                    let (reason, code) = match frame {
                        Some(f) => (Some(f.reason.as_str().to_string()), Some(f.code.into())),
                        None => (None, None),
                    };
                    return Some(Ok(TransportEvent::Closed { reason, code }));
                },
                Ok(Message::Frame(_)) => {},
                Err(e) => {
                    return Some(Err(BistroLinkError::WebSocketError(e.to_string())));
                },
            }
        }
    }

    async fn ping(&mut self) -> Result<()> {
        self.stream
            .send(Message::Ping(Bytes::new()))
            .await
            .map_err(|e| BistroLinkError::WebSocketError(format!("Failed to send ping: {}", e)))
    }

    async fn close(&mut self) {
        let _ = self.stream.close(None).await;
    }
}
