use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Server-to-client push-connection messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// A payload delivered to a subscribed destination.
    Message {
        /// Destination the payload was published to.
        destination: String,
        /// Raw payload; personal-queue payloads decode as
        /// [`Notification`](crate::models::Notification), topic payloads are
        /// handed to the registered handler as-is.
        payload: JsonValue,
    },

    /// Protocol-level error notice from the server. Non-fatal; the
    /// connection continues.
    Error {
        /// Server error code.
        code: String,
        /// Human-readable error message.
        message: String,
    },
}
