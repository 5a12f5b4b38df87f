use serde::{Deserialize, Serialize};

/// Client-to-server push-connection messages.
///
/// Authentication happens at connect time via the bearer token in the
/// upgrade request, so the only frames a client sends manage the set of
/// destinations it wants to receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Start receiving frames for a destination.
    Subscribe {
        /// Destination path, e.g. `/user/42/queue/notifications` or
        /// `/topic/restaurant/7/waiting`.
        destination: String,
    },

    /// Stop receiving frames for a destination.
    Unsubscribe {
        /// The destination to drop.
        destination: String,
    },
}
