use std::fmt;

/// Lifecycle state of the push connection.
///
/// Exactly one instance exists, owned by the connection coordinator and
/// published on a watch channel. `Disconnected` is both the initial state
/// and the terminal state after logout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No transport; nothing in flight.
    #[default]
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// The transport is live and the personal queue is subscribed.
    Connected,
    /// The transport was lost; a reconnect attempt is pending.
    Reconnecting,
}

impl ConnectionState {
    /// Whether a transport exists or is being established.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
        };
        write!(f, "{}", s)
    }
}
