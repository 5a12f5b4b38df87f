//! Timeout configuration for bistro-link client operations.
//!
//! Centralizes every duration the client uses: HTTP requests, WebSocket
//! connection establishment, keepalive pings, and the session inactivity
//! window.

use std::time::Duration;

/// Timeout configuration for bistro-link client operations.
///
/// All values have sensible defaults; use the builder for overrides.
///
/// # Examples
///
/// ```rust
/// use bistro_link::BistroLinkTimeouts;
/// use std::time::Duration;
///
/// // Use defaults (recommended for most cases)
/// let timeouts = BistroLinkTimeouts::default();
///
/// // Custom timeouts for high-latency environments
/// let timeouts = BistroLinkTimeouts::builder()
///     .connection_timeout(Duration::from_secs(30))
///     .request_timeout(Duration::from_secs(30))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct BistroLinkTimeouts {
    /// Timeout for establishing connections (TCP + TLS + WebSocket handshake).
    /// Default: 10 seconds
    pub connection_timeout: Duration,

    /// Timeout for a single REST request round trip.
    /// Default: 10 seconds
    pub request_timeout: Duration,

    /// Keep-alive ping interval for the push connection.
    /// Set to 0 to disable keep-alive pings.
    /// Default: 10 seconds
    pub keepalive_interval: Duration,

    /// Maximum time to wait for a Pong (or any other frame) after sending a
    /// keepalive Ping before the connection is considered dead.
    /// Set to 0 to disable pong timeout checking.
    /// Default: 5 seconds
    pub pong_timeout: Duration,

    /// Idle window after which a non-persistent session is logged out.
    /// Any host activity signal re-arms it. Persistent sessions are exempt.
    /// Default: 30 minutes
    pub inactivity_timeout: Duration,
}

impl Default for BistroLinkTimeouts {
    fn default() -> Self {
        Self {
            connection_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(10),
            keepalive_interval: Duration::from_secs(10),
            pong_timeout: Duration::from_secs(5),
            inactivity_timeout: Duration::from_secs(30 * 60),
        }
    }
}

impl BistroLinkTimeouts {
    /// Create a new builder for custom timeout configuration.
    pub fn builder() -> BistroLinkTimeoutsBuilder {
        BistroLinkTimeoutsBuilder::new()
    }

    /// Timeouts optimized for fast local development.
    pub fn fast() -> Self {
        Self {
            connection_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(5),
            keepalive_interval: Duration::from_secs(5),
            pong_timeout: Duration::from_secs(2),
            inactivity_timeout: Duration::from_secs(30 * 60),
        }
    }

    /// Timeouts optimized for high-latency or unreliable networks.
    pub fn relaxed() -> Self {
        Self {
            connection_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(30),
            keepalive_interval: Duration::from_secs(30),
            pong_timeout: Duration::from_secs(10),
            inactivity_timeout: Duration::from_secs(30 * 60),
        }
    }

    /// Check if a duration represents "no timeout" (zero or very large).
    pub fn is_no_timeout(duration: Duration) -> bool {
        duration.is_zero() || duration > Duration::from_secs(86400 * 365)
    }
}

/// Builder for creating custom [`BistroLinkTimeouts`] configurations.
#[derive(Debug, Clone)]
pub struct BistroLinkTimeoutsBuilder {
    timeouts: BistroLinkTimeouts,
}

impl BistroLinkTimeoutsBuilder {
    fn new() -> Self {
        Self {
            timeouts: BistroLinkTimeouts::default(),
        }
    }

    /// Set the connection timeout (TCP + TLS + WebSocket handshake).
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.connection_timeout = timeout;
        self
    }

    /// Set the connection timeout in seconds.
    pub fn connection_timeout_secs(self, secs: u64) -> Self {
        self.connection_timeout(Duration::from_secs(secs))
    }

    /// Set the REST request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.request_timeout = timeout;
        self
    }

    /// Set the REST request timeout in seconds.
    pub fn request_timeout_secs(self, secs: u64) -> Self {
        self.request_timeout(Duration::from_secs(secs))
    }

    /// Set the keepalive ping interval. Set to 0 to disable pings.
    pub fn keepalive_interval(mut self, interval: Duration) -> Self {
        self.timeouts.keepalive_interval = interval;
        self
    }

    /// Set the keepalive ping interval in seconds. Set to 0 to disable.
    pub fn keepalive_interval_secs(self, secs: u64) -> Self {
        self.keepalive_interval(Duration::from_secs(secs))
    }

    /// Set the pong timeout (max wait for a frame after a keepalive Ping).
    /// Set to 0 to disable pong timeout checking.
    pub fn pong_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.pong_timeout = timeout;
        self
    }

    /// Set the pong timeout in seconds. Set to 0 to disable.
    pub fn pong_timeout_secs(self, secs: u64) -> Self {
        self.pong_timeout(Duration::from_secs(secs))
    }

    /// Set the session inactivity window for non-persistent sessions.
    pub fn inactivity_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.inactivity_timeout = timeout;
        self
    }

    /// Build the timeout configuration.
    pub fn build(self) -> BistroLinkTimeouts {
        self.timeouts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let timeouts = BistroLinkTimeouts::default();
        assert_eq!(timeouts.connection_timeout, Duration::from_secs(10));
        assert_eq!(timeouts.request_timeout, Duration::from_secs(10));
        assert_eq!(timeouts.inactivity_timeout, Duration::from_secs(1800));
    }

    #[test]
    fn test_builder() {
        let timeouts = BistroLinkTimeouts::builder()
            .connection_timeout_secs(60)
            .request_timeout_secs(120)
            .keepalive_interval_secs(0)
            .inactivity_timeout(Duration::from_secs(600))
            .build();

        assert_eq!(timeouts.connection_timeout, Duration::from_secs(60));
        assert_eq!(timeouts.request_timeout, Duration::from_secs(120));
        assert!(timeouts.keepalive_interval.is_zero());
        assert_eq!(timeouts.inactivity_timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_fast_preset() {
        let timeouts = BistroLinkTimeouts::fast();
        assert!(timeouts.connection_timeout <= Duration::from_secs(5));
    }

    #[test]
    fn test_is_no_timeout() {
        assert!(BistroLinkTimeouts::is_no_timeout(Duration::ZERO));
        assert!(!BistroLinkTimeouts::is_no_timeout(Duration::from_secs(1)));
    }
}
