//! Host activity and visibility signals.
//!
//! The session manager and the connection coordinator both react to signals
//! that only the embedding host can observe: user input activity (pointer,
//! key, scroll, touch) and foreground/background visibility transitions.
//! Rather than depending on any particular host platform, the library
//! accepts them through a [`SignalSource`]: the host forwards its native
//! events, the library fans them out internally on a broadcast channel.

use tokio::sync::broadcast;

/// Capacity of the internal signal fan-out channel. Signals are edge
/// triggers; dropping old ones under burst is harmless.
const SIGNAL_CHANNEL_CAPACITY: usize = 64;

/// A host-level signal consumed by the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSignal {
    /// Any user-input activity (pointer, key, scroll, touch). Re-arms the
    /// session inactivity timer.
    Activity,
    /// The host became visible/foreground again.
    Foreground,
    /// The host moved to background.
    Background,
}

/// Entry point for host signals.
///
/// Cheap to clone; all clones feed the same subscribers.
///
/// # Example
///
/// ```rust
/// use bistro_link::SignalSource;
///
/// let signals = SignalSource::new();
/// // wire these into the host's native event callbacks:
/// signals.activity();
/// signals.foreground();
/// ```
#[derive(Debug, Clone)]
pub struct SignalSource {
    tx: broadcast::Sender<HostSignal>,
}

impl SignalSource {
    /// Create a new signal source.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SIGNAL_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Report a generic user-activity event.
    pub fn activity(&self) {
        self.emit(HostSignal::Activity);
    }

    /// Report that the host became foreground/visible.
    pub fn foreground(&self) {
        self.emit(HostSignal::Foreground);
    }

    /// Report that the host moved to background.
    pub fn background(&self) {
        self.emit(HostSignal::Background);
    }

    /// Report an arbitrary signal.
    pub fn emit(&self, signal: HostSignal) {
        // Err just means no subscriber is currently listening.
        let _ = self.tx.send(signal);
    }

    /// Subscribe to the signal stream.
    pub(crate) fn subscribe(&self) -> broadcast::Receiver<HostSignal> {
        self.tx.subscribe()
    }
}

impl Default for SignalSource {
    fn default() -> Self {
        Self::new()
    }
}
