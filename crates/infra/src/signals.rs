//! Platform signal bridge
//!
//! The host (browser shell, desktop wrapper, or a test) pushes connectivity
//! and visibility events into a [`ChannelSignalSource`]; each running
//! monitor holds its own receiver.

use studiolink_core::SignalSource;
use studiolink_domain::EnvironmentSignal;
use tokio::sync::broadcast;
use tracing::trace;

const DEFAULT_CAPACITY: usize = 32;

/// Broadcast-backed [`SignalSource`]
#[derive(Debug, Clone)]
pub struct ChannelSignalSource {
    sender: broadcast::Sender<EnvironmentSignal>,
}

impl Default for ChannelSignalSource {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ChannelSignalSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source that buffers up to `capacity` undelivered signals per receiver
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish `signal`; returns how many receivers got it
    pub fn emit(&self, signal: EnvironmentSignal) -> usize {
        match self.sender.send(signal) {
            Ok(receivers) => receivers,
            Err(_) => {
                trace!(%signal, "No signal receivers");
                0
            }
        }
    }

    /// Parse and publish a host event name such as `"online"`
    ///
    /// Unknown names are ignored and return `None`.
    pub fn emit_named(&self, name: &str) -> Option<usize> {
        name.parse::<EnvironmentSignal>().ok().map(|signal| self.emit(signal))
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl SignalSource for ChannelSignalSource {
    fn subscribe(&self) -> broadcast::Receiver<EnvironmentSignal> {
        self.sender.subscribe()
    }
}
