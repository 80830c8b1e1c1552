//! Application state shared across all request handlers.

use regen_core::processors::EventRelay;
use tokio::sync::watch;

/// Cheap to clone; everything inside is a handle.
#[derive(Clone)]
pub struct AppState {
    pub relay: EventRelay,
    /// Flips to `true` when the server is shutting down.
    pub shutdown_rx: watch::Receiver<bool>,
}

impl AppState {
    pub fn new(relay: EventRelay, shutdown_rx: watch::Receiver<bool>) -> Self {
        Self { relay, shutdown_rx }
    }
}
