//! Live-update client for the relay.
//!
//! Gated behind the `client` cargo feature so crates that only need the
//! shared types do not pull in a WebSocket stack.

mod state;
mod sync;

pub use state::{ConnectionPhase, OpenOutcome};
pub use sync::{
    DEFAULT_RELAY_URL, EventOutcome, FrameOutcome, MIN_RECONNECT_INTERVAL, SyncClient,
    SyncClientConfig, SyncSink,
};

/// Errors produced by the live-update client.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Transport-level failure.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// A frame was not a valid relay message.
    #[error("malformed relay message: {0}")]
    MalformedMessage(#[from] serde_json::Error),

    /// A binary frame did not carry UTF-8 text.
    #[error("relay message is not valid utf-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// The channel was torn down while the handshake was in flight.
    #[error("connection attempt abandoned")]
    Abandoned,
}
