//! Connection state machine for [`SyncClient`](super::SyncClient).
//!
//! `Idle -> Connecting -> Connected -> (Errored | Closed) -> Idle`
//!
//! `Errored` and `Closed` behave like `Idle` for the next attempt. Every
//! transition takes the generation of the channel it concerns, so a task
//! that outlived its channel cannot clobber a newer one.

use std::collections::HashSet;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Where the shared relay channel currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Idle,
    Connecting,
    Connected,
    Errored,
    Closed,
}

/// What [`SyncClient::open`](super::SyncClient::open) did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// A new channel to the relay was opened.
    Opened,
    /// A channel is already connecting or connected and was reused.
    Reused,
    /// The last attempt was too recent; nothing was done.
    BackedOff,
}

/// Handle to the one live relay channel of a process.
pub(crate) struct LiveChannel {
    pub(crate) generation: u64,
    close_tx: Option<oneshot::Sender<()>>,
    reader: JoinHandle<()>,
}

impl LiveChannel {
    pub(crate) fn new(generation: u64, close_tx: oneshot::Sender<()>, reader: JoinHandle<()>) -> Self {
        Self {
            generation,
            close_tx: Some(close_tx),
            reader,
        }
    }

    /// Ask the reader task to send a close frame and stop.
    pub(crate) fn close(mut self) {
        if let Some(tx) = self.close_tx.take() {
            if tx.send(()).is_err() {
                // Reader already gone.
                self.reader.abort();
            }
        }
    }

    /// Drop the channel without a close handshake.
    pub(crate) fn abort(self) {
        self.reader.abort();
    }
}

/// Per-process client state.
pub(crate) struct ClientState {
    phase: ConnectionPhase,
    channel: Option<LiveChannel>,
    last_attempt: Option<Instant>,
    generation: u64,
    processed: HashSet<String>,
}

impl ClientState {
    pub(crate) fn new() -> Self {
        Self {
            phase: ConnectionPhase::Idle,
            channel: None,
            last_attempt: None,
            generation: 0,
            processed: HashSet::new(),
        }
    }

    pub(crate) fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    /// Decide whether a new connection attempt may start at `now`.
    ///
    /// Returns the generation of the attempt, or the outcome to report
    /// without connecting.
    pub(crate) fn begin_connect(
        &mut self,
        now: Instant,
        min_reconnect_interval: Duration,
    ) -> Result<u64, OpenOutcome> {
        if matches!(
            self.phase,
            ConnectionPhase::Connecting | ConnectionPhase::Connected
        ) {
            return Err(OpenOutcome::Reused);
        }

        if let Some(last) = self.last_attempt {
            if now.saturating_duration_since(last) < min_reconnect_interval {
                return Err(OpenOutcome::BackedOff);
            }
        }

        self.last_attempt = Some(now);
        self.generation += 1;
        self.phase = ConnectionPhase::Connecting;
        Ok(self.generation)
    }

    /// The handshake for `generation` completed.
    ///
    /// Returns the channel back if the attempt was abandoned meanwhile.
    pub(crate) fn connect_succeeded(&mut self, channel: LiveChannel) -> Result<(), LiveChannel> {
        if self.phase != ConnectionPhase::Connecting || channel.generation != self.generation {
            return Err(channel);
        }
        self.phase = ConnectionPhase::Connected;
        self.channel = Some(channel);
        Ok(())
    }

    /// The handshake for `generation` failed.
    pub(crate) fn connect_failed(&mut self, generation: u64) {
        if self.phase == ConnectionPhase::Connecting && generation == self.generation {
            self.phase = ConnectionPhase::Errored;
        }
    }

    /// The transport of `generation` reported an error or was closed.
    ///
    /// Returns `true` if that channel was the live one.
    pub(crate) fn transport_ended(&mut self, generation: u64, phase: ConnectionPhase) -> bool {
        let owned = self
            .channel
            .as_ref()
            .is_some_and(|c| c.generation == generation);
        if !owned {
            return false;
        }
        self.phase = phase;
        // The reader is the task calling us; dropping the handle detaches it.
        self.channel = None;
        true
    }

    /// Take the live channel out for a full teardown.
    pub(crate) fn teardown(&mut self) -> Option<LiveChannel> {
        self.phase = ConnectionPhase::Closed;
        self.channel.take()
    }

    /// Record `address` as surfaced. Returns `false` if it already was.
    pub(crate) fn mark_processed(&mut self, address: &str) -> bool {
        self.processed.insert(address.to_ascii_lowercase())
    }
}
