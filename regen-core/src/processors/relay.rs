//! EventRelay processor.
//!
//! The EventRelay is responsible for:
//! - Keeping the set of connected subscriber channels
//! - Queueing `FundCreated` events received from the chain watcher
//! - Flushing the whole queue as one `batch_update` frame, no more often than
//!   the configured minimum broadcast interval
//!
//! Timing rules:
//! - The first flush can happen no earlier than one interval after the relay
//!   was created.
//! - An event arriving after the interval has elapsed is flushed at once.
//! - Otherwise the first queued event schedules a flush at
//!   `last_flush + interval`; later events ride along.
//!
//! Events that were flushed before a subscriber connected are not replayed.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use kanau::processor::Processor;
use regen_sdk::objects::{FundEvent, RelayMessage};
use thiserror::Error;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::{ConfigStore, ConfigWatcher, RelayConfig};
use crate::events::{FundCreated, FundCreatedReceiver};

/// Errors that can occur while relaying.
#[derive(Debug, Error)]
pub enum RelayError {
    /// A frame could not be serialized
    #[error("frame serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The subscriber's channel no longer accepts frames
    #[error("subscriber channel closed")]
    ChannelClosed,
}

/// The outbound half of one subscriber connection.
///
/// Frames are pre-serialized JSON text shared between all subscribers.
pub trait RelayChannel: Send + Sync {
    fn is_open(&self) -> bool;
    fn send(&self, frame: Arc<str>) -> Result<(), RelayError>;
}

impl RelayChannel for mpsc::UnboundedSender<Arc<str>> {
    fn is_open(&self) -> bool {
        !self.is_closed()
    }

    fn send(&self, frame: Arc<str>) -> Result<(), RelayError> {
        mpsc::UnboundedSender::send(self, frame).map_err(|_| RelayError::ChannelClosed)
    }
}

struct RelayState {
    subscribers: HashMap<Uuid, Box<dyn RelayChannel>>,
    pending: Vec<FundEvent>,
    last_flush: Instant,
    /// Deadline of the deferred flush currently armed, if any.
    scheduled_flush: Option<Instant>,
}

struct RelayInner {
    state: Mutex<RelayState>,
    config: ConfigStore<RelayConfig>,
}

/// Batching fan-out of fund events to WebSocket subscribers.
///
/// Cheap to clone; all clones share the same subscribers and queue.
#[derive(Clone)]
pub struct EventRelay {
    inner: Arc<RelayInner>,
}

impl EventRelay {
    pub fn new(config: ConfigStore<RelayConfig>) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                state: Mutex::new(RelayState {
                    subscribers: HashMap::new(),
                    pending: Vec::new(),
                    last_flush: Instant::now(),
                    scheduled_flush: None,
                }),
                config,
            }),
        }
    }

    /// Register a subscriber and send it the connection acknowledgment.
    pub async fn accept(&self, channel: impl RelayChannel + 'static) -> Result<Uuid, RelayError> {
        let ack: Arc<str> = serde_json::to_string(&RelayMessage::connected())?.into();
        let id = Uuid::now_v7();

        let mut state = self.inner.state.lock().await;
        channel.send(ack)?;
        state.subscribers.insert(id, Box::new(channel));
        info!(subscriber = %id, clients = state.subscribers.len(), "Subscriber connected");
        Ok(id)
    }

    /// Deregister a subscriber.
    pub async fn remove(&self, id: Uuid) {
        let mut state = self.inner.state.lock().await;
        if state.subscribers.remove(&id).is_some() {
            info!(subscriber = %id, clients = state.subscribers.len(), "Subscriber disconnected");
        }
    }

    /// Queue an event and flush now or later according to the interval.
    pub async fn on_chain_event(&self, event: FundEvent) {
        let interval = self.inner.config.current().min_broadcast_interval;
        let now = Instant::now();

        let mut state = self.inner.state.lock().await;
        debug!(address = %event.address, name = %event.name, "Queued fund event");
        state.pending.push(event);

        if now.saturating_duration_since(state.last_flush) >= interval {
            Self::flush_locked(&mut state, now);
        } else if state.scheduled_flush.is_none() {
            let deadline = state.last_flush + interval;
            state.scheduled_flush = Some(deadline);
            debug!(
                delay_ms = deadline.saturating_duration_since(now).as_millis() as u64,
                "Scheduled deferred flush"
            );

            let relay = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep_until(deadline).await;
                relay.deferred_flush(deadline).await;
            });
        }
    }

    /// Send everything queued to every open subscriber now.
    pub async fn flush(&self) {
        let mut state = self.inner.state.lock().await;
        Self::flush_locked(&mut state, Instant::now());
    }

    pub async fn subscriber_count(&self) -> usize {
        self.inner.state.lock().await.subscribers.len()
    }

    pub async fn pending_len(&self) -> usize {
        self.inner.state.lock().await.pending.len()
    }

    pub fn config(&self) -> &ConfigStore<RelayConfig> {
        &self.inner.config
    }

    /// Run the relay until shutdown is signaled or the event channel closes.
    ///
    /// Anything still queued on exit is flushed before returning.
    pub async fn run(
        self,
        mut shutdown_rx: watch::Receiver<bool>,
        mut event_rx: FundCreatedReceiver,
        mut config_watcher: ConfigWatcher<RelayConfig>,
    ) {
        info!(
            interval_secs = self.inner.config.current().min_broadcast_interval.as_secs(),
            "EventRelay started"
        );

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("EventRelay received shutdown signal");
                        break;
                    }
                }

                Ok(config) = config_watcher.changed() => {
                    info!(
                        interval_secs = config.min_broadcast_interval.as_secs(),
                        "EventRelay config reloaded"
                    );
                }

                Some(event) = event_rx.recv() => {
                    let _ = self.process(event).await;
                }

                else => {
                    info!("FundCreated channel closed");
                    break;
                }
            }
        }

        let pending = self.pending_len().await;
        if pending > 0 {
            info!(pending, "Flushing queued events before shutdown");
            self.flush().await;
        }
        info!("EventRelay shutdown complete");
    }

    async fn deferred_flush(&self, deadline: Instant) {
        let mut state = self.inner.state.lock().await;
        // A newer flush already took care of the queue.
        if state.scheduled_flush != Some(deadline) {
            return;
        }
        Self::flush_locked(&mut state, Instant::now());
    }

    fn flush_locked(state: &mut RelayState, now: Instant) {
        state.scheduled_flush = None;
        if state.pending.is_empty() {
            return;
        }

        let frame: Arc<str> =
            match serde_json::to_string(&RelayMessage::batch(state.pending.iter().cloned())) {
                Ok(json) => json.into(),
                Err(e) => {
                    error!(error = %e, "Failed to serialize batch, keeping queue");
                    return;
                }
            };

        let mut delivered = 0usize;
        for (id, channel) in &state.subscribers {
            if !channel.is_open() {
                continue;
            }
            match channel.send(Arc::clone(&frame)) {
                Ok(()) => delivered += 1,
                Err(e) => debug!(subscriber = %id, error = %e, "Skipping subscriber"),
            }
        }

        info!(
            events = state.pending.len(),
            subscribers = delivered,
            "Broadcast batch"
        );
        state.pending.clear();
        state.last_flush = now;
    }
}

impl Processor<FundCreated> for EventRelay {
    type Output = ();
    type Error = Infallible;

    async fn process(&self, event: FundCreated) -> Result<(), Infallible> {
        debug!(
            block = ?event.block_number,
            tx = ?event.transaction_hash,
            "Received FundCreated"
        );
        self.on_chain_event(event.into()).await;
        Ok(())
    }
}
