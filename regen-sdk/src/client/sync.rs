//! Shared relay channel with deduplication and enrichment.
//!
//! A [`SyncClient`] owns the per-process client state: the one live channel,
//! the last connection attempt and the set of fund addresses already handed
//! to the caller. Clone it freely; every clone shares the same state.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, oneshot, watch};
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use super::SyncError;
use super::state::{ClientState, ConnectionPhase, LiveChannel, OpenOutcome};
use crate::objects::{FundEvent, FundRecord, RelayMessage, RelayUpdate};
use crate::source::FundDataSource;

/// Where the relay listens when nothing else is configured.
pub const DEFAULT_RELAY_URL: &str = "ws://localhost:3001";

/// Minimum time between two connection attempts.
pub const MIN_RECONNECT_INTERVAL: Duration = Duration::from_secs(5);

type RelayStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Receiver of the events surfaced by a [`SyncClient`].
pub trait SyncSink: Send + Sync {
    /// Show a short human-readable notice.
    fn add_toast(&self, message: &str);

    /// Incorporate a newly created fund.
    fn on_event(&self, fund: FundRecord);
}

/// Configuration for a [`SyncClient`].
#[derive(Debug, Clone)]
pub struct SyncClientConfig {
    /// `ws://` or `wss://` URL of the relay.
    pub relay_url: String,
    pub min_reconnect_interval: Duration,
}

impl SyncClientConfig {
    pub fn new(relay_url: impl Into<String>) -> Self {
        Self {
            relay_url: relay_url.into(),
            min_reconnect_interval: MIN_RECONNECT_INTERVAL,
        }
    }
}

impl Default for SyncClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_RELAY_URL)
    }
}

/// Result of processing one fund event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Toast shown and enriched record handed to the sink.
    Delivered(String),
    /// The address was already surfaced; nothing was done.
    Duplicate(String),
    /// Toast shown, but the chain read returned nothing and the event was
    /// dropped.
    EnrichmentFailed(String),
    /// Update type this client does not handle.
    Ignored,
}

/// Result of processing one relay frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A connection-status acknowledgment.
    Status(bool),
    /// One outcome per event, in frame order.
    Events(Vec<EventOutcome>),
    /// Message type this client does not handle.
    Ignored,
}

/// Process-wide live-update channel to the relay.
#[derive(Clone)]
pub struct SyncClient {
    inner: Arc<SyncClientInner>,
}

struct SyncClientInner {
    config: SyncClientConfig,
    source: Arc<dyn FundDataSource>,
    state: Mutex<ClientState>,
    connected_tx: watch::Sender<bool>,
}

impl SyncClient {
    /// Create a client that enriches events through `source`.
    pub fn new(config: SyncClientConfig, source: Arc<dyn FundDataSource>) -> Self {
        let (connected_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(SyncClientInner {
                config,
                source,
                state: Mutex::new(ClientState::new()),
                connected_tx,
            }),
        }
    }

    /// Whether the relay channel is currently connected.
    pub fn is_ws_connected(&self) -> bool {
        *self.inner.connected_tx.borrow()
    }

    /// Observe connectivity changes.
    pub fn watch_connected(&self) -> watch::Receiver<bool> {
        self.inner.connected_tx.subscribe()
    }

    pub async fn phase(&self) -> ConnectionPhase {
        self.inner.state.lock().await.phase()
    }

    fn set_connected(&self, connected: bool) {
        self.inner.connected_tx.send_replace(connected);
    }

    /// Enable live updates, delivering them to `sink`.
    ///
    /// Reuses the live channel if there is one, and skips the attempt if the
    /// previous one was less than the reconnect interval ago. A reused
    /// channel keeps delivering to the sink it was opened with.
    pub async fn open(&self, sink: Arc<dyn SyncSink>) -> Result<OpenOutcome, SyncError> {
        let generation = {
            let mut state = self.inner.state.lock().await;
            match state.begin_connect(Instant::now(), self.inner.config.min_reconnect_interval) {
                Ok(generation) => generation,
                Err(OpenOutcome::Reused) => {
                    debug!("Using existing relay connection");
                    if state.phase() == ConnectionPhase::Connected {
                        self.set_connected(true);
                    }
                    return Ok(OpenOutcome::Reused);
                }
                Err(outcome) => {
                    debug!("Skipping relay connection attempt (too frequent)");
                    return Ok(outcome);
                }
            }
        };

        info!(url = %self.inner.config.relay_url, "Creating new relay connection");
        let stream = match connect_async(self.inner.config.relay_url.as_str()).await {
            Ok((stream, _)) => stream,
            Err(e) => {
                warn!(error = %e, "Failed to connect to relay");
                self.inner.state.lock().await.connect_failed(generation);
                self.set_connected(false);
                return Err(e.into());
            }
        };

        // Keep the lock while spawning so the reader cannot report its end
        // before the channel is registered.
        let mut state = self.inner.state.lock().await;
        let (close_tx, close_rx) = oneshot::channel();
        let reader = tokio::spawn(self.clone().read_loop(generation, stream, close_rx, sink));
        match state.connect_succeeded(LiveChannel::new(generation, close_tx, reader)) {
            Ok(()) => {
                info!("Connected to relay");
                self.set_connected(true);
                Ok(OpenOutcome::Opened)
            }
            Err(channel) => {
                channel.abort();
                Err(SyncError::Abandoned)
            }
        }
    }

    /// Release the caller's interest in live updates.
    ///
    /// Unless `teardown` is set the channel stays open so the next
    /// [`open`](Self::open) can reuse it.
    pub async fn release(&self, teardown: bool) {
        if !teardown {
            debug!("Keeping relay connection alive");
            return;
        }

        let channel = self.inner.state.lock().await.teardown();
        if let Some(channel) = channel {
            info!("Closing relay connection");
            channel.close();
        }
        self.set_connected(false);
    }

    /// Process one text frame received from the relay.
    ///
    /// Batch items are processed one after another, in frame order.
    pub async fn handle_frame(
        &self,
        text: &str,
        sink: &dyn SyncSink,
    ) -> Result<FrameOutcome, SyncError> {
        let message: RelayMessage = serde_json::from_str(text)?;

        match message {
            RelayMessage::BatchUpdate { updates } => {
                debug!(count = updates.len(), "Processing batched update");
                let mut outcomes = Vec::with_capacity(updates.len());
                for update in updates {
                    let outcome = match update {
                        RelayUpdate::NewFund { data } => self.process_event(data, sink).await,
                        RelayUpdate::Unrecognized => EventOutcome::Ignored,
                    };
                    outcomes.push(outcome);
                }
                Ok(FrameOutcome::Events(outcomes))
            }
            RelayMessage::NewFund { data } => Ok(FrameOutcome::Events(vec![
                self.process_event(data, sink).await,
            ])),
            RelayMessage::ConnectionStatus { data } => {
                info!(connected = data.connected, "Relay connection status");
                Ok(FrameOutcome::Status(data.connected))
            }
            RelayMessage::Unrecognized => Ok(FrameOutcome::Ignored),
        }
    }

    async fn process_event(&self, event: FundEvent, sink: &dyn SyncSink) -> EventOutcome {
        let newly_seen = self.inner.state.lock().await.mark_processed(&event.address);
        if !newly_seen {
            debug!(
                name = %event.name,
                address = %event.address,
                "Skipping already processed fund"
            );
            return EventOutcome::Duplicate(event.address);
        }

        sink.add_toast(&format!("New fund created: {}", event.name));

        match self.inner.source.fetch_fund_data(&event.address).await {
            Some(record) => {
                sink.on_event(record);
                EventOutcome::Delivered(event.address)
            }
            None => {
                warn!(address = %event.address, "No fund data, dropping event");
                EventOutcome::EnrichmentFailed(event.address)
            }
        }
    }

    async fn read_loop(
        self,
        generation: u64,
        mut stream: RelayStream,
        mut close_rx: oneshot::Receiver<()>,
        sink: Arc<dyn SyncSink>,
    ) {
        let ended = loop {
            tokio::select! {
                _ = &mut close_rx => {
                    let _ = stream.close(None).await;
                    break ConnectionPhase::Closed;
                }

                frame = stream.next() => {
                    let result = match frame {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_frame(&text, sink.as_ref()).await
                        }
                        Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                            Ok(text) => self.handle_frame(text, sink.as_ref()).await,
                            Err(e) => Err(e.into()),
                        },
                        Some(Ok(Message::Close(_))) | None => break ConnectionPhase::Closed,
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            warn!(error = %e, "Relay connection error");
                            break ConnectionPhase::Errored;
                        }
                    };

                    match result {
                        Ok(outcome) => debug!(?outcome, "Processed relay message"),
                        Err(e) => warn!(error = %e, "Discarding relay message"),
                    }
                }
            }
        };

        info!(phase = ?ended, "Relay connection ended");
        if self.inner.state.lock().await.transport_ended(generation, ended) {
            self.set_connected(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    struct StubSource {
        records: HashMap<String, FundRecord>,
        delays: HashMap<String, Duration>,
    }

    #[async_trait]
    impl FundDataSource for StubSource {
        async fn fetch_fund_data(&self, address: &str) -> Option<FundRecord> {
            if let Some(delay) = self.delays.get(address) {
                tokio::time::sleep(*delay).await;
            }
            self.records.get(address).cloned()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        toasts: StdMutex<Vec<String>>,
        funds: StdMutex<Vec<FundRecord>>,
    }

    impl SyncSink for RecordingSink {
        fn add_toast(&self, message: &str) {
            self.toasts.lock().unwrap().push(message.to_string());
        }

        fn on_event(&self, fund: FundRecord) {
            self.funds.lock().unwrap().push(fund);
        }
    }

    fn record(address: &str, name: &str) -> FundRecord {
        FundRecord {
            address: address.to_string(),
            name: name.to_string(),
            description: format!("{name} description"),
            image: String::new(),
            goal: Decimal::from(1000),
            current_balance: Decimal::ZERO,
            total_raised: Decimal::ZERO,
            progress: 0,
            owner: "0xowner".to_string(),
        }
    }

    fn new_fund_json(address: &str, name: &str) -> serde_json::Value {
        serde_json::json!({
            "type": "new_fund",
            "data": {"owner": "0xowner", "address": address, "name": name, "goal": "1000.0"}
        })
    }

    fn client(records: &[(&str, &str)], delays: &[(&str, u64)]) -> SyncClient {
        let source = StubSource {
            records: records
                .iter()
                .map(|(a, n)| (a.to_string(), record(a, n)))
                .collect(),
            delays: delays
                .iter()
                .map(|(a, ms)| (a.to_string(), Duration::from_millis(*ms)))
                .collect(),
        };
        SyncClient::new(SyncClientConfig::default(), Arc::new(source))
    }

    #[tokio::test]
    async fn test_same_fund_twice_is_surfaced_once() {
        let client = client(&[("0xa", "Oak Grove")], &[]);
        let sink = RecordingSink::default();
        let frame = new_fund_json("0xa", "Oak Grove").to_string();

        let first = client.handle_frame(&frame, &sink).await.unwrap();
        let second = client.handle_frame(&frame, &sink).await.unwrap();

        assert_eq!(
            first,
            FrameOutcome::Events(vec![EventOutcome::Delivered("0xa".to_string())])
        );
        assert_eq!(
            second,
            FrameOutcome::Events(vec![EventOutcome::Duplicate("0xa".to_string())])
        );
        assert_eq!(*sink.toasts.lock().unwrap(), vec!["New fund created: Oak Grove"]);
        assert_eq!(sink.funds.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_items_are_delivered_in_order() {
        // The first fund is the slowest to read; it must still come first.
        let client = client(
            &[("0x1", "First"), ("0x2", "Second"), ("0x3", "Third")],
            &[("0x1", 300), ("0x2", 100), ("0x3", 0)],
        );
        let sink = RecordingSink::default();
        let frame = serde_json::json!({
            "type": "batch_update",
            "updates": [
                new_fund_json("0x1", "First"),
                new_fund_json("0x2", "Second"),
                new_fund_json("0x3", "Third"),
            ]
        })
        .to_string();

        client.handle_frame(&frame, &sink).await.unwrap();

        let names: Vec<_> = sink
            .funds
            .lock()
            .unwrap()
            .iter()
            .map(|f| f.name.clone())
            .collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
    }

    #[tokio::test]
    async fn test_duplicate_inside_one_batch() {
        let client = client(&[("0xa", "Oak Grove")], &[]);
        let sink = RecordingSink::default();
        let frame = serde_json::json!({
            "type": "batch_update",
            "updates": [new_fund_json("0xa", "Oak Grove"), new_fund_json("0xA", "Oak Grove")]
        })
        .to_string();

        let outcome = client.handle_frame(&frame, &sink).await.unwrap();
        assert_eq!(
            outcome,
            FrameOutcome::Events(vec![
                EventOutcome::Delivered("0xa".to_string()),
                EventOutcome::Duplicate("0xA".to_string()),
            ])
        );
        assert_eq!(sink.funds.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_fund_is_dropped() {
        let client = client(&[], &[]);
        let sink = RecordingSink::default();
        let frame = new_fund_json("0xdead", "Ghost").to_string();

        let outcome = client.handle_frame(&frame, &sink).await.unwrap();
        assert_eq!(
            outcome,
            FrameOutcome::Events(vec![EventOutcome::EnrichmentFailed("0xdead".to_string())])
        );
        assert!(sink.funds.lock().unwrap().is_empty());

        // Still marked as seen: no retry on redelivery.
        let outcome = client.handle_frame(&frame, &sink).await.unwrap();
        assert_eq!(
            outcome,
            FrameOutcome::Events(vec![EventOutcome::Duplicate("0xdead".to_string())])
        );
    }

    #[tokio::test]
    async fn test_malformed_frame_is_an_error() {
        let client = client(&[], &[]);
        let sink = RecordingSink::default();
        let result = client.handle_frame("{not json", &sink).await;
        assert!(matches!(result, Err(SyncError::MalformedMessage(_))));
    }

    #[tokio::test]
    async fn test_status_and_unknown_frames() {
        let client = client(&[], &[]);
        let sink = RecordingSink::default();

        let status = r#"{"type":"connection_status","data":{"connected":true}}"#;
        assert_eq!(
            client.handle_frame(status, &sink).await.unwrap(),
            FrameOutcome::Status(true)
        );
        assert_eq!(
            client
                .handle_frame(r#"{"type":"heartbeat"}"#, &sink)
                .await
                .unwrap(),
            FrameOutcome::Ignored
        );
        assert!(sink.toasts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_connect_then_back_off() {
        let config = SyncClientConfig::new("ws://127.0.0.1:1");
        let client = SyncClient::new(
            config,
            Arc::new(StubSource {
                records: HashMap::new(),
                delays: HashMap::new(),
            }),
        );
        let sink: Arc<dyn SyncSink> = Arc::new(RecordingSink::default());

        assert!(client.open(sink.clone()).await.is_err());
        assert_eq!(client.phase().await, ConnectionPhase::Errored);
        assert!(!client.is_ws_connected());

        assert_eq!(client.open(sink).await.unwrap(), OpenOutcome::BackedOff);
    }
}
