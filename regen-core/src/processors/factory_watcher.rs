//! FactoryWatcher processor.
//!
//! Polls `eth_getLogs` for `RegenThemFundCreated` on the factory contract and
//! emits a `FundCreated` event per log, in chain order.
//!
//! The watcher starts at the chain head, so funds created before startup are
//! never emitted. If the head cannot be read at startup the watcher logs the
//! error and stops; a failed poll is logged and retried on the next tick.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::chain::abi::{decode_fund_created, fund_created_topic};
use crate::chain::{ChainError, JsonRpcClient, LogFilter};
use crate::events::FundCreatedSender;

/// Most blocks covered by a single `eth_getLogs` request.
pub const MAX_BLOCK_RANGE: u64 = 2_000;

/// Inclusive block range to query next, or `None` when already at `head`.
pub fn next_block_range(cursor: u64, head: u64) -> Option<(u64, u64)> {
    if head <= cursor {
        return None;
    }
    let from = cursor + 1;
    Some((from, head.min(cursor.saturating_add(MAX_BLOCK_RANGE))))
}

pub struct FactoryWatcher {
    rpc: Arc<JsonRpcClient>,
    factory: Address,
    poll_interval: Duration,
    event_tx: FundCreatedSender,
}

impl FactoryWatcher {
    pub fn new(
        rpc: Arc<JsonRpcClient>,
        factory: Address,
        poll_interval: Duration,
        event_tx: FundCreatedSender,
    ) -> Self {
        Self {
            rpc,
            factory,
            poll_interval,
            event_tx,
        }
    }

    /// Run until shutdown is signaled or the event receiver is dropped.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut cursor = match self.rpc.block_number().await {
            Ok(head) => head,
            Err(e) => {
                error!(
                    error = %e,
                    rpc = %self.rpc.url(),
                    "FactoryWatcher failed to initialize, no chain events will be relayed"
                );
                return;
            }
        };
        info!(
            factory = %self.factory,
            block = cursor,
            "FactoryWatcher started"
        );

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("FactoryWatcher received shutdown signal");
                        break;
                    }
                }

                _ = ticker.tick() => {
                    match self.poll(cursor).await {
                        Ok(next) => cursor = next,
                        Err(ChainError::ChannelClosed) => {
                            info!("FundCreated receiver dropped");
                            break;
                        }
                        Err(e) => warn!(error = %e, block = cursor, "Factory log poll failed"),
                    }
                }
            }
        }

        info!("FactoryWatcher shutdown complete");
    }

    /// Fetch and emit the logs after `cursor`. Returns the new cursor.
    pub async fn poll(&self, cursor: u64) -> Result<u64, ChainError> {
        let head = self.rpc.block_number().await?;
        let Some((from_block, to_block)) = next_block_range(cursor, head) else {
            return Ok(cursor);
        };

        let logs = self
            .rpc
            .get_logs(&LogFilter {
                address: self.factory,
                topics: vec![fund_created_topic()],
                from_block,
                to_block,
            })
            .await?;
        debug!(from_block, to_block, logs = logs.len(), "Polled factory logs");

        for log in logs {
            match decode_fund_created(&log) {
                Ok(created) => {
                    info!(
                        name = %created.event.name,
                        address = %created.event.address,
                        owner = %created.event.owner,
                        goal = %created.event.goal,
                        "New fund created"
                    );
                    self.event_tx
                        .send(created)
                        .await
                        .map_err(|_| ChainError::ChannelClosed)?;
                }
                Err(e) => warn!(error = %e, tx = ?log.transaction_hash, "Skipping undecodable log"),
            }
        }

        Ok(to_block)
    }
}
