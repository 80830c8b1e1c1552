//! Event channel factories and handles.

use super::types::FundCreated;
use tokio::sync::mpsc;

/// Default buffer size for event channels.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for FundCreated events.
pub type FundCreatedSender = mpsc::Sender<FundCreated>;
/// Receiver handle for FundCreated events.
pub type FundCreatedReceiver = mpsc::Receiver<FundCreated>;

/// Create a new FundCreated channel.
///
/// Multiple senders can be cloned from the returned sender.
pub fn fund_created_channel() -> (FundCreatedSender, FundCreatedReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}
