//! Events flowing from the chain watcher to the relay.
//!
//! # Event Flow
//!
//! 1. `FactoryWatcher` decodes factory logs into `FundCreated`
//! 2. `EventRelay` batches `FundCreated` events and fans them out to
//!    WebSocket subscribers

pub mod channels;
pub mod types;

pub use channels::{
    DEFAULT_CHANNEL_BUFFER, FundCreatedReceiver, FundCreatedSender, fund_created_channel,
};
pub use types::FundCreated;
