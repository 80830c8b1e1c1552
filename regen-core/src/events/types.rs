//! Event payload types.

use alloy_primitives::B256;
use regen_sdk::objects::FundEvent;

/// A `RegenThemFundCreated` log, decoded.
///
/// Carries the wire payload plus where on chain it came from, which is only
/// used for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundCreated {
    pub event: FundEvent,
    pub block_number: Option<u64>,
    pub transaction_hash: Option<B256>,
}

impl From<FundCreated> for FundEvent {
    fn from(created: FundCreated) -> Self {
        created.event
    }
}

impl From<FundEvent> for FundCreated {
    fn from(event: FundEvent) -> Self {
        Self {
            event,
            block_number: None,
            transaction_hash: None,
        }
    }
}
