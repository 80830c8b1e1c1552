use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A fund creation notice, as emitted by the factory contract.
///
/// `goal` is the token amount already normalized from its 18-decimal
/// fixed-point representation, kept as a decimal string on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundEvent {
    /// Address that created the fund.
    pub owner: String,
    /// Address of the new fund contract.
    pub address: String,
    /// Display name of the fund.
    pub name: String,
    /// Funding goal in whole tokens.
    pub goal: String,
}

/// Full on-chain state of a single fund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundRecord {
    pub address: String,
    pub name: String,
    pub description: String,
    /// Placeholder image URL derived from the fund address.
    pub image: String,
    pub goal: Decimal,
    pub current_balance: Decimal,
    pub total_raised: Decimal,
    /// Progress towards the goal, in percent.
    pub progress: u64,
    pub owner: String,
}
