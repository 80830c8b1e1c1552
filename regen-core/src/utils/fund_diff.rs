//! Change detection between two successive fund listings.

use std::collections::HashMap;

use regen_sdk::objects::FundRecord;
use rust_decimal::Decimal;

/// How a fund changed since the previous listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundChange {
    /// Nothing to report, or this is the first listing.
    Unchanged,
    /// The fund was not in the previous listing.
    New,
    /// The current balance moved; `difference` is signed.
    BalanceChanged {
        previous: Decimal,
        difference: Decimal,
    },
}

/// Balances seen in the last listing, keyed by lowercased fund address.
#[derive(Debug, Default)]
pub struct FundSnapshot {
    balances: HashMap<String, Decimal>,
    initialized: bool,
}

impl FundSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `funds` against the snapshot without updating it.
    ///
    /// Before the first [`replace`](Self::replace) every fund is reported
    /// as [`FundChange::Unchanged`].
    pub fn diff(&self, funds: &[FundRecord]) -> Vec<FundChange> {
        funds
            .iter()
            .map(|fund| {
                if !self.initialized {
                    return FundChange::Unchanged;
                }
                match self.balances.get(&fund.address.to_ascii_lowercase()) {
                    None => FundChange::New,
                    Some(previous) if *previous != fund.current_balance => {
                        FundChange::BalanceChanged {
                            previous: *previous,
                            difference: fund.current_balance - *previous,
                        }
                    }
                    Some(_) => FundChange::Unchanged,
                }
            })
            .collect()
    }

    /// Make `funds` the new baseline.
    pub fn replace(&mut self, funds: &[FundRecord]) {
        self.balances = funds
            .iter()
            .map(|fund| (fund.address.to_ascii_lowercase(), fund.current_balance))
            .collect();
        self.initialized = true;
    }
}
