//! Chain-data collaborator used to enrich relay events.

use async_trait::async_trait;

use crate::objects::FundRecord;

/// Read-only access to fund state on chain.
///
/// Implementations log their own failures; `None` means the fund could not
/// be read and callers drop whatever depended on it.
#[async_trait]
pub trait FundDataSource: Send + Sync {
    /// Fetch the full state of the fund at `address`.
    async fn fetch_fund_data(&self, address: &str) -> Option<FundRecord>;
}
