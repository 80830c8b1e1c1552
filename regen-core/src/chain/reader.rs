//! Fund queries against the factory and fund contracts.

use std::sync::Arc;

use alloy_primitives::{Address, U256, keccak256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use futures_util::future::join_all;
use kanau::processor::Processor;
use regen_sdk::objects::FundRecord;
use regen_sdk::source::FundDataSource;
use tracing::{debug, warn};

use super::abi::{IRegenThemFund, IRegenThemFundFactory};
use super::rpc::JsonRpcClient;
use super::{ChainError, parse_address};
use crate::utils::units::token_amount_to_decimal;

/// Read-only view of the factory and its funds.
#[derive(Debug, Clone)]
pub struct FundReader {
    rpc: Arc<JsonRpcClient>,
    factory: Address,
}

/// Raw return values of the per-fund getters.
#[derive(Debug, Clone)]
pub struct RawFundState {
    pub name: String,
    pub description: String,
    pub goal: U256,
    pub current_balance: U256,
    pub total_raised: U256,
    pub progress: U256,
    pub owner: Address,
}

/// Fetch the full record of one fund.
#[derive(Debug, Clone)]
pub struct GetFundRecord {
    pub address: String,
}

/// List every fund and fetch its record; funds that fail to load are
/// left out.
#[derive(Debug, Clone, Copy)]
pub struct LoadAllFunds;

impl FundReader {
    pub fn new(rpc: Arc<JsonRpcClient>, factory: Address) -> Self {
        Self { rpc, factory }
    }

    pub fn factory(&self) -> Address {
        self.factory
    }

    pub fn rpc(&self) -> &Arc<JsonRpcClient> {
        &self.rpc
    }

    async fn call<C: SolCall>(&self, to: Address, call: C) -> Result<C::Return, ChainError> {
        let output = self.rpc.call(to, call.abi_encode().into()).await?;
        Ok(C::abi_decode_returns(&output, true)?)
    }

    /// Addresses of all funds deployed by the factory, in creation order.
    pub async fn fetch_all_funds(&self) -> Result<Vec<Address>, ChainError> {
        let funds = self
            .call(
                self.factory,
                IRegenThemFundFactory::getRegenThemFundContractsCall {},
            )
            .await?
            ._0;
        debug!(count = funds.len(), "Fetched fund addresses from factory");
        Ok(funds)
    }

    /// Query all getters of one fund concurrently.
    pub async fn fetch_raw_state(&self, fund: Address) -> Result<RawFundState, ChainError> {
        let (name, description, goal, current_balance, total_raised, progress, owner) = tokio::try_join!(
            self.call(fund, IRegenThemFund::getNameCall {}),
            self.call(fund, IRegenThemFund::getDescriptionCall {}),
            self.call(fund, IRegenThemFund::getGoalAmountCall {}),
            self.call(fund, IRegenThemFund::getCurrentBalanceCall {}),
            self.call(fund, IRegenThemFund::getTotalRaisedCall {}),
            self.call(fund, IRegenThemFund::getProgressCall {}),
            self.call(fund, IRegenThemFund::getOwnerCall {}),
        )?;

        Ok(RawFundState {
            name: name._0,
            description: description._0,
            goal: goal._0,
            current_balance: current_balance._0,
            total_raised: total_raised._0,
            progress: progress._0,
            owner: owner._0,
        })
    }

    /// Full record of the fund at `address`.
    pub async fn fetch_fund_data(&self, address: &str) -> Result<FundRecord, ChainError> {
        let fund = parse_address(address)?;
        let raw = self.fetch_raw_state(fund).await?;
        build_fund_record(address, raw)
    }

    /// Records of every fund, in factory order. A fund whose getters fail is
    /// logged and skipped.
    pub async fn load_all_funds(&self) -> Result<Vec<FundRecord>, ChainError> {
        let addresses = self.fetch_all_funds().await?;
        if addresses.is_empty() {
            return Ok(Vec::new());
        }

        let fetches = addresses.iter().map(|fund| async move {
            let address = fund.to_checksum(None);
            match self.fetch_fund_data(&address).await {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(%address, error = %e, "Failed to load fund, skipping");
                    None
                }
            }
        });

        Ok(join_all(fetches).await.into_iter().flatten().collect())
    }
}

/// Placeholder image for a fund, seeded by the hash of its address string.
pub fn fund_image_url(address: &str) -> String {
    let hash = keccak256(address.as_bytes());
    let hex = alloy_primitives::hex::encode(hash);
    format!("https://picsum.photos/seed/{}/400/300", &hex[..8])
}

/// Turn raw getter results into a [`FundRecord`].
pub fn build_fund_record(address: &str, raw: RawFundState) -> Result<FundRecord, ChainError> {
    let progress = u64::try_from(raw.progress)
        .map_err(|_| ChainError::Amount(format!("progress out of range: {}", raw.progress)))?;

    Ok(FundRecord {
        address: address.to_string(),
        name: raw.name,
        description: raw.description,
        image: fund_image_url(address),
        goal: token_amount_to_decimal(raw.goal)?,
        current_balance: token_amount_to_decimal(raw.current_balance)?,
        total_raised: token_amount_to_decimal(raw.total_raised)?,
        progress,
        owner: raw.owner.to_checksum(None),
    })
}

impl Processor<GetFundRecord> for FundReader {
    type Output = FundRecord;
    type Error = ChainError;
    #[tracing::instrument(skip_all, err, name = "RPC:GetFundRecord")]
    async fn process(&self, query: GetFundRecord) -> Result<FundRecord, ChainError> {
        self.fetch_fund_data(&query.address).await
    }
}

impl Processor<LoadAllFunds> for FundReader {
    type Output = Vec<FundRecord>;
    type Error = ChainError;
    #[tracing::instrument(skip_all, err, name = "RPC:LoadAllFunds")]
    async fn process(&self, _query: LoadAllFunds) -> Result<Vec<FundRecord>, ChainError> {
        self.load_all_funds().await
    }
}

#[async_trait]
impl FundDataSource for FundReader {
    async fn fetch_fund_data(&self, address: &str) -> Option<FundRecord> {
        let query = GetFundRecord {
            address: address.to_string(),
        };
        match self.process(query).await {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(%address, error = %e, "Failed to fetch fund data");
                None
            }
        }
    }
}
