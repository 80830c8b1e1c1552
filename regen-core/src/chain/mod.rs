//! Read-only access to the RegenThemFund contracts.
//!
//! - [`rpc`]: minimal JSON-RPC client (`eth_blockNumber`, `eth_call`,
//!   `eth_getLogs`).
//! - [`abi`]: contract bindings and log decoding.
//! - [`reader`]: fund queries built on top of both.
//! - [`manifest`]: loader for the bundled contract JSON files.

pub mod abi;
pub mod manifest;
pub mod reader;
pub mod rpc;

pub use manifest::ContractManifest;
pub use reader::{FundReader, GetFundRecord, LoadAllFunds};
pub use rpc::{JsonRpcClient, LogFilter, RpcError, RpcLog};

use alloy_primitives::{Address, address};
use thiserror::Error;

/// Factory contract deployed on Base Sepolia.
pub const FACTORY_ADDRESS: Address = address!("C77E8005a3d6bD632999373da027ACf6F478E696");

/// Public Base Sepolia RPC endpoint.
pub const DEFAULT_RPC_URL: &str = "https://sepolia.base.org";

/// Errors that can occur while reading chain state.
#[derive(Debug, Error)]
pub enum ChainError {
    /// JSON-RPC transport or protocol error
    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError),

    /// Return data or log did not match the contract ABI
    #[error("abi decode error: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    /// A token amount could not be represented as a decimal
    #[error("invalid token amount: {0}")]
    Amount(String),

    /// A string was not a valid address
    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// Contract manifest could not be read
    #[error("failed to read contract manifest: {0}")]
    ManifestIo(#[from] std::io::Error),

    /// Contract manifest is not valid JSON
    #[error("failed to parse contract manifest: {0}")]
    ManifestParse(#[from] serde_json::Error),

    /// Downstream event channel was dropped
    #[error("event channel closed")]
    ChannelClosed,
}

/// Parse a hex address string.
pub fn parse_address(address: &str) -> Result<Address, ChainError> {
    address
        .parse::<Address>()
        .map_err(|e| ChainError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}
