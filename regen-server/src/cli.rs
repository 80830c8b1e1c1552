//! Arguments and setup shared by every binary.

use crate::config::ChainOverrides;
use alloy_primitives::Address;
use regen_core::chain::{ChainError, DEFAULT_RPC_URL, FundReader, JsonRpcClient};
use regen_core::config::ChainConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

/// Chain endpoint overrides. Every binary works without them.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ChainArgs {
    /// JSON-RPC endpoint (default: https://sepolia.base.org)
    #[arg(long, env = "REGEN_RPC_URL")]
    pub rpc_url: Option<Url>,

    /// Factory contract address
    #[arg(long, env = "REGEN_FACTORY_ADDRESS")]
    pub factory_address: Option<Address>,

    /// Factory contract JSON file; its `contractAddress` is used
    #[arg(long, env = "REGEN_FACTORY_MANIFEST")]
    pub factory_manifest: Option<PathBuf>,
}

impl ChainArgs {
    pub fn overrides(&self) -> ChainOverrides {
        ChainOverrides {
            rpc_url: self.rpc_url.clone(),
            factory_address: self.factory_address,
            factory_manifest: self.factory_manifest.clone(),
        }
    }

    /// Built-in chain settings with these overrides applied.
    pub fn chain_config(&self) -> anyhow::Result<ChainConfig> {
        let mut config = ChainConfig::new(Url::parse(DEFAULT_RPC_URL)?);
        self.overrides().apply(&mut config);
        Ok(config)
    }
}

/// Build a reader for the factory described by `config`.
pub fn fund_reader(config: &ChainConfig) -> Result<FundReader, ChainError> {
    let factory = config.resolve_factory()?;
    let rpc = Arc::new(JsonRpcClient::new(config.rpc_url.clone()));
    Ok(FundReader::new(rpc, factory))
}

/// Initialize the tracing subscriber with environment-based filtering.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use regen_core::chain::FACTORY_ADDRESS;

    #[derive(Parser)]
    struct TestArgs {
        #[command(flatten)]
        chain: ChainArgs,
    }

    #[test]
    fn test_zero_args_use_constants() {
        let args = TestArgs::try_parse_from(["get-funds"]).unwrap();
        let config = args.chain.chain_config().unwrap();
        assert_eq!(config.rpc_url.as_str(), "https://sepolia.base.org/");
        assert_eq!(config.resolve_factory().unwrap(), FACTORY_ADDRESS);
    }

    #[test]
    fn test_flags_override_constants() {
        let args = TestArgs::try_parse_from([
            "get-funds",
            "--rpc-url",
            "http://127.0.0.1:8545",
            "--factory-address",
            "0x4444444444444444444444444444444444444444",
        ])
        .unwrap();
        let config = args.chain.chain_config().unwrap();
        assert_eq!(config.rpc_url.port(), Some(8545));
        assert_eq!(
            config.factory_address,
            "0x4444444444444444444444444444444444444444"
                .parse::<Address>()
                .unwrap()
        );
    }

    #[test]
    fn test_bad_address_is_rejected() {
        assert!(TestArgs::try_parse_from(["get-funds", "--factory-address", "0x12"]).is_err());
    }
}
