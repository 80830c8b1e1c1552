use std::path::PathBuf;
use std::time::Duration;

use alloy_primitives::Address;
use url::Url;

use crate::chain::{ChainError, ContractManifest, FACTORY_ADDRESS};

/// Default interval between two `eth_getLogs` polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(4);

/// Where to read chain state from.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub rpc_url: Url,
    pub factory_address: Address,
    /// Contract JSON whose `contractAddress` takes precedence over
    /// `factory_address`.
    pub factory_manifest: Option<PathBuf>,
    pub poll_interval: Duration,
}

impl ChainConfig {
    /// Defaults for everything but the endpoint.
    pub fn new(rpc_url: Url) -> Self {
        Self {
            rpc_url,
            factory_address: FACTORY_ADDRESS,
            factory_manifest: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// The factory address to use, reading the manifest if one is set.
    pub fn resolve_factory(&self) -> Result<Address, ChainError> {
        match &self.factory_manifest {
            Some(path) => Ok(ContractManifest::load(path)?.contract_address),
            None => Ok(self.factory_address),
        }
    }
}
