//! TOML file configuration structures.
//!
//! These structs directly map to the `regen-relay.toml` file format. Every
//! section and key is optional.

use alloy_primitives::Address;
use regen_core::chain::{DEFAULT_RPC_URL, FACTORY_ADDRESS};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub relay: RelayConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:3001").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 3001))
}

/// Chain configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    #[serde(default = "default_factory_address")]
    pub factory_address: Address,
    /// Contract JSON with a `contractAddress` field; wins over
    /// `factory_address` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory_manifest: Option<PathBuf>,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            factory_address: default_factory_address(),
            factory_manifest: None,
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

fn default_rpc_url() -> String {
    DEFAULT_RPC_URL.to_string()
}

fn default_factory_address() -> Address {
    FACTORY_ADDRESS
}

fn default_poll_interval_secs() -> u64 {
    4
}

/// Relay configuration section. Reloadable with SIGHUP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_min_broadcast_interval_secs")]
    pub min_broadcast_interval_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            min_broadcast_interval_secs: default_min_broadcast_interval_secs(),
        }
    }
}

fn default_min_broadcast_interval_secs() -> u64 {
    15
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:4000"

[chain]
rpc_url = "http://localhost:8545"
factory_address = "0x4444444444444444444444444444444444444444"
factory_manifest = "./contracts/RegenThemFundFactory.json"
poll_interval_secs = 2

[relay]
min_broadcast_interval_secs = 30
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 4000);
        assert_eq!(config.chain.rpc_url, "http://localhost:8545");
        assert_eq!(
            config.chain.factory_address,
            "0x4444444444444444444444444444444444444444"
                .parse::<Address>()
                .unwrap()
        );
        assert!(config.chain.factory_manifest.is_some());
        assert_eq!(config.chain.poll_interval_secs, 2);
        assert_eq!(config.relay.min_broadcast_interval_secs, 30);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.listen.port(), 3001);
        assert_eq!(config.chain.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.chain.factory_address, FACTORY_ADDRESS);
        assert_eq!(config.relay.min_broadcast_interval_secs, 15);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: FileConfig = toml::from_str("[relay]\n").unwrap();
        assert_eq!(config.relay.min_broadcast_interval_secs, 15);
        assert_eq!(config.chain.poll_interval_secs, 4);
    }
}
