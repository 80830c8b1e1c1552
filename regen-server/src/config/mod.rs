//! Configuration module for regen-server.
//!
//! Handles loading configuration from the optional TOML file and applying
//! CLI / environment overrides on top of it.

pub mod file;

use crate::config::file::FileConfig;
use alloy_primitives::Address;
use regen_core::config::{ChainConfig, RelayConfig};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Chain settings given on the command line or in the environment.
#[derive(Debug, Clone, Default)]
pub struct ChainOverrides {
    pub rpc_url: Option<Url>,
    pub factory_address: Option<Address>,
    pub factory_manifest: Option<PathBuf>,
}

impl ChainOverrides {
    pub fn apply(&self, config: &mut ChainConfig) {
        if let Some(rpc_url) = &self.rpc_url {
            config.rpc_url = rpc_url.clone();
        }
        if let Some(address) = self.factory_address {
            config.factory_address = address;
        }
        if let Some(manifest) = &self.factory_manifest {
            config.factory_manifest = Some(manifest.clone());
        }
    }
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub listen: SocketAddr,
    pub chain: ChainConfig,
    pub relay: RelayConfig,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    listen_override: Option<SocketAddr>,
    chain_overrides: ChainOverrides,
}

impl ConfigLoader {
    pub fn new(
        config_path: impl AsRef<Path>,
        listen_override: Option<SocketAddr>,
        chain_overrides: ChainOverrides,
    ) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
            chain_overrides,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file, or use built-in defaults if it does not exist
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let file_config = match std::fs::read_to_string(&self.config_path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    path = %self.config_path.display(),
                    "No config file found, using built-in defaults"
                );
                FileConfig::default()
            }
            Err(e) => return Err(e.into()),
        };

        self.build_loaded_config(file_config)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn build_loaded_config(&self, file_config: FileConfig) -> Result<LoadedConfig, ConfigError> {
        if file_config.chain.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "chain.poll_interval_secs must be greater than zero".to_string(),
            ));
        }

        let rpc_url = Url::parse(&file_config.chain.rpc_url).map_err(|e| {
            ConfigError::ValidationError(format!(
                "invalid chain.rpc_url {:?}: {e}",
                file_config.chain.rpc_url
            ))
        })?;

        let mut chain = ChainConfig::new(rpc_url);
        chain.factory_address = file_config.chain.factory_address;
        chain.factory_manifest = file_config.chain.factory_manifest;
        chain.poll_interval = Duration::from_secs(file_config.chain.poll_interval_secs);
        self.chain_overrides.apply(&mut chain);

        Ok(LoadedConfig {
            listen: self.listen_override.unwrap_or(file_config.server.listen),
            chain,
            relay: RelayConfig {
                min_broadcast_interval: Duration::from_secs(
                    file_config.relay.min_broadcast_interval_secs,
                ),
            },
        })
    }
}
