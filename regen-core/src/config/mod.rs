//! Validated runtime configuration shared by the relay and the CLI tools.
//!
//! Loading and parsing of the TOML file is handled by the server crate;
//! these are the types it produces.

mod chain;
mod config_store;
mod relay;

pub use chain::ChainConfig;
pub use config_store::{ConfigStore, ConfigWatcher};
pub use relay::RelayConfig;
