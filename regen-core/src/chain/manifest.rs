//! Bundled contract JSON files (`{"contractAddress": "0x..", "abi": [...]}`).

use std::path::Path;

use alloy_primitives::Address;
use serde::Deserialize;

use super::ChainError;

/// A deployed contract as shipped with the frontend build.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractManifest {
    pub contract_address: Address,
    /// Kept for inspection only; calls go through the compiled bindings.
    #[serde(default)]
    pub abi: serde_json::Value,
}

impl ContractManifest {
    pub fn from_json(json: &str) -> Result<Self, ChainError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ChainError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest() {
        let manifest = ContractManifest::from_json(
            r#"{"contractAddress":"0xC77E8005a3d6bD632999373da027ACf6F478E696","abi":[{"type":"function","name":"getRegenThemFundContracts"}]}"#,
        )
        .unwrap();
        assert_eq!(manifest.contract_address, crate::chain::FACTORY_ADDRESS);
        assert!(manifest.abi.is_array());
    }

    #[test]
    fn test_missing_address_is_an_error() {
        assert!(matches!(
            ContractManifest::from_json(r#"{"abi":[]}"#),
            Err(ChainError::ManifestParse(_))
        ));
    }
}
