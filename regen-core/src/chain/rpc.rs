//! Minimal Ethereum JSON-RPC client over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::{Address, B256, Bytes};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Errors returned by [`JsonRpcClient`].
#[derive(Debug, Error)]
pub enum RpcError {
    /// HTTP request error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The node answered with a JSON-RPC error object
    #[error("node error {code}: {message}")]
    Node { code: i64, message: String },

    /// The response carried neither a result nor an error
    #[error("empty response for {method}")]
    EmptyResponse { method: &'static str },

    /// A quantity was not valid hex
    #[error("invalid quantity {0:?}")]
    InvalidQuantity(String),
}

/// Filter for `eth_getLogs`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilter {
    pub address: Address,
    pub topics: Vec<B256>,
    #[serde(serialize_with = "serialize_quantity")]
    pub from_block: u64,
    #[serde(serialize_with = "serialize_quantity")]
    pub to_block: u64,
}

/// A log entry as returned by `eth_getLogs`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<B256>,
}

impl RpcLog {
    /// Block the log was emitted in, if the node reported one.
    pub fn block_number(&self) -> Option<u64> {
        self.block_number
            .as_deref()
            .and_then(|q| parse_quantity(q).ok())
    }
}

#[derive(Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Serialize)]
struct CallRequest {
    to: Address,
    data: Bytes,
}

/// JSON-RPC client for a single node endpoint.
#[derive(Debug)]
pub struct JsonRpcClient {
    http: reqwest::Client,
    url: Url,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: Url) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            url,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn request<P: Serialize, T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: P,
    ) -> Result<T, RpcError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response: RpcResponse<T> = self
            .http
            .post(self.url.clone())
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(RpcError::Node {
                code: error.code,
                message: error.message,
            });
        }
        response.result.ok_or(RpcError::EmptyResponse { method })
    }

    /// `eth_blockNumber`
    pub async fn block_number(&self) -> Result<u64, RpcError> {
        let quantity: String = self.request("eth_blockNumber", [(); 0]).await?;
        parse_quantity(&quantity)
    }

    /// `eth_call` against the latest block.
    pub async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RpcError> {
        self.request("eth_call", (CallRequest { to, data }, "latest"))
            .await
    }

    /// `eth_getLogs`
    pub async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RpcLog>, RpcError> {
        self.request("eth_getLogs", [filter]).await
    }
}

/// Parse a `0x`-prefixed hex quantity.
pub fn parse_quantity(quantity: &str) -> Result<u64, RpcError> {
    let digits = quantity
        .strip_prefix("0x")
        .ok_or_else(|| RpcError::InvalidQuantity(quantity.to_string()))?;
    u64::from_str_radix(digits, 16).map_err(|_| RpcError::InvalidQuantity(quantity.to_string()))
}

fn serialize_quantity<S: serde::Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{value:#x}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert_eq!(parse_quantity("0x1b4").unwrap(), 436);
        assert!(parse_quantity("1b4").is_err());
        assert!(parse_quantity("0xzz").is_err());
    }

    #[test]
    fn test_log_filter_serialization() {
        let filter = LogFilter {
            address: crate::chain::FACTORY_ADDRESS,
            topics: vec![B256::ZERO],
            from_block: 16,
            to_block: 255,
        };
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json["fromBlock"], "0x10");
        assert_eq!(json["toBlock"], "0xff");
        assert_eq!(json["topics"].as_array().unwrap().len(), 1);
        assert!(
            json["address"]
                .as_str()
                .unwrap()
                .eq_ignore_ascii_case("0xc77e8005a3d6bd632999373da027acf6f478e696")
        );
    }

    #[test]
    fn test_rpc_log_deserialization() {
        let json = serde_json::json!({
            "address": "0xc77e8005a3d6bd632999373da027acf6f478e696",
            "topics": ["0x0000000000000000000000000000000000000000000000000000000000000001"],
            "data": "0x",
            "blockNumber": "0x2a",
            "transactionHash": null,
            "logIndex": "0x0",
            "removed": false
        });
        let log: RpcLog = serde_json::from_value(json).unwrap();
        assert_eq!(log.block_number(), Some(42));
        assert!(log.data.is_empty());
        assert!(log.transaction_hash.is_none());
    }
}
