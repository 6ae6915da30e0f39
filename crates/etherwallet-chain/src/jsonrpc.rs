//! Ethereum JSON-RPC client over HTTP.
//!
//! # Error mapping
//!
//! | Failure                                   | Error                |
//! |-------------------------------------------|----------------------|
//! | connect failure, timeout, HTTP 5xx        | `NetworkError`       |
//! | body is not a JSON-RPC envelope           | `MalformedResponse`  |
//! | `result` missing or not a hex quantity    | `MalformedResponse`  |
//! | `error` object in the envelope            | `Rejected`           |

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use etherwallet_types::config::WalletConfig;
use etherwallet_types::{Address, EtherwalletError, Result, TxHash, U256};

use crate::client::ChainClient;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

// ---------------------------------------------------------------------------
// JsonRpcClient
// ---------------------------------------------------------------------------

/// [`ChainClient`] backed by a node's JSON-RPC HTTP endpoint.
#[derive(Debug)]
pub struct JsonRpcClient {
    url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    /// Creates a client for `url` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL is empty or the HTTP client
    /// cannot be constructed.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(EtherwalletError::ConfigError {
                reason: "rpc url must not be empty".into(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EtherwalletError::ConfigError {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            url,
            client,
            next_id: AtomicU64::new(1),
        })
    }

    /// Creates a client from the `rpc_url` and `request_timeout_secs`
    /// settings.
    pub fn from_config(config: &WalletConfig) -> Result<Self> {
        Self::new(config.rpc_url.clone(), config.request_timeout())
    }

    /// Endpoint this client posts to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Performs one JSON-RPC call and returns the `result` member.
    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        tracing::debug!(method, id, "json-rpc request");

        let resp = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(method, error = %e, "json-rpc transport failure");
                transport_error(method, &e)
            })?;

        let status = resp.status();
        if status.is_server_error() {
            tracing::warn!(method, status = status.as_u16(), "json-rpc server error");
            return Err(EtherwalletError::NetworkError {
                reason: format!("{method}: node returned HTTP {status}"),
            });
        }

        let body = resp.bytes().await.map_err(|e| transport_error(method, &e))?;

        let envelope: RpcResponse = serde_json::from_slice(&body).map_err(|e| {
            EtherwalletError::MalformedResponse {
                reason: format!("{method}: HTTP {status}, body is not JSON-RPC: {e}"),
            }
        })?;

        if let Some(err) = envelope.error {
            tracing::warn!(method, code = err.code, message = %err.message, "json-rpc error");
            return Err(EtherwalletError::Rejected {
                code: err.code,
                reason: err.message,
            });
        }

        match envelope.result {
            Some(Value::Null) | None => Err(EtherwalletError::MalformedResponse {
                reason: format!("{method}: response has no result"),
            }),
            Some(value) => Ok(value),
        }
    }

    async fn call_quantity(&self, method: &str, params: Value) -> Result<U256> {
        let value = self.call(method, params).await?;
        parse_quantity(method, &value)
    }
}

impl ChainClient for JsonRpcClient {
    async fn pending_nonce(&self, address: &Address) -> Result<u64> {
        let quantity = self
            .call_quantity(
                "eth_getTransactionCount",
                json!([address_param(address), "pending"]),
            )
            .await?;
        quantity_to_u64("eth_getTransactionCount", quantity)
    }

    async fn suggest_gas_price(&self) -> Result<U256> {
        self.call_quantity("eth_gasPrice", json!([])).await
    }

    async fn chain_id(&self) -> Result<u64> {
        let quantity = self.call_quantity("eth_chainId", json!([])).await?;
        quantity_to_u64("eth_chainId", quantity)
    }

    async fn balance_of(&self, address: &Address) -> Result<U256> {
        self.call_quantity("eth_getBalance", json!([address_param(address), "latest"]))
            .await
    }

    async fn broadcast(&self, signed_tx: &[u8]) -> Result<TxHash> {
        let raw = format!("0x{}", hex::encode(signed_tx));
        let value = self.call("eth_sendRawTransaction", json!([raw])).await?;

        let text = value.as_str().ok_or_else(|| EtherwalletError::MalformedResponse {
            reason: "eth_sendRawTransaction: result is not a string".into(),
        })?;
        let hash = TxHash::from_str(text).map_err(|e| EtherwalletError::MalformedResponse {
            reason: format!("eth_sendRawTransaction: bad transaction hash: {e}"),
        })?;

        tracing::info!(tx_hash = %hash, "transaction broadcast");
        Ok(hash)
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn transport_error(method: &str, err: &reqwest::Error) -> EtherwalletError {
    if err.is_builder() {
        return EtherwalletError::ConfigError {
            reason: format!("{method}: invalid request: {err}"),
        };
    }
    let kind = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "transport failure"
    };
    EtherwalletError::NetworkError {
        reason: format!("{method}: {kind}: {err}"),
    }
}

fn address_param(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_bytes()))
}

/// Parses a JSON-RPC hex quantity (`"0x1a"`).
///
/// Quantities must be `0x`-prefixed, non-empty, and at most 256 bits.
fn parse_quantity(method: &str, value: &Value) -> Result<U256> {
    let malformed = |detail: &str| EtherwalletError::MalformedResponse {
        reason: format!("{method}: {detail}"),
    };

    let text = value
        .as_str()
        .ok_or_else(|| malformed("quantity is not a string"))?;
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .ok_or_else(|| malformed("quantity lacks 0x prefix"))?;
    if digits.is_empty() {
        return Err(malformed("empty quantity"));
    }

    U256::from_str_radix(digits, 16).map_err(|e| malformed(&format!("bad quantity {text:?}: {e}")))
}

fn quantity_to_u64(method: &str, quantity: U256) -> Result<u64> {
    u64::try_from(quantity).map_err(|_| EtherwalletError::MalformedResponse {
        reason: format!("{method}: quantity {quantity} does not fit in u64"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quantity_accepts_hex() -> std::result::Result<(), EtherwalletError> {
        assert_eq!(parse_quantity("m", &json!("0x0"))?, U256::ZERO);
        assert_eq!(parse_quantity("m", &json!("0x1a"))?, U256::from(26u64));
        assert_eq!(parse_quantity("m", &json!("0XFF"))?, U256::from(255u64));
        Ok(())
    }

    #[test]
    fn parse_quantity_rejects_garbage() {
        for bad in [json!("1a"), json!("0x"), json!("0xzz"), json!(12), json!(null)] {
            assert!(matches!(
                parse_quantity("m", &bad),
                Err(EtherwalletError::MalformedResponse { .. })
            ));
        }
    }

    #[test]
    fn parse_quantity_rejects_overflow() {
        let too_big = format!("0x1{}", "0".repeat(64));
        assert!(parse_quantity("m", &json!(too_big)).is_err());
    }

    #[test]
    fn quantity_to_u64_bounds() {
        assert_eq!(quantity_to_u64("m", U256::from(u64::MAX)).ok(), Some(u64::MAX));
        assert!(quantity_to_u64("m", U256::from(u64::MAX) + U256::from(1u64)).is_err());
    }

    #[test]
    fn empty_url_rejected() {
        assert!(matches!(
            JsonRpcClient::new("  ", Duration::from_secs(1)),
            Err(EtherwalletError::ConfigError { .. })
        ));
    }
}
