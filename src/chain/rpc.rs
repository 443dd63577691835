//! JSON-RPC client for ledger nodes with automatic failover.
//!
//! # Responsibilities
//! - Issue JSON-RPC 2.0 calls over HTTP to the configured node
//! - Fail over to backup nodes on transport faults
//! - Expose typed accessors for the node methods the relay uses
//!
//! # Design Decisions
//! - Transport faults (connect errors, timeouts, non-2xx, unparseable
//!   bodies) advance to the next configured node. An error *object* in a
//!   JSON-RPC response is an authoritative answer from the ledger and is
//!   returned as [`ChainError::Rejected`] without failover.
//! - Requests carry monotonically increasing ids so node logs can be
//!   correlated with relay logs.
//!
//! # Data Flow
//! ```text
//! caller -> LedgerRpc method -> call()
//!   for each endpoint:
//!     POST request -> 2xx + result  => Ok(result)
//!                  -> error object  => Err(Rejected)   (no failover)
//!                  -> transport err => warn, next endpoint
//!   all endpoints exhausted => Err(Rpc)
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::types::{
    ChainError, ChainResult, HeadInfo, NodeConfig, Transaction, TransactionReceipt,
};

#[derive(Debug, Serialize)]
struct RpcRequest {
    jsonrpc: &'static str,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<serde_json::Value>,
    error: Option<RpcErrorObject>,
}

/// Read-side and submit-side access to the ledger.
///
/// The queue and scanner depend on this trait rather than on the concrete
/// HTTP client so tests can script node behavior.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Available resource credits for an account.
    async fn account_rc(&self, account: &str) -> ChainResult<u64>;

    /// Submits a signed transaction for inclusion.
    async fn submit_transaction(&self, transaction: &Transaction)
        -> ChainResult<TransactionReceipt>;

    /// Ids of blocks that contain the given transaction. Empty when the
    /// transaction has not been included anywhere the node knows of.
    async fn transaction_blocks(&self, transaction_id: &str) -> ChainResult<Vec<String>>;

    /// Heights for the given block ids, in the same order.
    async fn block_heights(&self, block_ids: &[String]) -> ChainResult<Vec<u64>>;

    /// Read-only contract call.
    async fn read_contract(
        &self,
        contract: &str,
        method: &str,
        args: serde_json::Value,
    ) -> ChainResult<serde_json::Value>;

    /// Current chain head.
    async fn head_info(&self) -> ChainResult<HeadInfo>;
}

/// HTTP JSON-RPC client over one primary and any number of failover nodes.
pub struct RpcClient {
    endpoints: Vec<url::Url>,
    http: reqwest::Client,
    request_id: AtomicU64,
}

impl RpcClient {
    /// Builds a client from node configuration. The primary URL is tried
    /// first on every call, then failovers in listed order.
    pub fn new(config: &NodeConfig) -> ChainResult<Self> {
        let mut endpoints = Vec::with_capacity(1 + config.failover_urls.len());
        for raw in std::iter::once(&config.rpc_url).chain(config.failover_urls.iter()) {
            let parsed = url::Url::parse(raw)
                .map_err(|e| ChainError::Rpc(format!("invalid RPC URL {}: {}", raw, e)))?;
            endpoints.push(parsed);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.rpc_timeout_secs))
            .build()
            .map_err(|e| ChainError::Rpc(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoints,
            http,
            request_id: AtomicU64::new(1),
        })
    }

    /// Issues one JSON-RPC call, failing over across nodes on transport
    /// faults. A JSON-RPC error object short-circuits as [`ChainError::Rejected`].
    pub async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> ChainResult<serde_json::Value> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            method: method.to_string(),
            params,
            id: self.request_id.fetch_add(1, Ordering::Relaxed),
        };

        let mut last_error = String::new();
        for endpoint in &self.endpoints {
            let response = match self.http.post(endpoint.clone()).json(&request).send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!(endpoint = %endpoint, method, error = %e, "RPC transport error, trying next node");
                    last_error = e.to_string();
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                warn!(endpoint = %endpoint, method, %status, "RPC node returned HTTP error, trying next node");
                last_error = format!("HTTP {}", status);
                continue;
            }

            let parsed: RpcResponse = match response.json().await {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(endpoint = %endpoint, method, error = %e, "unparseable RPC response, trying next node");
                    last_error = e.to_string();
                    continue;
                }
            };

            if let Some(error) = parsed.error {
                debug!(method, code = error.code, message = %error.message, "RPC call rejected by node");
                return Err(ChainError::Rejected(format!(
                    "{} (code {})",
                    error.message, error.code
                )));
            }

            match parsed.result {
                Some(result) => return Ok(result),
                None => {
                    warn!(endpoint = %endpoint, method, "RPC response had neither result nor error, trying next node");
                    last_error = "missing result".to_string();
                }
            }
        }

        Err(ChainError::Rpc(format!(
            "all RPC nodes failed for {}: {}",
            method, last_error
        )))
    }

    /// Confirms the node serves the chain this relay is configured for.
    pub async fn verify_chain_id(&self, expected: &str) -> ChainResult<()> {
        #[derive(Deserialize)]
        struct ChainIdResult {
            chain_id: String,
        }

        let value = self.call("chain.get_chain_id", serde_json::json!({})).await?;
        let parsed: ChainIdResult = serde_json::from_value(value)
            .map_err(|e| ChainError::Rpc(format!("malformed chain id response: {}", e)))?;

        if parsed.chain_id != expected {
            return Err(ChainError::ChainMismatch {
                expected: expected.to_string(),
                actual: parsed.chain_id,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

#[async_trait]
impl LedgerRpc for RpcClient {
    async fn account_rc(&self, account: &str) -> ChainResult<u64> {
        #[derive(Deserialize)]
        struct RcResult {
            rc: u64,
        }

        let value = self
            .call("chain.get_account_rc", serde_json::json!({ "account": account }))
            .await?;
        let parsed: RcResult = serde_json::from_value(value)
            .map_err(|e| ChainError::Rpc(format!("malformed rc response: {}", e)))?;
        Ok(parsed.rc)
    }

    async fn submit_transaction(
        &self,
        transaction: &Transaction,
    ) -> ChainResult<TransactionReceipt> {
        #[derive(Deserialize)]
        struct SubmitResult {
            receipt: TransactionReceipt,
        }

        let value = self
            .call(
                "chain.submit_transaction",
                serde_json::json!({ "transaction": transaction }),
            )
            .await?;
        let parsed: SubmitResult = serde_json::from_value(value)
            .map_err(|e| ChainError::Rpc(format!("malformed submit response: {}", e)))?;
        Ok(parsed.receipt)
    }

    async fn transaction_blocks(&self, transaction_id: &str) -> ChainResult<Vec<String>> {
        #[derive(Deserialize)]
        struct BlocksResult {
            containing_blocks: Vec<String>,
        }

        let value = self
            .call(
                "chain.get_transaction_blocks",
                serde_json::json!({ "transaction_id": transaction_id }),
            )
            .await?;
        let parsed: BlocksResult = serde_json::from_value(value)
            .map_err(|e| ChainError::Rpc(format!("malformed blocks response: {}", e)))?;
        Ok(parsed.containing_blocks)
    }

    async fn block_heights(&self, block_ids: &[String]) -> ChainResult<Vec<u64>> {
        #[derive(Deserialize)]
        struct HeightsResult {
            heights: Vec<u64>,
        }

        let value = self
            .call(
                "chain.get_block_heights",
                serde_json::json!({ "block_ids": block_ids }),
            )
            .await?;
        let parsed: HeightsResult = serde_json::from_value(value)
            .map_err(|e| ChainError::Rpc(format!("malformed heights response: {}", e)))?;
        Ok(parsed.heights)
    }

    async fn read_contract(
        &self,
        contract: &str,
        method: &str,
        args: serde_json::Value,
    ) -> ChainResult<serde_json::Value> {
        #[derive(Deserialize)]
        struct ReadResult {
            value: serde_json::Value,
        }

        let value = self
            .call(
                "chain.read_contract",
                serde_json::json!({ "contract": contract, "method": method, "args": args }),
            )
            .await?;
        let parsed: ReadResult = serde_json::from_value(value)
            .map_err(|e| ChainError::Rpc(format!("malformed read response: {}", e)))?;
        Ok(parsed.value)
    }

    async fn head_info(&self) -> ChainResult<HeadInfo> {
        let value = self.call("chain.get_head_info", serde_json::json!({})).await?;
        serde_json::from_value(value)
            .map_err(|e| ChainError::Rpc(format!("malformed head info response: {}", e)))
    }
}
