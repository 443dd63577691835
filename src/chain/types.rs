//! Ledger wire types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export NodeConfig from config module to avoid duplication
pub use crate::config::schema::NodeConfig;

/// Errors that can occur while talking to or preparing work for the ledger.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Transport failure after exhausting every configured node.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// The node answered with an error object. Authoritative; no failover.
    #[error("node rejected request: {0}")]
    Rejected(String),

    /// Local transaction assembly or signing failed.
    #[error("build error: {0}")]
    Build(String),

    /// Key material missing or malformed.
    #[error("key error: {0}")]
    Key(String),

    /// Chain configuration mismatch.
    #[error("chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: String, actual: String },
}

/// Result type for ledger operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// One contract call inside a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Contract account to call.
    pub contract: String,
    /// Entry point name.
    pub method: String,
    /// Call arguments, shaped per contract.
    #[serde(default)]
    pub args: serde_json::Value,
}

impl Operation {
    pub fn new(
        contract: impl Into<String>,
        method: impl Into<String>,
        args: serde_json::Value,
    ) -> Self {
        Self {
            contract: contract.into(),
            method: method.into(),
            args,
        }
    }
}

/// Transaction header: who pays, and how much credit may be consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionHeader {
    /// Chain the transaction is valid on.
    pub chain_id: String,
    /// Account whose resource credits are consumed.
    pub payer: String,
    /// Single-use account whose co-signature authorizes the spend.
    pub payee: String,
    /// Maximum resource credits this transaction may consume.
    pub rc_limit: u64,
    /// Random per-transaction value; makes the digest unique.
    pub nonce: u64,
}

/// A transaction with whatever signatures have been collected so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Hex digest of header plus operations.
    pub id: String,
    pub header: TransactionHeader,
    pub operations: Vec<Operation>,
    /// Hex signatures over the id digest, payee first, payer second.
    #[serde(default)]
    pub signatures: Vec<String>,
}

/// Node response to an accepted submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// Id of the accepted transaction.
    pub id: String,
    /// Account charged for execution.
    pub payer: String,
    /// Resource credits consumed at admission time.
    pub rc_used: u64,
    /// Execution log lines, if the node returns any.
    #[serde(default)]
    pub logs: Vec<String>,
}

/// Chain head summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadInfo {
    /// Height of the head block.
    pub height: u64,
    /// Id of the head block.
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ChainError::Rpc("all RPC nodes failed".to_string());
        assert_eq!(err.to_string(), "RPC error: all RPC nodes failed");

        let err = ChainError::ChainMismatch {
            expected: "relay-main".to_string(),
            actual: "relay-test".to_string(),
        };
        assert!(err.to_string().contains("relay-main"));
        assert!(err.to_string().contains("relay-test"));
    }

    #[test]
    fn test_default_node_config() {
        let config = NodeConfig::default();
        assert_eq!(config.rpc_timeout_secs, 10);
        assert!(config.failover_urls.is_empty());
    }

    #[test]
    fn test_operation_round_trips_through_json() {
        let op = Operation::new("pool-1", "collect", serde_json::json!({ "account": "alice" }));
        let encoded = serde_json::to_string(&op).unwrap();
        let decoded: Operation = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, op);
    }

    #[test]
    fn test_receipt_logs_default_to_empty() {
        let receipt: TransactionReceipt = serde_json::from_str(
            r#"{ "id": "abc", "payer": "payer-1", "rc_used": 7 }"#,
        )
        .unwrap();
        assert!(receipt.logs.is_empty());
    }
}
