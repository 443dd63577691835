//! Typed read access to a payout pool contract.

use std::sync::Arc;

use crate::chain::rpc::LedgerRpc;
use crate::chain::types::{ChainError, ChainResult};
use crate::config::PoolConfig;

/// One configured pool, addressed by its contract account.
pub struct PoolContract {
    rpc: Arc<dyn LedgerRpc>,
    contract: String,
    label: String,
}

impl PoolContract {
    pub fn new(rpc: Arc<dyn LedgerRpc>, config: &PoolConfig) -> Self {
        Self {
            rpc,
            contract: config.contract.clone(),
            label: config.name().to_string(),
        }
    }

    /// Contract account this pool lives at.
    pub fn contract(&self) -> &str {
        &self.contract
    }

    /// Human-readable name for logs.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Snapshot height the next settlement run would process.
    pub async fn next_snapshot(&self) -> ChainResult<u64> {
        let value = self
            .rpc
            .read_contract(&self.contract, "next_snapshot", serde_json::json!({}))
            .await?;
        serde_json::from_value(value).map_err(|e| {
            ChainError::Rpc(format!("malformed next_snapshot from {}: {}", self.contract, e))
        })
    }

    /// Accounts with uncollected balances, up to `limit`.
    pub async fn pending_accounts(&self, limit: u64) -> ChainResult<Vec<String>> {
        let value = self
            .rpc
            .read_contract(
                &self.contract,
                "pending_accounts",
                serde_json::json!({ "limit": limit }),
            )
            .await?;
        serde_json::from_value(value).map_err(|e| {
            ChainError::Rpc(format!(
                "malformed pending_accounts from {}: {}",
                self.contract, e
            ))
        })
    }
}

impl std::fmt::Debug for PoolContract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolContract")
            .field("contract", &self.contract)
            .field("label", &self.label)
            .finish()
    }
}
