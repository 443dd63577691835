//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the payout relay.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Ledger node endpoints and chain identity.
    pub node: NodeConfig,

    /// Transaction queue and retry settings.
    pub queue: QueueConfig,

    /// Settlement sweep settings.
    pub scanner: ScannerConfig,

    /// Pool contracts to settle.
    pub pools: Vec<PoolConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Ledger node configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Primary JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs, tried in order.
    #[serde(default)]
    pub failover_urls: Vec<String>,

    /// Chain identifier included in every transaction header.
    pub chain_id: String,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8080".to_string(),
            failover_urls: Vec::new(),
            chain_id: "relay-dev".to_string(),
            rpc_timeout_secs: 10,
        }
    }
}

/// Transaction queue configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct QueueConfig {
    /// How long an unconfirmed transaction waits before a rebroadcast,
    /// in milliseconds.
    pub confirmation_timeout_ms: u64,

    /// Scheduler tick period in milliseconds.
    pub tick_period_ms: u64,

    /// Default broadcast retry budget per batch.
    pub retries: u32,

    /// The sponsor's available resource credits are divided by this to
    /// obtain a transaction's credit limit.
    pub rc_limit_divisor: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout_ms: 30_000,
            tick_period_ms: 10_000,
            retries: 3,
            rc_limit_divisor: 10,
        }
    }
}

/// Settlement sweep configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Enable the periodic settlement sweep.
    pub enabled: bool,

    /// Sweep interval in seconds.
    pub sweep_interval_secs: u64,

    /// Page size for member-account listing.
    pub accounts_page_size: u64,

    /// Base delay after a failed sweep in milliseconds.
    pub error_backoff_base_ms: u64,

    /// Maximum delay after repeated failed sweeps in milliseconds.
    pub error_backoff_max_ms: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_interval_secs: 60,
            accounts_page_size: 500,
            error_backoff_base_ms: 500,
            error_backoff_max_ms: 60_000,
        }
    }
}

/// One pool contract to settle.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PoolConfig {
    /// On-chain contract account of the pool.
    pub contract: String,

    /// Human-readable name used in logs and batch summaries.
    #[serde(default)]
    pub label: String,
}

impl PoolConfig {
    /// The label, falling back to the contract account when unset.
    pub fn name(&self) -> &str {
        if self.label.is_empty() {
            &self.contract
        } else {
            &self.label
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
