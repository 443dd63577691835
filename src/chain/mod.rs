//! Ledger node integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (operator key)
//!     → keys.rs (key loading, address derivation, signing)
//!     → sponsor.rs (credit limit sizing, single-use payee)
//!     → builder.rs (assemble, digest, co-sign)
//!     → rpc.rs (JSON-RPC submit and confirmation queries, failover)
//! ```
//!
//! # Security Constraints
//! - Operator keys ONLY from environment variables
//! - Never log key material
//! - All RPC calls have configurable timeouts
//! - A node's error object is authoritative; transport faults fail over

pub mod builder;
pub mod keys;
pub mod rpc;
pub mod sponsor;
pub mod types;

pub use builder::TxBuilder;
pub use keys::Keypair;
pub use rpc::{LedgerRpc, RpcClient};
pub use types::{ChainError, ChainResult, Operation, Transaction, TransactionReceipt};
