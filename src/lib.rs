//! Payout relay library: queue ledger operation batches, sign and submit
//! the resulting transactions, and track them to confirmation.

pub mod chain;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod pool;
pub mod queue;

pub use config::RelayConfig;
pub use lifecycle::Shutdown;
pub use queue::{BatchHandle, BatchQueue, Scheduler};
