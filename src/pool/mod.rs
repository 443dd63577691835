//! Payout pool settlement.
//!
//! # Data Flow
//! ```text
//! ScannerConfig (interval, page size)
//!     → scanner.rs (sweep loop, snapshot watermarks, backoff)
//!     → contract.rs (next_snapshot / pending_accounts reads)
//!     → queue::BatchQueue (one settlement batch per new snapshot)
//! ```

pub mod contract;
pub mod scanner;

pub use contract::PoolContract;
pub use scanner::PoolScanner;
