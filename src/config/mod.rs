//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//!
//! On reload signal:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of Arc<RelayConfig>
//!     → the pool scanner observes the new pool list
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Node and queue sections are not hot-swappable; changing them
//!   logs a restart-required warning

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use schema::NodeConfig;
pub use schema::PoolConfig;
pub use schema::QueueConfig;
pub use schema::RelayConfig;
pub use schema::ScannerConfig;
