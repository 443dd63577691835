//! Process lifecycle: startup ordering lives in `main`, shutdown here.
//!
//! # Data Flow
//! ```text
//! OS signal (SIGINT/SIGTERM)
//!     → signals.rs (wait_for_signal)
//!     → shutdown.rs (Shutdown::trigger → broadcast)
//!     → scheduler / scanner / metrics loops exit
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
