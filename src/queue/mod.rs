//! Transaction lifecycle queue.
//!
//! # Data Flow
//! ```text
//! caller (scanner, CLI, library user)
//!     → scheduler.rs (BatchQueue::push → BatchHandle)
//!     → submit.rs    (build, sign, broadcast; budget on failure)
//!     → confirm.rs   (containing-block polls, policy.rs decisions)
//!     → handle.rs    (Confirmation or BatchError through oneshot)
//! ```
//!
//! Records are owned by exactly one task (the scheduler loop); everything
//! else interacts through channels.

pub mod confirm;
pub mod handle;
pub mod policy;
pub mod record;
pub mod scheduler;
pub mod submit;

pub use handle::{BatchError, BatchHandle, BatchResult, Confirmation};
pub use policy::{RetryDecision, RetryPolicy};
pub use scheduler::{BatchQueue, Scheduler};
