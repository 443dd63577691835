//! Retry policy for unconfirmed transactions.
//!
//! The policy is a pure function of how long a transaction has been
//! unconfirmed and how much retry budget its record has left. It never
//! performs I/O and never mutates the record; the scheduler acts on the
//! decision.

use std::time::Duration;

/// What to do with a transaction that is still unconfirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Still within the confirmation window. Check again next tick.
    Wait,
    /// Timed out with budget remaining. Replay the held transaction.
    Rebroadcast,
    /// Timed out with no budget left. Fail the record.
    GiveUp,
}

/// Decides between waiting, rebroadcasting, and giving up.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    timeout: Duration,
}

impl RetryPolicy {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn decide(&self, unconfirmed_for: Duration, retries_left: u32) -> RetryDecision {
        if unconfirmed_for < self.timeout {
            RetryDecision::Wait
        } else if retries_left == 0 {
            RetryDecision::GiveUp
        } else {
            RetryDecision::Rebroadcast
        }
    }
}
