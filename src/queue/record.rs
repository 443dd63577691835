//! In-queue batch records and their lifecycle state.
//!
//! # Design Decisions
//! - State is a tagged enum. A record is either brand new or awaiting
//!   confirmation of a specific signed transaction; terminal outcomes
//!   leave the queue entirely through the completion channel, so no
//!   "done" state exists here.
//! - The signed transaction is held verbatim while awaiting confirmation
//!   so a rebroadcast replays exactly the bytes the node first accepted.
//! - `retries_left` is a shared budget across every kind of attempt the
//!   record makes. It only decreases.

use std::time::Instant;

use tokio::sync::oneshot;
use tracing::debug;
use uuid::Uuid;

use crate::chain::types::{Operation, Transaction, TransactionReceipt};

use super::handle::{BatchError, BatchResult, Confirmation};

/// A transaction that has been accepted by a node and is now being
/// watched for inclusion in a block.
#[derive(Debug)]
pub struct Submitted {
    /// The exact signed transaction, replayed as-is on rebroadcast.
    pub transaction: Transaction,
    /// Receipt from the most recent accepted submission.
    pub receipt: TransactionReceipt,
    /// When the most recent accepted submission happened.
    pub sent_at: Instant,
}

/// Where a record is in its lifecycle.
#[derive(Debug)]
pub enum RecordState {
    /// Not yet broadcast. The next attempt builds and signs from scratch.
    New,
    /// Broadcast accepted; polling for a containing block.
    AwaitingConfirmation(Submitted),
}

/// One queued batch working its way toward confirmation.
#[derive(Debug)]
pub struct Record {
    pub id: Uuid,
    /// Caller-supplied name for log lines. Never drives behavior.
    pub label: String,
    pub operations: Vec<Operation>,
    pub state: RecordState,
    /// Remaining shared retry budget.
    pub retries_left: u32,
    /// Every error observed so far, oldest first. Kept even when the
    /// record eventually confirms.
    pub errors: Vec<String>,
    completion: Option<oneshot::Sender<BatchResult>>,
}

impl Record {
    pub fn new(
        id: Uuid,
        label: String,
        operations: Vec<Operation>,
        retries: u32,
        completion: oneshot::Sender<BatchResult>,
    ) -> Self {
        Self {
            id,
            label,
            operations,
            state: RecordState::New,
            retries_left: retries,
            errors: Vec::new(),
            completion: Some(completion),
        }
    }

    pub fn record_error(&mut self, error: String) {
        self.errors.push(error);
    }

    /// Spends one retry. Saturates at zero.
    pub fn charge_retry(&mut self) {
        self.retries_left = self.retries_left.saturating_sub(1);
    }

    /// Delivers the confirmed outcome. A dropped receiver is logged and
    /// otherwise ignored.
    pub fn complete_confirmed(&mut self, confirmation: Confirmation) {
        if let Some(tx) = self.completion.take() {
            if tx.send(Ok(confirmation)).is_err() {
                debug!(record = %self.id, "confirmation had no receiver");
            }
        }
    }

    /// Delivers the exhausted-budget outcome with the full error history
    /// and whatever transaction made it onto the wire.
    pub fn complete_failed(&mut self) {
        if let Some(tx) = self.completion.take() {
            let (transaction, receipt) = match &self.state {
                RecordState::AwaitingConfirmation(submitted) => (
                    Some(submitted.transaction.clone()),
                    Some(submitted.receipt.clone()),
                ),
                RecordState::New => (None, None),
            };
            let outcome = Err(BatchError::Exhausted {
                transaction,
                receipt,
                errors: self.errors.clone(),
            });
            if tx.send(outcome).is_err() {
                debug!(record = %self.id, "failure had no receiver");
            }
        }
    }
}
