//! Awaitable results for queued batches.
//!
//! Every accepted batch hands the caller a [`BatchHandle`]. The scheduler
//! later pushes exactly one terminal outcome through the paired channel:
//! a [`Confirmation`] once the transaction lands in a block, or a
//! [`BatchError`] when the retry budget runs out or the relay stops.

use thiserror::Error;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::chain::types::{Transaction, TransactionReceipt};

/// Proof that a batch's transaction was included in a block.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    /// The signed transaction that was confirmed.
    pub transaction: Transaction,
    /// Receipt from the submission that was ultimately confirmed.
    pub receipt: TransactionReceipt,
    /// Block the transaction was found in.
    pub block_id: String,
    /// Height of that block.
    pub block_height: u64,
}

/// Terminal failure outcomes for a batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BatchError {
    #[error("batch contains no operations")]
    EmptyBatch,

    #[error("queue is not accepting work")]
    QueueClosed,

    /// The retry budget ran out. Carries every error collected along the
    /// way, oldest first, plus whatever transaction and receipt the last
    /// accepted broadcast produced.
    #[error("retry budget exhausted: {}", errors.join("; "))]
    Exhausted {
        transaction: Option<Transaction>,
        receipt: Option<TransactionReceipt>,
        errors: Vec<String>,
    },

    #[error("relay shut down before the batch settled")]
    Shutdown,
}

/// Outcome delivered through a batch's completion channel.
pub type BatchResult = Result<Confirmation, BatchError>;

/// Caller-side view of a queued batch.
#[derive(Debug)]
pub struct BatchHandle {
    id: Uuid,
    rx: oneshot::Receiver<BatchResult>,
}

impl BatchHandle {
    /// Creates a handle and the sender the queue record completes it with.
    pub(crate) fn new(id: Uuid) -> (Self, oneshot::Sender<BatchResult>) {
        let (tx, rx) = oneshot::channel();
        (Self { id, rx }, tx)
    }

    /// Queue-assigned id of the batch, for log correlation.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Waits for the batch to settle. A dropped queue resolves as
    /// [`BatchError::Shutdown`].
    pub async fn wait(self) -> BatchResult {
        self.rx.await.unwrap_or(Err(BatchError::Shutdown))
    }
}
