//! Broadcast steps: first submission and rebroadcast.
//!
//! # Responsibilities
//! - Build, sign, and submit brand-new records
//! - Replay the held transaction verbatim when the tracker asks for it
//! - Charge the retry budget for every failed network attempt
//!
//! # Design Decisions
//! - A failed first broadcast leaves the record in [`RecordState::New`],
//!   so the next attempt rebuilds from scratch with a fresh delegation,
//!   payee, and nonce. Only accepted transactions are ever replayed.
//! - A failed rebroadcast keeps the old `sent_at`, so the record is still
//!   past its confirmation window on the next tick and retries promptly.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::chain::builder::TxBuilder;
use crate::chain::rpc::LedgerRpc;
use crate::observability::metrics;

use super::record::{Record, RecordState, Submitted};

/// Performs all node-facing submission work for the scheduler.
pub struct Submitter {
    rpc: Arc<dyn LedgerRpc>,
    builder: TxBuilder,
}

impl Submitter {
    pub fn new(rpc: Arc<dyn LedgerRpc>, builder: TxBuilder) -> Self {
        Self { rpc, builder }
    }

    /// First-time broadcast of a record. Returns the record for requeueing
    /// or `None` once it has reached a terminal outcome.
    pub async fn broadcast_new(&self, mut record: Record, now: Instant) -> Option<Record> {
        if record.retries_left == 0 {
            warn!(record = %record.id, "no retry budget left, failing without broadcast");
            metrics::record_batch_failed();
            record.complete_failed();
            return None;
        }

        let transaction = match self.builder.build_signed(record.operations.clone()).await {
            Ok(transaction) => transaction,
            Err(e) => {
                warn!(record = %record.id, error = %e, "transaction build failed");
                metrics::record_broadcast("error");
                return fail_attempt(record, format!("build: {}", e));
            }
        };

        match self.rpc.submit_transaction(&transaction).await {
            Ok(receipt) => {
                info!(
                    record = %record.id,
                    label = %record.label,
                    transaction = %transaction.id,
                    rc_used = receipt.rc_used,
                    "transaction broadcast"
                );
                metrics::record_broadcast("ok");
                record.state = RecordState::AwaitingConfirmation(Submitted {
                    transaction,
                    receipt,
                    sent_at: now,
                });
                Some(record)
            }
            Err(e) => {
                warn!(record = %record.id, transaction = %transaction.id, error = %e, "broadcast failed");
                metrics::record_broadcast("error");
                fail_attempt(record, format!("submit: {}", e))
            }
        }
    }

    /// Replays an already-signed transaction. The caller has charged the
    /// rebroadcast itself; a failed replay costs one more retry.
    pub async fn rebroadcast(&self, mut record: Record, now: Instant) -> Option<Record> {
        let replay = match &record.state {
            RecordState::AwaitingConfirmation(submitted) => submitted.transaction.clone(),
            RecordState::New => return Some(record),
        };

        match self.rpc.submit_transaction(&replay).await {
            Ok(receipt) => {
                debug!(record = %record.id, transaction = %replay.id, "rebroadcast accepted");
                if let RecordState::AwaitingConfirmation(submitted) = &mut record.state {
                    submitted.receipt = receipt;
                    submitted.sent_at = now;
                }
                Some(record)
            }
            Err(e) => {
                warn!(record = %record.id, transaction = %replay.id, error = %e, "rebroadcast failed");
                fail_attempt(record, format!("rebroadcast: {}", e))
            }
        }
    }
}

/// Books one failed attempt: append the error, spend a retry, and fail
/// the record if the budget just ran out.
fn fail_attempt(mut record: Record, error: String) -> Option<Record> {
    record.record_error(error);
    record.charge_retry();
    if record.retries_left == 0 {
        warn!(
            record = %record.id,
            label = %record.label,
            attempts = record.errors.len(),
            "retry budget exhausted"
        );
        metrics::record_batch_failed();
        record.complete_failed();
        None
    } else {
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use uuid::Uuid;

    use super::*;
    use crate::chain::keys::Keypair;
    use crate::chain::rpc::testing::ScriptedLedger;
    use crate::chain::types::Operation;
    use crate::queue::handle::{BatchError, BatchHandle};

    fn submitter_with(ledger: Arc<ScriptedLedger>) -> Submitter {
        let builder = TxBuilder::new(
            ledger.clone(),
            Keypair::generate(),
            "relay-test".to_string(),
            10,
        );
        Submitter::new(ledger, builder)
    }

    fn new_record(retries: u32) -> (Record, BatchHandle) {
        let id = Uuid::new_v4();
        let (handle, tx) = BatchHandle::new(id);
        let operations = vec![Operation::new("pool-1", "collect", serde_json::Value::Null)];
        let record = Record::new(id, "collect pool-1".to_string(), operations, retries, tx);
        (record, handle)
    }

    #[tokio::test]
    async fn test_successful_broadcast_keeps_budget() {
        let ledger = Arc::new(ScriptedLedger::new());
        let submitter = submitter_with(ledger.clone());
        let (record, _handle) = new_record(3);

        let record = submitter.broadcast_new(record, Instant::now()).await.unwrap();
        assert_eq!(record.retries_left, 3);
        assert!(matches!(record.state, RecordState::AwaitingConfirmation(_)));
        assert_eq!(ledger.submission_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_broadcast_charges_and_stays_new() {
        let ledger = Arc::new(ScriptedLedger::new());
        ledger.plan_submit(Err("insufficient rc".to_string()));
        let submitter = submitter_with(ledger.clone());
        let (record, _handle) = new_record(3);

        let record = submitter.broadcast_new(record, Instant::now()).await.unwrap();
        assert_eq!(record.retries_left, 2);
        assert!(matches!(record.state, RecordState::New));
        assert_eq!(record.errors.len(), 1);
        assert!(record.errors[0].starts_with("submit:"));
    }

    #[tokio::test]
    async fn test_zero_budget_fails_without_touching_node() {
        let ledger = Arc::new(ScriptedLedger::new());
        let submitter = submitter_with(ledger.clone());
        let (record, handle) = new_record(0);

        assert!(submitter.broadcast_new(record, Instant::now()).await.is_none());
        assert_eq!(ledger.submission_count(), 0);
        assert!(matches!(
            handle.wait().await,
            Err(BatchError::Exhausted { .. })
        ));
    }

    #[tokio::test]
    async fn test_last_failure_reports_full_history() {
        let ledger = Arc::new(ScriptedLedger::new());
        ledger.plan_submit(Err("node down".to_string()));
        let submitter = submitter_with(ledger.clone());
        let (mut record, handle) = new_record(1);
        record.record_error("submit: node down".to_string());

        assert!(submitter.broadcast_new(record, Instant::now()).await.is_none());
        match handle.wait().await {
            Err(BatchError::Exhausted { errors, .. }) => assert_eq!(errors.len(), 2),
            other => panic!("expected Exhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rebroadcast_replays_exact_transaction() {
        let ledger = Arc::new(ScriptedLedger::new());
        let submitter = submitter_with(ledger.clone());
        let (record, _handle) = new_record(3);

        let sent = Instant::now();
        let record = submitter.broadcast_new(record, sent).await.unwrap();
        let record = submitter.rebroadcast(record, Instant::now()).await.unwrap();

        let submissions = ledger.submissions.lock().unwrap();
        assert_eq!(submissions.len(), 2);
        assert_eq!(submissions[0], submissions[1]);
        drop(submissions);

        match &record.state {
            RecordState::AwaitingConfirmation(submitted) => assert!(submitted.sent_at > sent),
            other => panic!("expected AwaitingConfirmation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_rebroadcast_keeps_old_sent_at() {
        let ledger = Arc::new(ScriptedLedger::new());
        let submitter = submitter_with(ledger.clone());
        let (record, _handle) = new_record(3);

        let sent = Instant::now();
        let record = submitter.broadcast_new(record, sent).await.unwrap();

        ledger.plan_submit(Err("node down".to_string()));
        let record = submitter.rebroadcast(record, Instant::now()).await.unwrap();
        assert_eq!(record.retries_left, 2);
        match &record.state {
            RecordState::AwaitingConfirmation(submitted) => assert_eq!(submitted.sent_at, sent),
            other => panic!("expected AwaitingConfirmation, got {:?}", other),
        }
    }
}
