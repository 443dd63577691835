//! Confirmation tracking for broadcast transactions.
//!
//! # Responsibilities
//! - Ask the node which blocks contain an in-flight transaction
//! - Resolve the containing block's height and settle the record
//! - Apply the retry policy when the transaction is still missing
//!
//! # Design Decisions
//! - Query failures are recorded in the error history but never charge
//!   the retry budget; only submission attempts spend retries. A record
//!   whose queries keep failing still ages toward the rebroadcast path.
//! - A transaction that is found but whose block height cannot be fetched
//!   yet is simply requeued. It is confirmed, never rebroadcast.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::chain::rpc::LedgerRpc;
use crate::observability::metrics;

use super::handle::Confirmation;
use super::policy::{RetryDecision, RetryPolicy};
use super::record::{Record, RecordState};
use super::submit::Submitter;

/// Polls for inclusion and drives the retry policy.
pub struct ConfirmationTracker {
    rpc: Arc<dyn LedgerRpc>,
    policy: RetryPolicy,
}

impl ConfirmationTracker {
    pub fn new(rpc: Arc<dyn LedgerRpc>, policy: RetryPolicy) -> Self {
        Self { rpc, policy }
    }

    /// One confirmation check for a record awaiting inclusion. Returns the
    /// record for requeueing or `None` once it has settled.
    pub async fn check(
        &self,
        mut record: Record,
        submitter: &Submitter,
        now: Instant,
    ) -> Option<Record> {
        let (transaction, receipt, sent_at) = match &record.state {
            RecordState::AwaitingConfirmation(submitted) => (
                submitted.transaction.clone(),
                submitted.receipt.clone(),
                submitted.sent_at,
            ),
            RecordState::New => return Some(record),
        };

        let blocks = match self.rpc.transaction_blocks(&transaction.id).await {
            Ok(blocks) => blocks,
            Err(e) => {
                debug!(transaction = %transaction.id, error = %e, "confirmation query failed");
                record.record_error(format!("confirmation query: {}", e));
                Vec::new()
            }
        };

        if let Some(block_id) = blocks.first() {
            let height = match self.rpc.block_heights(&blocks).await {
                Ok(heights) => heights.first().copied(),
                Err(e) => {
                    debug!(transaction = %transaction.id, error = %e, "block height query failed");
                    record.record_error(format!("confirmation query: {}", e));
                    None
                }
            };
            let Some(block_height) = height else {
                return Some(record);
            };

            info!(
                record = %record.id,
                label = %record.label,
                transaction = %transaction.id,
                block = %block_id,
                height = block_height,
                "transaction confirmed"
            );
            metrics::record_confirmation();
            record.complete_confirmed(Confirmation {
                transaction,
                receipt,
                block_id: block_id.clone(),
                block_height,
            });
            return None;
        }

        match self.policy.decide(now.duration_since(sent_at), record.retries_left) {
            RetryDecision::Wait => Some(record),
            RetryDecision::Rebroadcast => {
                record.charge_retry();
                info!(
                    record = %record.id,
                    transaction = %transaction.id,
                    retries_left = record.retries_left,
                    "confirmation window elapsed, rebroadcasting"
                );
                metrics::record_rebroadcast();
                submitter.rebroadcast(record, now).await
            }
            RetryDecision::GiveUp => {
                record.record_error(format!(
                    "transaction {} unconfirmed and retry budget exhausted",
                    transaction.id
                ));
                warn!(
                    record = %record.id,
                    label = %record.label,
                    transaction = %transaction.id,
                    errors = record.errors.len(),
                    "giving up on unconfirmed transaction"
                );
                metrics::record_batch_failed();
                record.complete_failed();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use uuid::Uuid;

    use super::*;
    use crate::chain::builder::TxBuilder;
    use crate::chain::keys::Keypair;
    use crate::chain::rpc::testing::{ScriptedLedger, StatusStep};
    use crate::chain::types::Operation;
    use crate::queue::handle::{BatchError, BatchHandle};

    const TIMEOUT: Duration = Duration::from_secs(30);

    fn fixtures(ledger: Arc<ScriptedLedger>) -> (Submitter, ConfirmationTracker) {
        let builder = TxBuilder::new(
            ledger.clone(),
            Keypair::generate(),
            "relay-test".to_string(),
            10,
        );
        let submitter = Submitter::new(ledger.clone(), builder);
        let tracker = ConfirmationTracker::new(ledger, RetryPolicy::new(TIMEOUT));
        (submitter, tracker)
    }

    async fn broadcast_record(
        submitter: &Submitter,
        retries: u32,
        sent: Instant,
    ) -> (Record, BatchHandle) {
        let id = Uuid::new_v4();
        let (handle, tx) = BatchHandle::new(id);
        let operations = vec![Operation::new("pool-1", "collect", serde_json::Value::Null)];
        let record = Record::new(id, "collect pool-1".to_string(), operations, retries, tx);
        let record = submitter.broadcast_new(record, sent).await.unwrap();
        (record, handle)
    }

    #[tokio::test]
    async fn test_found_transaction_settles_with_block_info() {
        let ledger = Arc::new(ScriptedLedger::new());
        let (submitter, tracker) = fixtures(ledger.clone());
        let sent = Instant::now();
        let (record, handle) = broadcast_record(&submitter, 3, sent).await;

        ledger.plan_status(StatusStep::Found(vec!["block-7".to_string()]));
        ledger.set_height("block-7", 70);

        assert!(tracker.check(record, &submitter, sent).await.is_none());
        let confirmation = handle.wait().await.unwrap();
        assert_eq!(confirmation.block_id, "block-7");
        assert_eq!(confirmation.block_height, 70);
        assert!(!confirmation.transaction.id.is_empty());
        assert_eq!(confirmation.receipt.id, confirmation.transaction.id);
    }

    #[tokio::test]
    async fn test_missing_transaction_waits_inside_window() {
        let ledger = Arc::new(ScriptedLedger::new());
        let (submitter, tracker) = fixtures(ledger.clone());
        let sent = Instant::now();
        let (record, _handle) = broadcast_record(&submitter, 3, sent).await;

        let record = tracker
            .check(record, &submitter, sent + Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(record.retries_left, 3);
        assert_eq!(ledger.submission_count(), 1);
    }

    #[tokio::test]
    async fn test_query_failure_is_logged_not_charged() {
        let ledger = Arc::new(ScriptedLedger::new());
        let (submitter, tracker) = fixtures(ledger.clone());
        let sent = Instant::now();
        let (record, _handle) = broadcast_record(&submitter, 3, sent).await;

        ledger.plan_status(StatusStep::Fail("node restarting".to_string()));
        let record = tracker
            .check(record, &submitter, sent + Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(record.retries_left, 3);
        assert_eq!(record.errors.len(), 1);
        assert!(record.errors[0].starts_with("confirmation query:"));
    }

    #[tokio::test]
    async fn test_timeout_triggers_rebroadcast_and_charges_once() {
        let ledger = Arc::new(ScriptedLedger::new());
        let (submitter, tracker) = fixtures(ledger.clone());
        let sent = Instant::now();
        let (record, _handle) = broadcast_record(&submitter, 3, sent).await;

        let record = tracker
            .check(record, &submitter, sent + TIMEOUT)
            .await
            .unwrap();
        assert_eq!(record.retries_left, 2);
        assert_eq!(ledger.submission_count(), 2);
    }

    #[tokio::test]
    async fn test_timed_out_failed_rebroadcast_costs_two() {
        let ledger = Arc::new(ScriptedLedger::new());
        let (submitter, tracker) = fixtures(ledger.clone());
        let sent = Instant::now();
        let (record, _handle) = broadcast_record(&submitter, 3, sent).await;

        ledger.plan_submit(Err("node down".to_string()));
        let record = tracker
            .check(record, &submitter, sent + TIMEOUT)
            .await
            .unwrap();
        assert_eq!(record.retries_left, 1);
        assert_eq!(record.errors.len(), 1);
        // The old sent_at survives, so the next check retries immediately.
        match &record.state {
            RecordState::AwaitingConfirmation(submitted) => assert_eq!(submitted.sent_at, sent),
            other => panic!("expected AwaitingConfirmation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exhausted_budget_gives_up_with_history() {
        let ledger = Arc::new(ScriptedLedger::new());
        let (submitter, tracker) = fixtures(ledger.clone());
        let sent = Instant::now();
        let (mut record, handle) = broadcast_record(&submitter, 1, sent).await;
        record.retries_left = 0;

        assert!(tracker
            .check(record, &submitter, sent + TIMEOUT)
            .await
            .is_none());
        match handle.wait().await {
            Err(BatchError::Exhausted {
                transaction,
                errors,
                ..
            }) => {
                // The broadcast transaction rides along for diagnosis.
                assert!(transaction.is_some());
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("unconfirmed"));
            }
            other => panic!("expected Exhausted, got {:?}", other),
        }
        // No rebroadcast was attempted.
        assert_eq!(ledger.submission_count(), 1);
    }

    #[tokio::test]
    async fn test_found_transaction_is_never_rebroadcast() {
        let ledger = Arc::new(ScriptedLedger::new());
        let (submitter, tracker) = fixtures(ledger.clone());
        let sent = Instant::now();
        let (record, _handle) = broadcast_record(&submitter, 3, sent).await;

        // Block is known but its height is not resolvable yet.
        ledger.plan_status(StatusStep::Found(vec!["block-9".to_string()]));
        let record = tracker
            .check(record, &submitter, sent + TIMEOUT)
            .await
            .unwrap();
        assert_eq!(record.retries_left, 3);
        assert_eq!(ledger.submission_count(), 1);
        assert!(matches!(record.state, RecordState::AwaitingConfirmation(_)));
    }
}
