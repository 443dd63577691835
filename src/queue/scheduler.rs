//! Queue intake and the single-mutator scheduler loop.
//!
//! # Responsibilities
//! - Accept batches from callers and hand back awaitable handles
//! - Drive every queued record through broadcast, confirmation, and retry
//! - Drain cleanly on shutdown so no handle waits forever
//!
//! # Design Decisions
//! - The scheduler is the only task that ever touches records. Callers
//!   push through an unbounded channel; the loop drains that inbox at the
//!   start of each tick and then processes exactly one record, requeueing
//!   it at the back unless it settled. Slow node calls therefore delay
//!   later records instead of racing them.
//! - Time is read through an injectable clock so tests can script
//!   confirmation windows without sleeping.
//!
//! # Data Flow
//! ```text
//! BatchQueue::push -> inbox -> records (VecDeque)
//!   tick: pop front -> New?                 -> Submitter::broadcast_new
//!                   -> AwaitingConfirmation -> ConfirmationTracker::check
//!         Some(record) -> push back, None -> settled via handle
//! ```

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::chain::builder::TxBuilder;
use crate::chain::rpc::LedgerRpc;
use crate::chain::types::Operation;
use crate::config::QueueConfig;
use crate::observability::metrics;

use super::confirm::ConfirmationTracker;
use super::handle::{BatchError, BatchHandle};
use super::policy::RetryPolicy;
use super::record::{Record, RecordState};
use super::submit::Submitter;

/// Caller-facing intake for operation batches. Cheap to clone.
#[derive(Clone)]
pub struct BatchQueue {
    inbox: mpsc::UnboundedSender<Record>,
    retries: u32,
}

impl BatchQueue {
    /// Queues a batch of operations as a single future transaction, with
    /// the configured default retry budget. The label is carried for log
    /// lines only.
    ///
    /// Rejects empty batches and fails once the scheduler has stopped.
    pub fn push(
        &self,
        label: impl Into<String>,
        operations: Vec<Operation>,
    ) -> Result<BatchHandle, BatchError> {
        self.push_with_retries(label, operations, self.retries)
    }

    /// Like [`push`](Self::push) but with an explicit retry budget for
    /// this batch alone.
    pub fn push_with_retries(
        &self,
        label: impl Into<String>,
        operations: Vec<Operation>,
        retries: u32,
    ) -> Result<BatchHandle, BatchError> {
        if operations.is_empty() {
            return Err(BatchError::EmptyBatch);
        }

        let id = Uuid::new_v4();
        let (handle, completion) = BatchHandle::new(id);
        let record = Record::new(id, label.into(), operations, retries, completion);
        self.inbox.send(record).map_err(|_| BatchError::QueueClosed)?;
        metrics::record_batch_pushed();
        Ok(handle)
    }
}

/// Owns the record queue and processes it one record per tick.
pub struct Scheduler {
    inbox: mpsc::UnboundedReceiver<Record>,
    records: VecDeque<Record>,
    submitter: Submitter,
    tracker: ConfirmationTracker,
    tick_period: Duration,
    clock: Box<dyn Fn() -> Instant + Send + Sync>,
}

impl Scheduler {
    /// Wires a queue and its scheduler from configuration.
    pub fn new(
        rpc: Arc<dyn LedgerRpc>,
        builder: TxBuilder,
        config: &QueueConfig,
    ) -> (BatchQueue, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let queue = BatchQueue {
            inbox: tx,
            retries: config.retries,
        };
        let scheduler = Self {
            inbox: rx,
            records: VecDeque::new(),
            submitter: Submitter::new(rpc.clone(), builder),
            tracker: ConfirmationTracker::new(
                rpc,
                RetryPolicy::new(Duration::from_millis(config.confirmation_timeout_ms)),
            ),
            tick_period: Duration::from_millis(config.tick_period_ms),
            clock: Box::new(Instant::now),
        };
        (queue, scheduler)
    }

    /// Replaces the wall clock, for tests that script time.
    pub fn with_clock(mut self, clock: Box<dyn Fn() -> Instant + Send + Sync>) -> Self {
        self.clock = clock;
        self
    }

    /// Records currently queued, excluding unread inbox entries.
    pub fn depth(&self) -> usize {
        self.records.len()
    }

    /// Runs the scheduler until shutdown is signalled.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            tick_ms = self.tick_period.as_millis() as u64,
            "queue scheduler started"
        );
        let mut ticker = tokio::time::interval(self.tick_period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                _ = shutdown.recv() => {
                    info!("queue scheduler stopping");
                    self.drain();
                    break;
                }
            }
        }
    }

    /// One scheduling step: absorb new pushes, then process the front
    /// record.
    pub async fn tick(&mut self) {
        self.drain_inbox();

        let Some(record) = self.records.pop_front() else {
            metrics::record_queue_depth(0);
            return;
        };

        let now = (self.clock)();
        let processed = if matches!(record.state, RecordState::New) {
            self.submitter.broadcast_new(record, now).await
        } else {
            self.tracker.check(record, &self.submitter, now).await
        };
        if let Some(record) = processed {
            self.records.push_back(record);
        }
        metrics::record_queue_depth(self.records.len());
    }

    fn drain_inbox(&mut self) {
        while let Ok(record) = self.inbox.try_recv() {
            self.records.push_back(record);
        }
    }

    /// Drops every unsettled record. Their handles resolve as shutdown.
    fn drain(&mut self) {
        self.drain_inbox();
        self.inbox.close();
        if !self.records.is_empty() {
            warn!(
                pending = self.records.len(),
                "dropping unsettled records on shutdown"
            );
        }
        self.records.clear();
        metrics::record_queue_depth(0);
    }
}
