//! Periodic pool sweeps that feed the transaction queue.
//!
//! # Responsibilities
//! - Poll each configured pool for an unsettled snapshot
//! - Queue one settlement batch per new snapshot
//! - Watch each batch's outcome and log how it ended
//!
//! # Design Decisions
//! - The pool list is re-read from the shared config on every sweep, so a
//!   reloaded config file takes effect without a restart. Watermarks are
//!   keyed by contract account and survive list edits.
//! - The watermark (`settled_until`) advances when the batch is *queued*,
//!   not when it confirms. The queue owns retries; re-pushing the same
//!   snapshot would only produce duplicate settlements. A batch that
//!   ultimately fails is surfaced in the logs and picked up again after a
//!   restart.
//! - Sweep errors back off exponentially with jitter so a struggling node
//!   is not hammered at the sweep interval.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use rand::Rng;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::chain::rpc::LedgerRpc;
use crate::chain::types::{ChainError, Operation};
use crate::config::RelayConfig;
use crate::observability::metrics;
use crate::queue::{BatchError, BatchHandle, BatchQueue};

use super::contract::PoolContract;

#[derive(Debug, Error)]
enum SweepError {
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Queue(#[from] BatchError),
}

/// Sweeps pools on an interval and queues settlement batches.
pub struct PoolScanner {
    rpc: Arc<dyn LedgerRpc>,
    queue: BatchQueue,
    config: Arc<ArcSwap<RelayConfig>>,
    /// Highest snapshot already queued per pool contract.
    settled_until: HashMap<String, u64>,
}

impl PoolScanner {
    pub fn new(
        rpc: Arc<dyn LedgerRpc>,
        queue: BatchQueue,
        config: Arc<ArcSwap<RelayConfig>>,
    ) -> Self {
        Self {
            rpc,
            queue,
            config,
            settled_until: HashMap::new(),
        }
    }

    /// Runs sweeps until shutdown is signalled. The sweep interval is
    /// fixed at startup; pool list and page size follow config reloads.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        let startup = self.config.load();
        let interval_secs = startup.scanner.sweep_interval_secs;
        info!(
            pools = startup.pools.len(),
            interval_secs,
            "pool scanner started"
        );
        drop(startup);

        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut consecutive_failures: u32 = 0;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let errored = self.sweep().await;
                    if errored == 0 {
                        consecutive_failures = 0;
                        continue;
                    }
                    consecutive_failures = consecutive_failures.saturating_add(1);
                    let (base_ms, max_ms) = {
                        let config = self.config.load();
                        (
                            config.scanner.error_backoff_base_ms,
                            config.scanner.error_backoff_max_ms,
                        )
                    };
                    let delay = error_backoff(consecutive_failures, base_ms, max_ms);
                    warn!(
                        errored,
                        attempt = consecutive_failures,
                        delay_ms = delay.as_millis() as u64,
                        "sweep had errors, backing off"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = shutdown.recv() => {
                            info!("pool scanner stopping");
                            return;
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!("pool scanner stopping");
                    return;
                }
            }
        }
    }

    /// Sweeps every configured pool once. Returns how many pools errored.
    pub async fn sweep(&mut self) -> usize {
        let config = self.config.load_full();
        let mut errored = 0;
        for pool_config in &config.pools {
            let pool = PoolContract::new(self.rpc.clone(), pool_config);
            match self
                .sweep_pool(&pool, config.scanner.accounts_page_size)
                .await
            {
                Ok(true) => metrics::record_sweep("queued"),
                Ok(false) => metrics::record_sweep("idle"),
                Err(e) => {
                    warn!(pool = %pool.label(), error = %e, "pool sweep failed");
                    metrics::record_sweep("error");
                    errored += 1;
                }
            }
        }
        errored
    }

    async fn sweep_pool(
        &mut self,
        pool: &PoolContract,
        page_size: u64,
    ) -> Result<bool, SweepError> {
        let snapshot = pool.next_snapshot().await?;
        let watermark = self
            .settled_until
            .get(pool.contract())
            .copied()
            .unwrap_or(0);
        if snapshot <= watermark {
            debug!(pool = %pool.label(), snapshot, watermark, "nothing to settle");
            return Ok(false);
        }

        let accounts = pool.pending_accounts(page_size).await?;
        let operations = settlement_batch(pool.contract(), &accounts);
        let handle = self
            .queue
            .push(format!("settle {}", pool.label()), operations)?;
        info!(
            pool = %pool.label(),
            snapshot,
            accounts = accounts.len(),
            batch = %handle.id(),
            "settlement batch queued"
        );

        self.settled_until
            .insert(pool.contract().to_string(), snapshot);
        tokio::spawn(watch_outcome(pool.label().to_string(), handle));
        Ok(true)
    }
}

/// Operations that settle one snapshot: distribute to beneficiaries,
/// advance the snapshot, then collect for every pending account.
fn settlement_batch(contract: &str, accounts: &[String]) -> Vec<Operation> {
    let mut operations = Vec::with_capacity(2 + accounts.len());
    operations.push(Operation::new(
        contract,
        "pay_beneficiaries",
        serde_json::json!({}),
    ));
    operations.push(Operation::new(
        contract,
        "reburn_and_snapshot",
        serde_json::json!({}),
    ));
    for account in accounts {
        operations.push(Operation::new(
            contract,
            "collect",
            serde_json::json!({ "account": account }),
        ));
    }
    operations
}

async fn watch_outcome(pool: String, handle: BatchHandle) {
    let batch = handle.id();
    match handle.wait().await {
        Ok(confirmation) => info!(
            pool = %pool,
            batch = %batch,
            transaction = %confirmation.transaction.id,
            block = %confirmation.block_id,
            height = confirmation.block_height,
            "settlement confirmed"
        ),
        Err(e) => warn!(pool = %pool, batch = %batch, error = %e, "settlement failed"),
    }
}

/// Exponential backoff with up to 10% jitter.
fn error_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential = 2u64.saturating_pow(attempt - 1);
    let capped = base_ms.saturating_mul(exponential).min(max_ms);
    let jitter_range = capped / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };
    Duration::from_millis(capped + jitter)
}
