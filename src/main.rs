//! Payout relay daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────┐
//!                    │                  PAYOUT RELAY                     │
//!                    │                                                   │
//!   relay.toml ──────┼─▶ config ──▶ validation ──▶ ArcSwap (reload)      │
//!                    │                                                   │
//!                    │  ┌─────────┐   ┌──────────┐   ┌───────────────┐  │
//!                    │  │  pool   │──▶│  queue   │──▶│    chain      │  │
//!                    │  │ scanner │   │scheduler │   │ build/sign/   │──┼──▶ Ledger
//!                    │  └─────────┘   │ confirm  │   │ submit (RPC)  │  │    Node
//!                    │                └────┬─────┘   └───────────────┘  │
//!                    │                     │ oneshot                     │
//!                    │                     ▼                             │
//!                    │                BatchHandle outcomes               │
//!                    │                                                   │
//!                    │  cross-cutting: tracing, metrics, shutdown        │
//!                    └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;
use clap::Parser;
use tracing::{error, info, warn};

use payout_relay::chain::builder::TxBuilder;
use payout_relay::chain::keys::Keypair;
use payout_relay::chain::rpc::{LedgerRpc, RpcClient};
use payout_relay::chain::types::ChainError;
use payout_relay::config::loader::load_config;
use payout_relay::config::watcher::ConfigWatcher;
use payout_relay::config::RelayConfig;
use payout_relay::lifecycle::{wait_for_signal, Shutdown};
use payout_relay::observability::{logging, metrics};
use payout_relay::pool::PoolScanner;
use payout_relay::queue::Scheduler;

#[derive(Parser, Debug)]
#[command(name = "payout-relay", version, about = "Payout pool settlement relay")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "relay.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    logging::init_logging(&config.observability);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        "payout-relay starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "failed to parse metrics address"
            ),
        }
    }

    let operator = Keypair::from_env()?;
    info!(operator = %operator.address(), "operator key loaded");

    let rpc = Arc::new(RpcClient::new(&config.node)?);
    match rpc.verify_chain_id(&config.node.chain_id).await {
        Ok(()) => info!(chain_id = %config.node.chain_id, "chain id verified"),
        Err(e @ ChainError::ChainMismatch { .. }) => return Err(e.into()),
        Err(e) => warn!(error = %e, "could not verify chain id, continuing"),
    }

    let builder = TxBuilder::new(
        rpc.clone() as Arc<dyn LedgerRpc>,
        operator,
        config.node.chain_id.clone(),
        config.queue.rc_limit_divisor,
    );
    let (queue, scheduler) = Scheduler::new(rpc.clone(), builder, &config.queue);

    let shutdown = Shutdown::new();
    let scheduler_task = tokio::spawn(scheduler.run(shutdown.subscribe()));

    let shared_config = Arc::new(ArcSwap::from_pointee(config.clone()));
    let scanner_task = if config.scanner.enabled {
        if config.pools.is_empty() {
            info!("scanner enabled but no pools configured");
            None
        } else {
            let scanner = PoolScanner::new(rpc.clone(), queue.clone(), shared_config.clone());
            Some(tokio::spawn(scanner.run(shutdown.subscribe())))
        }
    } else {
        info!("pool scanner disabled");
        None
    };

    // Hot reload: pool list and sweep tuning apply live, the rest needs a
    // restart.
    let (watcher, mut reload_rx) = ConfigWatcher::new(&args.config);
    let _watcher_guard = match watcher.run() {
        Ok(guard) => Some(guard),
        Err(e) => {
            warn!(error = %e, "config watcher unavailable, reload disabled");
            None
        }
    };
    let reload_config = shared_config.clone();
    tokio::spawn(async move {
        while let Some(new_config) = reload_rx.recv().await {
            apply_reload(&reload_config, new_config);
        }
    });

    wait_for_signal().await;
    shutdown.trigger();

    let _ = scheduler_task.await;
    if let Some(task) = scanner_task {
        let _ = task.await;
    }
    info!("shutdown complete");
    Ok(())
}

/// Stores a reloaded config and reports which changes take effect live.
fn apply_reload(shared: &ArcSwap<RelayConfig>, new_config: RelayConfig) {
    let current = shared.load();
    if new_config.node != current.node {
        warn!("node configuration changed, restart required to apply");
    }
    if new_config.queue != current.queue {
        warn!("queue configuration changed, restart required to apply");
    }
    if new_config.observability != current.observability {
        warn!("observability configuration changed, restart required to apply");
    }
    if new_config.scanner.enabled != current.scanner.enabled
        || new_config.scanner.sweep_interval_secs != current.scanner.sweep_interval_secs
    {
        warn!("scanner enablement and interval changes require a restart");
    }
    if new_config.pools != current.pools {
        info!(pools = new_config.pools.len(), "pool list updated");
    }
    drop(current);
    shared.store(Arc::new(new_config));
    info!("configuration reloaded");
}
