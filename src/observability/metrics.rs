//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define relay metrics (queue depth, broadcasts, confirmations, sweeps)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `relay_batches_total` (counter): batches admitted to the queue
//! - `relay_broadcasts_total{result}` (counter): submission attempts by outcome
//! - `relay_rebroadcasts_total` (counter): confirmation-timeout replays
//! - `relay_confirmations_total` (counter): batches confirmed on chain
//! - `relay_batches_failed_total` (counter): batches that exhausted retries
//! - `relay_sweeps_total{result}` (counter): per-pool settlement sweeps
//! - `relay_queue_depth` (gauge): records waiting or awaiting confirmation
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Helpers are no-ops until the exporter is installed, so library users
//!   and tests never have to set one up

use std::net::SocketAddr;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter and register metric descriptions.
///
/// Failure to bind the exporter is logged, not fatal; the relay keeps
/// running without a scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            describe_counter!("relay_batches_total", "Batches admitted to the queue");
            describe_counter!(
                "relay_broadcasts_total",
                "Transaction submission attempts by outcome"
            );
            describe_counter!(
                "relay_rebroadcasts_total",
                "Signed transactions replayed after a confirmation timeout"
            );
            describe_counter!("relay_confirmations_total", "Batches confirmed on chain");
            describe_counter!(
                "relay_batches_failed_total",
                "Batches that exhausted their retry budget"
            );
            describe_counter!("relay_sweeps_total", "Per-pool settlement sweeps by outcome");
            describe_gauge!(
                "relay_queue_depth",
                "Records waiting or awaiting confirmation"
            );
            tracing::info!(address = %addr, "Metrics endpoint started");
        }
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter");
        }
    }
}

pub fn record_batch_pushed() {
    counter!("relay_batches_total").increment(1);
}

pub fn record_broadcast(result: &'static str) {
    counter!("relay_broadcasts_total", "result" => result).increment(1);
}

pub fn record_rebroadcast() {
    counter!("relay_rebroadcasts_total").increment(1);
}

pub fn record_confirmation() {
    counter!("relay_confirmations_total").increment(1);
}

pub fn record_batch_failed() {
    counter!("relay_batches_failed_total").increment(1);
}

pub fn record_sweep(result: &'static str) {
    counter!("relay_sweeps_total", "result" => result).increment(1);
}

pub fn record_queue_depth(depth: usize) {
    gauge!("relay_queue_depth").set(depth as f64);
}
