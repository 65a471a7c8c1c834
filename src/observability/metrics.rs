//! Metrics collection and exposition.
//!
//! # Metrics
//! - `url_map_dispatch_total` (counter): dispatches by `mount` (prefix, or `fallback`)
//! - `url_map_terminate_total` (counter): termination rounds
//! - `url_map_table_size` (gauge): mounts in the current prefix table
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Prometheus exporter is optional and owned by the embedding binary

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Label value used when no prefix matched.
pub const FALLBACK_MOUNT: &str = "fallback";

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_dispatch(mount: &str) {
    counter!("url_map_dispatch_total", "mount" => mount.to_string()).increment(1);
}

pub fn record_terminate() {
    counter!("url_map_terminate_total").increment(1);
}

pub fn record_table_size(size: usize) {
    gauge!("url_map_table_size").set(size as f64);
}
