//! Metrics collection and exposition.
//!
//! # Metrics
//! - `geoip_requests_total` (counter): requests by outcome and status
//! - `geoip_request_duration_seconds` (histogram): latency distribution
//! - `geoip_delivered_bytes_total` (counter): compressed bytes sent
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

/// Record one finished request.
pub fn record_request(outcome: &'static str, status: u16, start_time: Instant) {
    counter!(
        "geoip_requests_total",
        "outcome" => outcome,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("geoip_request_duration_seconds", "outcome" => outcome)
        .record(start_time.elapsed().as_secs_f64());
}

/// Record a successful delivery's size.
pub fn record_delivered_bytes(bytes: usize) {
    counter!("geoip_delivered_bytes_total").increment(bytes as u64);
}
