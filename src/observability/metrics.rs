//! Metrics collection and exposition.
//!
//! # Metrics
//! - `endpoint_requests_total` (counter): bridged requests by method, status
//! - `endpoint_request_duration_seconds` (histogram): handler + write latency
//! - `endpoint_panics_recovered_total` (counter): panics caught by recovery filters
//! - `endpoint_write_failures_total` (counter): responses the transport rejected
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter, serving scrapes on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start_time: Instant) {
    counter!(
        "endpoint_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("endpoint_request_duration_seconds").record(start_time.elapsed().as_secs_f64());
}

pub fn record_panic_recovered() {
    counter!("endpoint_panics_recovered_total").increment(1);
}

pub fn record_write_failure() {
    counter!("endpoint_write_failures_total").increment(1);
}
