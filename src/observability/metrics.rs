//! Metrics collection and exposition.
//!
//! # Metrics
//! - `exchange_records_total` (counter): records emitted, by log_type
//! - `exchange_duration_seconds` (histogram): downstream time per exchange
//! - `exchange_downstream_faults_total` (counter): panics and body errors, by kind
//! - `exchange_capture_failures_total` (counter): unreadable bodies, by phase
//! - `exchange_sink_failures_total` (counter): records lost at the sink
//! - `exchange_serialization_failures_total` (counter): fallback records written
//!
//! # Design Decisions
//! - Uses the `metrics` facade; without an installed recorder every call is a no-op
//! - Prometheus exporter is optional and bound to its own address

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::observability::record::LogType;

/// Install the Prometheus recorder and start its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Count an emitted record.
pub fn record_emitted(log_type: LogType) {
    counter!("exchange_records_total", "log_type" => log_type.as_str()).increment(1);
}

/// Record time spent downstream for one exchange.
pub fn record_duration(start: Instant) {
    histogram!("exchange_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Count a downstream fault (`panic` or `body`).
pub fn record_downstream_fault(kind: &'static str) {
    counter!("exchange_downstream_faults_total", "kind" => kind).increment(1);
}

/// Count a body that could not be read (`request` or `response`).
pub fn record_capture_failure(phase: &'static str) {
    counter!("exchange_capture_failures_total", "phase" => phase).increment(1);
}

pub fn record_sink_failure() {
    counter!("exchange_sink_failures_total").increment(1);
}

pub fn record_serialization_failure() {
    counter!("exchange_serialization_failures_total").increment(1);
}
