//! Metrics collection and exposition.
//!
//! # Metrics
//! - `messaging_requests_total` (counter): inbound requests by receiver, status
//! - `messaging_messages_resolved_total` (counter): outcomes by receiver, outcome
//! - `messaging_send_total` (counter): outbound sends by sender, result
//! - `messaging_send_duration_seconds` (histogram): outbound latency by sender
//! - `messaging_forwarded_total` (counter): forwards by receiver, outcome
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Labels stay low-cardinality (names and outcomes, never paths)

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

use crate::message::Outcome;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), metrics_exporter_prometheus::BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record an inbound request and the status it was answered with.
pub fn record_request(receiver: &str, status: u16) {
    counter!(
        "messaging_requests_total",
        "receiver" => receiver.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record the outcome a received message was resolved with.
pub fn record_resolved(receiver: &str, outcome: Outcome) {
    counter!(
        "messaging_messages_resolved_total",
        "receiver" => receiver.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record an outbound send and its latency.
pub fn record_send(sender: &str, success: bool, start: Instant) {
    let result = if success { "success" } else { "failure" };
    counter!(
        "messaging_send_total",
        "sender" => sender.to_string(),
        "result" => result
    )
    .increment(1);
    histogram!(
        "messaging_send_duration_seconds",
        "sender" => sender.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a disposition re-routed to a forwarding sender.
pub fn record_forwarded(receiver: &str, outcome: Outcome) {
    counter!(
        "messaging_forwarded_total",
        "receiver" => receiver.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}
