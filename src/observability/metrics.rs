//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bridge_forward_total` (counter): one-shot exchanges by outcome
//! - `bridge_forward_duration_seconds` (histogram): one-shot latency
//! - `bridge_sessions_active` (gauge): registered sessions
//! - `bridge_sessions_opened_total` (counter): accepted WebSocket sessions
//! - `bridge_sessions_total` (counter): closed sessions by cause
//! - `bridge_frames_relayed_total` (counter): session frames by direction

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished one-shot exchange. `outcome` is `ok` or an error kind.
pub fn record_forward(outcome: &'static str, start: Instant) {
    counter!("bridge_forward_total", "outcome" => outcome).increment(1);
    histogram!("bridge_forward_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_active_sessions(count: usize) {
    gauge!("bridge_sessions_active").set(count as f64);
}

pub fn record_session_opened() {
    counter!("bridge_sessions_opened_total").increment(1);
}

pub fn record_session_closed(cause: &'static str) {
    counter!("bridge_sessions_total", "outcome" => cause).increment(1);
}

/// `direction` is `to_backend` or `to_client`.
pub fn record_frame_relayed(direction: &'static str) {
    counter!("bridge_frames_relayed_total", "direction" => direction).increment(1);
}
