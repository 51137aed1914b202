//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_logins_total` (counter): login attempts by outcome
//! - `gate_sessions_invalidated_total` (counter): ended sessions by reason
//! - `gate_active_sessions` (gauge): live sessions in the session table
//! - `gate_requests_total` (counter): gated requests by decision
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter, so
//! tests and embedders pay nothing.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_login(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("gate_logins_total", "outcome" => outcome).increment(1);
}

pub fn record_session_invalidated(reason: &'static str) {
    metrics::counter!("gate_sessions_invalidated_total", "reason" => reason).increment(1);
}

pub fn record_active_sessions(count: usize) {
    metrics::gauge!("gate_active_sessions").set(count as f64);
}

pub fn record_request(allowed: bool) {
    let decision = if allowed { "allow" } else { "deny" };
    metrics::counter!("gate_requests_total", "decision" => decision).increment(1);
}
