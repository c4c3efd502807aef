//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ingest_requests_total` (counter): requests by method, status
//! - `ingest_request_duration_seconds` (histogram): latency distribution
//! - `ingest_login_attempts_total` (counter): login outcomes
//! - `ingest_login_blocks_total` (counter): blocks created by the login guard
//! - `ingest_token_rejections_total` (counter): API token failures by reason
//! - `ingest_records_replaced_total` (counter): records written by ingestion
//!
//! Recording is a no-op until a recorder is installed, so tests and the CLI
//! never need to call [`init_metrics`].

use std::net::SocketAddr;
use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::AppError;

/// Serve Prometheus metrics on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "ingest_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("ingest_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_login_attempt(outcome: &'static str) {
    counter!("ingest_login_attempts_total", "outcome" => outcome).increment(1);
}

pub fn record_login_block() {
    counter!("ingest_login_blocks_total").increment(1);
}

pub fn record_token_rejected(reason: &AppError) {
    counter!("ingest_token_rejections_total", "reason" => reason.to_string()).increment(1);
}

pub fn record_ingest(total: usize) {
    counter!("ingest_records_replaced_total").increment(total as u64);
}

/// Middleware recording per-request count and latency.
pub async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    record_request(&method, response.status().as_u16(), start);
    response
}
