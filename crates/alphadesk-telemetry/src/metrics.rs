//! Prometheus metrics for alphadesk.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. Registration only fails on duplicate
//! metric names, which is a programming error caught at first use.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

use crate::error::TelemetryResult;

/// Total backend API requests.
/// Labels: endpoint, outcome (ok/transport/status/decode/validation/config)
pub static API_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "alphadesk_api_requests_total",
        "Total backend API requests",
        &["endpoint", "outcome"]
    )
    .unwrap()
});

/// Backend API latency in milliseconds.
pub static API_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "alphadesk_api_latency_ms",
        "Backend API request latency in milliseconds",
        &["endpoint"],
        vec![10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]
    )
    .unwrap()
});

/// Branch expansion attempts.
/// Labels: direction (older/newer), outcome (fetched/cached/busy/unsupported/stale/failed)
pub static BRANCH_EXPAND_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "alphadesk_branch_expand_total",
        "Message branch expansion attempts",
        &["direction", "outcome"]
    )
    .unwrap()
});

/// Notifications shown to the operator.
pub static NOTIFICATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "alphadesk_notifications_total",
        "Notifications published",
        &["level"]
    )
    .unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    /// Record a completed API request.
    pub fn api_request(endpoint: &str, outcome: &str, latency_ms: f64) {
        API_REQUESTS_TOTAL
            .with_label_values(&[endpoint, outcome])
            .inc();
        API_LATENCY_MS
            .with_label_values(&[endpoint])
            .observe(latency_ms);
    }

    /// Record a branch expansion attempt.
    pub fn branch_expand(direction: &str, outcome: &str) {
        BRANCH_EXPAND_TOTAL
            .with_label_values(&[direction, outcome])
            .inc();
    }

    /// Record a published notification.
    pub fn notification(level: &str) {
        NOTIFICATIONS_TOTAL.with_label_values(&[level]).inc();
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn gather_text() -> TelemetryResult<String> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&prometheus::gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}
