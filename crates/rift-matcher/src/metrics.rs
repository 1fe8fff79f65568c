//! Prometheus metrics for rift-matcher.
//!
//! Tracks matching outcomes, scan latency and cache activity.
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

lazy_static! {
    /// Matching decisions by strategy and outcome
    pub static ref MATCH_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "rift_matcher_requests_total",
        "Total number of requests matched against the simulation",
        &["strategy", "result"]  // result: hit|miss
    )
    .unwrap();

    /// Duration of a full strategy scan
    pub static ref MATCH_DURATION_MS: HistogramVec = register_histogram_vec!(
        "rift_matcher_match_duration_ms",
        "Histogram of strategy scan time in milliseconds",
        &["strategy"],
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 50.0, 100.0]
    )
    .unwrap();

    /// Cache operations
    pub static ref CACHE_OPS_TOTAL: CounterVec = register_counter_vec!(
        "rift_matcher_cache_total",
        "Total number of matcher cache operations",
        &["operation", "result"]  // operation: get|save|preload|flush
    )
    .unwrap();
}

/// Collect and return all metrics in Prometheus text format
pub fn collect_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

pub fn record_match(strategy: &str, hit: bool, duration_ms: f64) {
    let result = if hit { "hit" } else { "miss" };
    MATCH_REQUESTS_TOTAL
        .with_label_values(&[strategy, result])
        .inc();
    MATCH_DURATION_MS
        .with_label_values(&[strategy])
        .observe(duration_ms);
}

/// Record a cache operation; `result` is e.g. hit|miss|success|error.
pub fn record_cache_op(operation: &str, result: &str) {
    CACHE_OPS_TOTAL
        .with_label_values(&[operation, result])
        .inc();
}
