/// Metrics and telemetry for the CoreLink ID SDK
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - Tiered cache reads per backend
/// - Resolution outcomes and latencies
/// - Suppressed calls
/// - Linkage side calls

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Encoder, Histogram,
    IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    // ========== Cache Metrics ==========

    /// Tiered cache reads by backend and outcome
    pub static ref CACHE_READS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "corelink_cache_reads_total",
        "Total number of tiered cache reads",
        &["backend", "outcome"]
    )
    .unwrap();

    // ========== Resolution Metrics ==========

    /// Resolution round-trips by outcome
    pub static ref RESOLUTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "corelink_resolutions_total",
        "Total number of identity resolution round-trips",
        &["outcome"]
    )
    .unwrap();

    /// Resolution round-trip duration in seconds
    pub static ref RESOLUTION_DURATION_SECONDS: Histogram = register_histogram!(
        "corelink_resolution_duration_seconds",
        "Identity resolution latencies in seconds",
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    /// Calls answered from the suppression window without any network attempt
    pub static ref SUPPRESSED_TOTAL: IntCounter = register_int_counter!(
        "corelink_suppressed_total",
        "Total number of calls blocked by a partner-scoped no-consent window"
    )
    .unwrap();

    // ========== Linkage Metrics ==========

    /// Linkage side calls by outcome
    pub static ref LINKAGE_CALLS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "corelink_linkage_calls_total",
        "Total number of linkage-data side calls",
        &["outcome"]
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Record a tiered cache read
pub fn record_cache_read(backend: &str, outcome: &str) {
    CACHE_READS_TOTAL
        .with_label_values(&[backend, outcome])
        .inc();
}

/// Record a resolution round-trip
pub fn record_resolution(outcome: &str) {
    RESOLUTIONS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Record a call suppressed by an active no-consent window
pub fn record_suppressed() {
    SUPPRESSED_TOTAL.inc();
}

/// Record a linkage-data side call
pub fn record_linkage(outcome: &str) {
    LINKAGE_CALLS_TOTAL.with_label_values(&[outcome]).inc();
}
