//! Metrics for block search
//!
//! Prometheus counters and histograms describing how much work the filter
//! pipeline does: blocks examined, blocks dropped by the index alone, rows
//! matched, and scratch objects the per-thread pools had to allocate.

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_histogram, Counter, CounterVec, Encoder,
    Histogram, TextEncoder,
};

lazy_static! {
    // === Search Counters ===

    /// Blocks passed to the filter pipeline
    pub static ref BLOCKS_SEARCHED: Counter = register_counter!(
        "logstore_blocks_searched_total",
        "Blocks passed to the filter pipeline"
    ).unwrap();

    /// Blocks rejected by the coarse phase without decoding
    pub static ref BLOCKS_SKIPPED: Counter = register_counter!(
        "logstore_blocks_skipped_total",
        "Blocks rejected by the coarse phase without decoding"
    ).unwrap();

    /// Rows that survived both phases
    pub static ref ROWS_MATCHED: Counter = register_counter!(
        "logstore_rows_matched_total",
        "Rows matched by a filter"
    ).unwrap();

    // === Pools ===

    /// Scratch objects allocated because the thread-local free list was empty
    pub static ref POOL_MISSES: CounterVec = register_counter_vec!(
        "logstore_pool_misses_total",
        "Scratch objects allocated on an empty free list",
        &["pool"]
    ).unwrap();

    // === Latency Histograms ===

    /// Duration of a multi-block search
    pub static ref SEARCH_DURATION: Histogram = register_histogram!(
        "logstore_search_duration_seconds",
        "Multi-block search latency in seconds",
        vec![0.0001, 0.001, 0.01, 0.1, 0.5, 1.0, 5.0]
    ).unwrap();
}

/// Get metrics in Prometheus text format
///
/// # Returns
///
/// Result containing the formatted metrics string, or an error if encoding fails
pub fn gather_metrics() -> Result<String, String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| format!("Failed to encode metrics: {}", e))?;

    String::from_utf8(buffer).map_err(|e| format!("Metrics contain invalid UTF-8: {}", e))
}

/// Record one searched block
#[inline]
pub fn record_block(skipped: bool, rows_matched: usize) {
    BLOCKS_SEARCHED.inc();
    if skipped {
        BLOCKS_SKIPPED.inc();
    } else {
        ROWS_MATCHED.inc_by(rows_matched as f64);
    }
}
