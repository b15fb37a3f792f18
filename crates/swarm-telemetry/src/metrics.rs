//! Prometheus metrics for the swarm client.
//!
//! All metrics follow the naming convention: `swarm_<area>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // DIRECTORY METRICS
    // =========================================================================

    /// Failures reported against snodes
    pub static ref SNODE_FAILURES: Counter = Counter::new(
        "swarm_directory_snode_failures_total",
        "Total failures reported against storage nodes"
    ).expect("metric creation failed");

    /// Snodes evicted after crossing the failure threshold
    pub static ref SNODES_EVICTED: Counter = Counter::new(
        "swarm_directory_snodes_evicted_total",
        "Total storage nodes evicted from the pool and swarm cache"
    ).expect("metric creation failed");

    /// Current size of the random snode pool
    pub static ref SNODE_POOL_SIZE: Gauge = Gauge::new(
        "swarm_directory_pool_size",
        "Number of storage nodes in the random pool"
    ).expect("metric creation failed");

    // =========================================================================
    // PROOF OF WORK METRICS
    // =========================================================================

    /// Completed proof-of-work computations
    pub static ref POW_COMPUTATIONS: Counter = Counter::new(
        "swarm_pow_computations_total",
        "Total proof-of-work nonces computed"
    ).expect("metric creation failed");

    /// Proof-of-work computation duration
    pub static ref POW_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "swarm_pow_duration_seconds",
            "Time spent searching for a proof-of-work nonce"
        ).buckets(exponential_buckets(0.001, 2.0, 15).unwrap())
    ).expect("metric creation failed");

    // =========================================================================
    // MESSAGE METRICS
    // =========================================================================

    /// Messages stored, by route
    pub static ref MESSAGES_STORED: CounterVec = CounterVec::new(
        Opts::new("swarm_messages_stored_total", "Messages delivered"),
        &["route"]  // route: p2p/swarm
    ).expect("metric creation failed");

    /// New messages received after deduplication
    pub static ref MESSAGES_RECEIVED: Counter = Counter::new(
        "swarm_messages_received_total",
        "Total new messages received from the swarm"
    ).expect("metric creation failed");

    // =========================================================================
    // TRANSPORT METRICS
    // =========================================================================

    /// Onion-proxied requests, by outcome
    pub static ref PROXY_REQUESTS: CounterVec = CounterVec::new(
        Opts::new("swarm_proxy_requests_total", "Requests routed through a snode proxy"),
        &["outcome"]  // outcome: success/failed
    ).expect("metric creation failed");

    /// Active long-poll connections
    pub static ref LONG_POLL_CONNECTIONS: Gauge = Gauge::new(
        "swarm_long_poll_connections",
        "Number of currently open long-poll connections"
    ).expect("metric creation failed");
}

/// Handle for the metrics registry
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Directory
        Box::new(SNODE_FAILURES.clone()),
        Box::new(SNODES_EVICTED.clone()),
        Box::new(SNODE_POOL_SIZE.clone()),
        // Proof of work
        Box::new(POW_COMPUTATIONS.clone()),
        Box::new(POW_DURATION.clone()),
        // Messages
        Box::new(MESSAGES_STORED.clone()),
        Box::new(MESSAGES_RECEIVED.clone()),
        // Transport
        Box::new(PROXY_REQUESTS.clone()),
        Box::new(LONG_POLL_CONNECTIONS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_increment() {
        SNODE_FAILURES.inc();
        assert!(SNODE_FAILURES.get() >= 1.0);
    }

    #[test]
    fn test_labelled_counter() {
        MESSAGES_STORED.with_label_values(&["swarm"]).inc();
        assert!(MESSAGES_STORED.with_label_values(&["swarm"]).get() >= 1.0);
    }

    #[test]
    fn test_gauge_set() {
        SNODE_POOL_SIZE.set(7.0);
        assert_eq!(SNODE_POOL_SIZE.get(), 7.0);
    }

    #[test]
    fn test_histogram_timer() {
        let before = POW_DURATION.get_sample_count();
        {
            let _timer = HistogramTimer::new(&POW_DURATION);
        }
        assert!(POW_DURATION.get_sample_count() > before);
    }

    #[test]
    fn test_register_then_encode() {
        // Another test may have registered first; only the encoding matters here.
        let _ = register_metrics();
        POW_COMPUTATIONS.inc();
        let text = encode_metrics().unwrap();
        assert!(text.contains("swarm_pow_computations_total"));
    }
}
