//! # Swarm Telemetry
//!
//! Observability for the snode swarm client.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` registry with an `EnvFilter` and either
//!   a human-readable or a JSON formatting layer
//! - **Metrics**: Prometheus counters for swarm health (failures, evictions,
//!   proof-of-work, message flow)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use swarm_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! let _guard = init_telemetry(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SWARM_SERVICE_NAME` | `snode-swarm` | Service name attached to logs |
//! | `SWARM_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `SWARM_JSON_LOGS` | `false` | Emit JSON formatted logs |
//! | `SWARM_METRICS_PORT` | `9100` | Prometheus scrape port |

#![warn(missing_docs)]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, MetricsHandle, LONG_POLL_CONNECTIONS,
    MESSAGES_RECEIVED, MESSAGES_STORED, POW_COMPUTATIONS, POW_DURATION, PROXY_REQUESTS,
    SNODES_EVICTED, SNODE_FAILURES, SNODE_POOL_SIZE,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The global subscriber could not be installed
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// A metric could not be registered
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    // Metrics first so that early log lines can already count failures
    let metrics_handle = register_metrics()?;
    init_logging(config)?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        metrics_port = config.metrics_port,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

/// Log a snode-related event with standard fields.
#[macro_export]
macro_rules! log_snode_event {
    ($level:ident, $msg:expr, $snode:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            snode = %$snode,
            $($($field)*,)?
            $msg
        )
    };
}
