//! Logging and metrics for Kaze.
//!
//! - **Logging**: a `tracing-subscriber` registry with an `EnvFilter` and
//!   JSON or pretty output
//! - **Metrics**: request counters and latency histograms through the
//!   `metrics` facade, exported in Prometheus format
//!
//! ```rust,ignore
//! use kaze_config::KazeConfig;
//!
//! let config = KazeConfig::production();
//! kaze_telemetry::init_telemetry(&config.telemetry)?;
//! ```

#![doc(html_root_url = "https://docs.rs/kaze-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, InFlightGuard, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Installs logging, then the metrics exporter, from the `[telemetry]`
/// configuration section.
///
/// # Errors
///
/// Returns `TelemetryError` if either subsystem fails to initialize.
pub fn init_telemetry(section: &kaze_config::TelemetryConfigSection) -> TelemetryResult<()> {
    init_logging(&LogConfig::from(section))?;
    init_metrics(&MetricsConfig::from(&section.metrics))?;
    tracing::debug!(service = %section.service_name, "telemetry initialized");
    Ok(())
}
