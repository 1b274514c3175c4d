//! Prometheus request metrics.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `kaze_requests_total` | Counter | `method`, `status` |
//! | `kaze_request_duration_seconds` | Histogram | `method` |
//! | `kaze_double_response_total` | Counter | - |
//! | `kaze_in_flight_requests` | Gauge | - |
//!
//! Recording functions are no-ops until a recorder is installed.

use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Request counter.
pub const REQUESTS_TOTAL: &str = "kaze_requests_total";
/// Request latency histogram.
pub const REQUEST_DURATION_SECONDS: &str = "kaze_request_duration_seconds";
/// Second-write attempts.
pub const DOUBLE_RESPONSE_TOTAL: &str = "kaze_double_response_total";
/// Requests currently being served.
pub const IN_FLIGHT_REQUESTS: &str = "kaze_in_flight_requests";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics exporter configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether to install the exporter.
    pub enabled: bool,

    /// Listen address of the scrape endpoint.
    pub addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: "0.0.0.0:9090".to_string(),
        }
    }
}

impl From<&kaze_config::MetricsConfig> for MetricsConfig {
    fn from(config: &kaze_config::MetricsConfig) -> Self {
        Self {
            enabled: config.enabled,
            addr: config.addr.clone(),
        }
    }
}

/// Installs the Prometheus recorder with an HTTP scrape listener.
///
/// Must be called from within a Tokio runtime.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidAddress` for a bad address and
/// `TelemetryError::MetricsInit` if a recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .addr
        .parse()
        .map_err(|e| TelemetryError::InvalidAddress(format!("{}: {e}", config.addr)))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    register_metric_descriptions();
    tracing::info!(%addr, "prometheus exporter listening");
    Ok(())
}

/// Installs the recorder without a listener and keeps its handle, so
/// [`render_metrics`] can serve the text format from the application.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if a recorder is already installed.
pub fn install_recorder() -> TelemetryResult<&'static PrometheusHandle> {
    if let Some(handle) = METRICS_HANDLE.get() {
        return Ok(handle);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    register_metric_descriptions();
    Ok(METRICS_HANDLE.get_or_init(|| handle))
}

/// Renders the current metrics, if [`install_recorder`] was called.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(REQUESTS_TOTAL, "Total number of requests dispatched");
    describe_histogram!(REQUEST_DURATION_SECONDS, "Request dispatch duration in seconds");
    describe_counter!(DOUBLE_RESPONSE_TOTAL, "Handlers that tried to respond twice");
    describe_gauge!(IN_FLIGHT_REQUESTS, "Requests currently being served");
}

/// Records a completed request.
pub fn record_request(method: &str, status_code: u16, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(REQUEST_DURATION_SECONDS, "method" => method.to_string())
        .record(duration.as_secs_f64());
}

/// Records a rejected second response.
pub fn record_double_response() {
    counter!(DOUBLE_RESPONSE_TOTAL).increment(1);
}

/// Keeps `kaze_in_flight_requests` raised while alive.
#[derive(Debug)]
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Increments the gauge; dropping the guard decrements it.
    #[must_use]
    pub fn new() -> Self {
        gauge!(IN_FLIGHT_REQUESTS).increment(1.0);
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!(IN_FLIGHT_REQUESTS).decrement(1.0);
    }
}
