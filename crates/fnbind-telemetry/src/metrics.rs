//! Route metrics.
//!
//! Recorded through the `metrics` facade, so they are no-ops until a
//! recorder is installed with [`init_metrics`].
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `fnbind_requests_total` | Counter | `method`, `path`, `status` |
//! | `fnbind_request_duration_seconds` | Histogram | `method`, `path` |
//! | `fnbind_response_size_bytes` | Histogram | `method`, `path` |
//! | `fnbind_in_flight_requests` | Gauge | - |
//! | `fnbind_handler_panics_total` | Counter | `method`, `path` |

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

/// Total requests served.
pub const REQUESTS_TOTAL: &str = "fnbind_requests_total";
/// Request latency.
pub const REQUEST_DURATION_SECONDS: &str = "fnbind_request_duration_seconds";
/// Response body size.
pub const RESPONSE_SIZE_BYTES: &str = "fnbind_response_size_bytes";
/// Requests currently being served.
pub const IN_FLIGHT_REQUESTS: &str = "fnbind_in_flight_requests";
/// Panics caught at the handler boundary.
pub const HANDLER_PANICS_TOTAL: &str = "fnbind_handler_panics_total";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Address of the Prometheus scrape endpoint.
    pub addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            addr: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Installs the Prometheus recorder and spawns its scrape endpoint.
///
/// Must be called from within a Tokio runtime. Succeeds at most once per
/// process.
///
/// # Errors
///
/// Returns an error if the address does not parse or cannot be bound, or a
/// recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .addr
        .parse()
        .map_err(|e| TelemetryError::InvalidAddress(format!("{}: {e}", config.addr)))?;

    if METRICS_HANDLE.get().is_some() {
        return Err(TelemetryError::MetricsInit(
            "recorder already installed".to_string(),
        ));
    }

    let (recorder, exporter) = PrometheusBuilder::new()
        .with_http_listener(addr)
        .build()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    let handle = recorder.handle();

    metrics::set_global_recorder(recorder)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    METRICS_HANDLE
        .set(handle)
        .map_err(|_| TelemetryError::MetricsInit("recorder already installed".to_string()))?;

    tokio::spawn(async move {
        if let Err(e) = exporter.await {
            tracing::error!(error = ?e, "metrics exporter stopped");
        }
    });
    describe_metrics();
    tracing::info!(%addr, "serving Prometheus metrics");

    Ok(())
}

/// Renders metrics in Prometheus text format, if a recorder is installed.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn describe_metrics() {
    describe_counter!(REQUESTS_TOTAL, "Total number of HTTP requests served");
    describe_histogram!(REQUEST_DURATION_SECONDS, "HTTP request duration in seconds");
    describe_histogram!(RESPONSE_SIZE_BYTES, "HTTP response body size in bytes");
    describe_gauge!(
        IN_FLIGHT_REQUESTS,
        "Number of HTTP requests currently being served"
    );
    describe_counter!(
        HANDLER_PANICS_TOTAL,
        "Panics caught while running route handlers"
    );
}

/// Records a served request.
pub fn record_request(
    method: &str,
    path: &str,
    status_code: u16,
    duration: Duration,
    response_bytes: usize,
) {
    counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(
        REQUEST_DURATION_SECONDS,
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration.as_secs_f64());

    histogram!(
        RESPONSE_SIZE_BYTES,
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(response_bytes as f64);
}

/// Records a panic caught at the handler boundary.
pub fn record_panic(method: &str, path: &str) {
    counter!(
        HANDLER_PANICS_TOTAL,
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .increment(1);
}

/// Guard that tracks a request in the in-flight gauge until dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Increments the in-flight gauge.
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
