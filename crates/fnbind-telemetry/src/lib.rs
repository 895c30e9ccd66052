//! Observability for fnbind services.
//!
//! - **Logging**: structured JSON or pretty logs via `tracing-subscriber`
//! - **Metrics**: per-route Prometheus metrics via the `metrics` crate
//!
//! # Example
//!
//! ```rust,ignore
//! use fnbind_telemetry::{init_logging, init_metrics, LogConfig, MetricsConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), fnbind_telemetry::TelemetryError> {
//!     init_logging(&LogConfig::default())?;
//!     init_metrics(&MetricsConfig::default())?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/fnbind-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{fields, init_logging, LogConfig};
pub use metrics::{init_metrics, render_metrics, InFlightGuard, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
