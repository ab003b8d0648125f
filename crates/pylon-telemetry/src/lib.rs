//! # Pylon Telemetry
//!
//! Logging and metrics for Pylon services.
//!
//! - **Logging**: `tracing-subscriber` with JSON, pretty or compact output
//! - **Metrics**: request counters and latency histograms via `metrics`, with
//!   an optional Prometheus exporter
//! - **Capture**: an in-memory writer for asserting on log output in tests
//!
//! # Example
//!
//! ```rust,ignore
//! use pylon_telemetry::{init_telemetry, LogConfig, MetricsConfig, TelemetryConfig};
//!
//! let config = TelemetryConfig {
//!     logging: LogConfig::development(),
//!     metrics: MetricsConfig::default(),
//! };
//! init_telemetry(&config)?;
//! ```

#![doc(html_root_url = "https://docs.rs/pylon-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod capture;
pub mod error;
pub mod logging;
pub mod metrics;

pub use capture::{CapturedLogs, CapturedWriter};
pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig, LogFormat};
pub use metrics::{init_metrics, record_error, record_request, render_metrics, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Logging and metrics settings together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryConfig {
    /// Logging settings.
    pub logging: LogConfig,
    /// Metrics settings.
    pub metrics: MetricsConfig,
}

/// Initializes logging, then metrics.
///
/// # Errors
///
/// Returns `TelemetryError` if either subsystem fails to initialize.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;
    Ok(())
}
