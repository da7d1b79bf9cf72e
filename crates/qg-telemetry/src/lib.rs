//! # Quorum-Gate Telemetry
//!
//! Logging setup and Prometheus metrics shared by every component.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use qg_telemetry::{init_logging, register_metrics, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config)?;
//! register_metrics()?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `QG_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `QG_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `QG_SERVICE_NAME` | `quorum-gate` | Service name in log lines |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{gather_metrics, register_metrics, HistogramTimer};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Failed to encode metrics: {0}")]
    Encoding(String),
}
