//! Typed configuration for Pylon services.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides (`PYLON__SECTION__KEY`)
//! - `.env` files through `dotenvy`
//! - Strict parsing: unknown keys are errors
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//! request_timeout_ms = 30000
//! max_body_bytes = 1048576
//!
//! [locale]
//! default = "en"
//! supported = ["en", "fr"]
//!
//! [cors]
//! allow_origin = "*"
//! allow_credentials = true
//! max_age_secs = 86400
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [metrics]
//! enabled = false
//! addr = "0.0.0.0:9090"
//! ```

#![doc(html_root_url = "https://docs.rs/pylon-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::PylonConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{CorsConfig, LocaleConfig, LoggingConfig, MetricsConfig, ServerConfig};
