//! # Pylon
//!
//! **HTTP request pipeline with declarative binding and localized errors**
//!
//! Pylon wraps business handlers in a fixed chain of stages:
//!
//! - **Binding** – Path, query and JSON body merged into one typed request view
//! - **Validation** – Declarative field rules with English and French messages
//! - **Error taxonomy** – Every failure maps to one kind, one code and one status
//! - **CORS** – Preflight short-circuit and headers on every response
//! - **Observability** – Structured `tracing` logs and Prometheus metrics
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pylon::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::builder()
//!         .config(ServerConfig::builder().http_addr("0.0.0.0:8080").build())
//!         .route(Method::GET, "/artists/{id}", HandlerEndpoint::new(GetArtist::default()))
//!         .build();
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → Telemetry → CORS → Locale → Response → ErrorHandler → Bind → Handler
//!                                                                          ↓
//! Response ← Telemetry ← CORS ← Response ← ErrorHandler ←───────────────────┘
//! ```

#![doc(html_root_url = "https://docs.rs/pylon/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use pylon_core as core;

// Re-export localization
pub use pylon_i18n as i18n;

// Re-export binding and validation
pub use pylon_bind as bind;

// Re-export pipeline stages
pub use pylon_middleware as middleware;

// Re-export telemetry
pub use pylon_telemetry as telemetry;

// Re-export configuration
pub use pylon_config as config;

// Re-export server types
pub use pylon_server as server;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use pylon::prelude::*;
///
/// let err = PylonError::new(ErrorKind::NotFound);
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// ```
pub mod prelude {
    pub use pylon_core::{
        Empty, ErrorKind, FieldErrors, Handler, Payload, PylonError, PylonResult, RequestContext,
        RequestId,
    };

    pub use pylon_bind::{FieldSpec, PrimitiveKind, RequestView, Rule, Shape};

    pub use pylon_i18n::{Locale, LocaleNegotiator};

    pub use pylon_middleware::{Endpoint, HandlerEndpoint, Pipeline, PipelineConfig};

    pub use pylon_server::{Server, ServerConfig, ShutdownSignal};

    pub use http::{Method, StatusCode};
}
