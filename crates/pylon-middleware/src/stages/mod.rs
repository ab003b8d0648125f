//! Pipeline stages.
//!
//! The standard pipeline runs these stages in a fixed order:
//!
//! 1. [`telemetry`] - Access log and request metrics
//! 2. [`cors`] - CORS headers, `OPTIONS` short-circuit
//! 3. [`locale`] - `Accept-Language` negotiation
//! 4. [`response`] - Serializes the response view (after the inner chain)
//! 5. [`error_handler`] - Classifies and translates errors (after the inner chain)
//!
//! The response shaper sits outside the error handler, so it always
//! serializes the view the error handler left behind.

pub mod cors;
pub mod error_handler;
pub mod locale;
pub mod response;
pub mod telemetry;

pub use cors::{CorsConfig, CorsMiddleware};
pub use error_handler::ErrorHandlerMiddleware;
pub use locale::LocaleMiddleware;
pub use response::ResponseShaper;
pub use telemetry::TelemetryMiddleware;
