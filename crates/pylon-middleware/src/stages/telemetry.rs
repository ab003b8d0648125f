//! Access logging and request metrics.
//!
//! Runs outermost, so the duration covers every other stage and the status
//! is the one actually written.
//!
//! # Metrics Emitted
//!
//! - `pylon_requests_total{method,status}`
//! - `pylon_request_duration_seconds{method}`

use crate::middleware::{BoxFuture, Middleware, Next};
use pylon_core::RequestContext;
use pylon_telemetry::record_request;

/// Emits one access log line and the request metrics per request.
#[derive(Debug, Clone, Copy, Default)]
pub struct TelemetryMiddleware;

impl TelemetryMiddleware {
    /// Creates the stage.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Middleware for TelemetryMiddleware {
    fn name(&self) -> &'static str {
        "telemetry"
    }

    fn process<'a>(&'a self, ctx: &'a mut RequestContext, next: Next<'a>) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            next.run(ctx).await;

            let status = ctx
                .response()
                .map_or_else(|| ctx.status(), |response| response.status());
            let duration = ctx.elapsed();
            record_request(ctx.method().as_str(), status.as_u16(), duration);

            let locale = ctx.locale().map(|l| l.locale().as_str());
            tracing::info!(
                request_id = %ctx.request_id(),
                http.method = %ctx.method(),
                http.path = ctx.path(),
                http.status_code = status.as_u16(),
                duration_ms = duration.as_secs_f64() * 1000.0,
                locale,
                "request completed"
            );
        })
    }
}
