//! Fixed-order request pipeline.
//!
//! ## Pipeline Stages
//!
//! [`Pipeline::standard`] builds the stages every request flows through:
//!
//! 1. **Telemetry** - Access log and request metrics
//! 2. **CORS** - Headers on every response, preflight short-circuit
//! 3. **Locale** - `Accept-Language` negotiation
//! 4. **Response** - Serializes the response view
//! 5. **Error Handler** - Classifies and translates the recorded error
//!
//! The chain ends at an [`Endpoint`], usually a
//! [`HandlerEndpoint`](crate::HandlerEndpoint) that binds, validates and
//! calls the handler.

use crate::endpoint::Endpoint;
use crate::middleware::{Middleware, Next};
use crate::reply;
use crate::stages::{
    CorsConfig, CorsMiddleware, ErrorHandlerMiddleware, LocaleMiddleware, ResponseShaper,
    TelemetryMiddleware,
};
use http::StatusCode;
use pylon_core::{RequestContext, Response};
use pylon_i18n::LocaleNegotiator;
use std::sync::Arc;

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The stages of the standard pipeline, outermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Access log and request metrics.
    Telemetry,
    /// CORS headers and preflight.
    Cors,
    /// `Accept-Language` negotiation.
    Locale,
    /// Response view serialization.
    Response,
    /// Error classification and translation.
    ErrorHandler,
}

impl Stage {
    /// Returns every stage in execution order.
    #[must_use]
    pub const fn all() -> [Stage; 5] {
        [
            Self::Telemetry,
            Self::Cors,
            Self::Locale,
            Self::Response,
            Self::ErrorHandler,
        ]
    }

    /// Returns the stage name, as reported by [`Middleware::name`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Telemetry => "telemetry",
            Self::Cors => "cors",
            Self::Locale => "locale",
            Self::Response => "response",
            Self::ErrorHandler => "error_handler",
        }
    }
}

/// Settings for [`Pipeline::standard`].
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// CORS policy.
    pub cors: CorsConfig,
    /// Locale negotiation.
    pub negotiator: LocaleNegotiator,
}

/// An ordered list of stages.
///
/// The pipeline is immutable once built and shared between requests.
///
/// # Example
///
/// ```
/// use pylon_middleware::{Pipeline, PipelineConfig};
///
/// let pipeline = Pipeline::standard(&PipelineConfig::default());
/// assert_eq!(
///     pipeline.stage_names(),
///     vec!["telemetry", "cors", "locale", "response", "error_handler"]
/// );
/// ```
#[derive(Clone)]
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Builds the standard stage order.
    #[must_use]
    pub fn standard(config: &PipelineConfig) -> Self {
        Self::builder()
            .stage(TelemetryMiddleware::new())
            .stage(CorsMiddleware::new(config.cors.clone()))
            .stage(LocaleMiddleware::new(config.negotiator.clone()))
            .stage(ResponseShaper::new())
            .stage(ErrorHandlerMiddleware::new())
            .build()
    }

    /// Runs `ctx` through every stage and then `endpoint`.
    ///
    /// Returns the response the stages wrote, or a bare `400` if none did.
    pub async fn process(&self, ctx: &mut RequestContext, endpoint: &dyn Endpoint) -> Response {
        self.build_chain(endpoint).run(ctx).await;
        ctx.take_response().unwrap_or_else(|| {
            tracing::warn!(request_id = %ctx.request_id(), "pipeline produced no response");
            reply::empty(StatusCode::BAD_REQUEST)
        })
    }

    fn build_chain<'a>(&'a self, endpoint: &'a dyn Endpoint) -> Next<'a> {
        let mut next = Next::endpoint(endpoint);
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Returns the names of all stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|m| m.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for constructing a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage. Stages run in the order they are added.
    #[must_use]
    pub fn stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::BoxFuture;
    use http::Method;
    use pylon_core::Empty;
    use std::sync::Mutex;

    type Trace = Arc<Mutex<Vec<String>>>;

    struct Tracing {
        name: &'static str,
        trace: Trace,
    }

    impl Middleware for Tracing {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(&'a self, ctx: &'a mut RequestContext, next: Next<'a>) -> BoxFuture<'a, ()> {
            Box::pin(async move {
                self.trace.lock().unwrap().push(format!("{}:in", self.name));
                next.run(ctx).await;
                self.trace.lock().unwrap().push(format!("{}:out", self.name));
            })
        }
    }

    struct Terminal(Trace);

    impl Endpoint for Terminal {
        fn call<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, ()> {
            Box::pin(async move {
                self.0.lock().unwrap().push("endpoint".to_string());
                ctx.set_response_view(Empty(StatusCode::NO_CONTENT));
            })
        }
    }

    #[tokio::test]
    async fn test_stages_wrap_in_order() {
        let trace = Trace::default();
        let pipeline = Pipeline::builder()
            .stage(Tracing {
                name: "outer",
                trace: Arc::clone(&trace),
            })
            .stage(Tracing {
                name: "inner",
                trace: Arc::clone(&trace),
            })
            .build();

        let mut ctx = RequestContext::new(Method::GET, "/".parse().unwrap());
        pipeline.process(&mut ctx, &Terminal(Arc::clone(&trace))).await;

        assert_eq!(
            *trace.lock().unwrap(),
            vec!["outer:in", "inner:in", "endpoint", "inner:out", "outer:out"]
        );
    }

    #[tokio::test]
    async fn test_no_response_falls_back_to_bad_request() {
        let pipeline = Pipeline::builder().build();
        let mut ctx = RequestContext::new(Method::GET, "/".parse().unwrap());
        let response = pipeline.process(&mut ctx, &Terminal(Trace::default())).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_standard_pipeline_shapes_view() {
        let pipeline = Pipeline::standard(&PipelineConfig::default());
        let expected: Vec<_> = Stage::all().iter().map(|s| s.name()).collect();
        assert_eq!(pipeline.stage_names(), expected);

        let mut ctx = RequestContext::new(Method::DELETE, "/artists/1".parse().unwrap());
        let response = pipeline.process(&mut ctx, &Terminal(Trace::default())).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response
            .headers()
            .contains_key(http::header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}
