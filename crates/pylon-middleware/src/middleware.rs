//! Core middleware trait and types.
//!
//! A stage receives the request context and a [`Next`] handle. Everything a
//! stage reads or produces lives on the context: the negotiated locale, the
//! bound request, the response view, the recorded error and finally the HTTP
//! response. Stages that work on the way out simply await `next` first.
//!
//! # Example
//!
//! ```
//! use pylon_core::RequestContext;
//! use pylon_middleware::{BoxFuture, Middleware, Next};
//!
//! struct Timing;
//!
//! impl Middleware for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn process<'a>(&'a self, ctx: &'a mut RequestContext, next: Next<'a>) -> BoxFuture<'a, ()> {
//!         Box::pin(async move {
//!             next.run(ctx).await;
//!             tracing::debug!(elapsed = ?ctx.elapsed(), "inner chain finished");
//!         })
//!     }
//! }
//! ```

use crate::endpoint::Endpoint;
use pylon_core::RequestContext;
use std::future::Future;
use std::pin::Pin;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A pipeline stage.
///
/// # Invariants
///
/// - A stage calls `next.run()` at most once. Not calling it short-circuits
///   the chain, and the stage is then responsible for the response.
/// - A stage never clears an error recorded downstream.
pub trait Middleware: Send + Sync + 'static {
    /// Returns the stage name, used in logs and for introspection.
    fn name(&self) -> &'static str;

    /// Runs this stage.
    fn process<'a>(&'a self, ctx: &'a mut RequestContext, next: Next<'a>) -> BoxFuture<'a, ()>;
}

/// The rest of the chain.
///
/// Consumed by [`Next::run`], so it can only be invoked once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Endpoint(&'a dyn Endpoint),
}

impl<'a> Next<'a> {
    /// Wraps `next` with `middleware`.
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// The terminal link: invoke the endpoint.
    pub(crate) fn endpoint(endpoint: &'a dyn Endpoint) -> Self {
        Self {
            inner: NextInner::Endpoint(endpoint),
        }
    }

    /// Invokes the next stage or the endpoint.
    pub async fn run(self, ctx: &mut RequestContext) {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(ctx, *next).await,
            NextInner::Endpoint(endpoint) => endpoint.call(ctx).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode};
    use pylon_core::Empty;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counting {
        name: &'static str,
        seen: Arc<AtomicUsize>,
    }

    impl Middleware for Counting {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(&'a self, ctx: &'a mut RequestContext, next: Next<'a>) -> BoxFuture<'a, ()> {
            Box::pin(async move {
                self.seen.fetch_add(1, Ordering::SeqCst);
                next.run(ctx).await;
            })
        }
    }

    struct Accepted;

    impl Endpoint for Accepted {
        fn call<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, ()> {
            Box::pin(async move { ctx.set_response_view(Empty(StatusCode::ACCEPTED)) })
        }
    }

    #[tokio::test]
    async fn test_next_endpoint() {
        let mut ctx = RequestContext::new(Method::GET, "/".parse().unwrap());
        Next::endpoint(&Accepted).run(&mut ctx).await;
        assert_eq!(ctx.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_chain_runs_each_stage_once() {
        let seen = Arc::new(AtomicUsize::new(0));
        let first = Counting {
            name: "first",
            seen: Arc::clone(&seen),
        };
        let second = Counting {
            name: "second",
            seen: Arc::clone(&seen),
        };

        let mut ctx = RequestContext::new(Method::GET, "/".parse().unwrap());
        let chain = Next::new(&first, Next::new(&second, Next::endpoint(&Accepted)));
        chain.run(&mut ctx).await;

        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(ctx.status(), StatusCode::ACCEPTED);
    }
}
