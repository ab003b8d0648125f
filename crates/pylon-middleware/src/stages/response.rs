//! Response shaping stage.
//!
//! Turns the response view left on the context into the HTTP response.
//! Runs its work after the inner chain returns, which includes the error
//! handler, so an error view is shaped like any other.
//!
//! | Context after the chain | Written |
//! |-------------------------|---------|
//! | view with a payload | JSON payload, `ctx.status()` |
//! | view without a payload | bare `ctx.status()` |
//! | no view | bare `400` |
//! | payload fails to serialize | `{"message":"internal error"}`, `500` |

use crate::middleware::{BoxFuture, Middleware, Next};
use crate::reply;
use http::StatusCode;
use pylon_core::RequestContext;

/// Serializes the response view.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseShaper;

impl ResponseShaper {
    /// Creates the stage.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn shape(ctx: &RequestContext) -> pylon_core::Response {
        let Some(view) = ctx.response_view() else {
            if !ctx.is_aborted() {
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    http.method = %ctx.method(),
                    http.path = ctx.path(),
                    "no response view and no error; answering 400"
                );
            }
            return reply::empty(StatusCode::BAD_REQUEST);
        };

        match view.render_body() {
            Ok(Some(body)) => reply::json(ctx.status(), body),
            Ok(None) => reply::empty(ctx.status()),
            Err(err) => {
                tracing::error!(
                    request_id = %ctx.request_id(),
                    error = %err,
                    "failed to serialize response view"
                );
                reply::internal_error()
            }
        }
    }
}

impl Middleware for ResponseShaper {
    fn name(&self) -> &'static str {
        "response"
    }

    fn process<'a>(&'a self, ctx: &'a mut RequestContext, next: Next<'a>) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            next.run(ctx).await;
            let response = Self::shape(ctx);
            ctx.set_response(response);
        })
    }
}
