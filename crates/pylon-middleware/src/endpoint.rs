//! Terminal links of the chain.
//!
//! An [`Endpoint`] sits behind the last stage. [`HandlerEndpoint`] binds a
//! typed request, invokes a [`Handler`] and records its outcome.
//! [`NotFoundEndpoint`] answers requests no route matched.

use crate::middleware::BoxFuture;
use http::StatusCode;
use pylon_bind::{Binder, RequestView};
use pylon_core::{ErrorBody, Handler, Payload, PylonError, RequestContext, ResponseView};
use std::marker::PhantomData;

/// The end of a chain.
pub trait Endpoint: Send + Sync + 'static {
    /// Runs against the context. Results are recorded on it.
    fn call<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, ()>;
}

/// Binds `Req`, runs `H`, and records `Res` or the error.
///
/// # Example
///
/// ```rust,ignore
/// use pylon_middleware::HandlerEndpoint;
///
/// let endpoint = HandlerEndpoint::new(GetArtist::new(repo));
/// server_builder.route(Method::GET, "/artists/{id}", endpoint);
/// ```
pub struct HandlerEndpoint<Req, Res, H> {
    handler: H,
    binder: Binder,
    _marker: PhantomData<fn() -> (Req, Res)>,
}

impl<Req, Res, H> HandlerEndpoint<Req, Res, H>
where
    Req: RequestView,
    Res: ResponseView,
    H: Handler<Req, Res>,
{
    /// Wraps a handler with the default binder.
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            binder: Binder::new(),
            _marker: PhantomData,
        }
    }

    /// Replaces the binder, e.g. to change the body cap.
    #[must_use]
    pub fn with_binder(mut self, binder: Binder) -> Self {
        self.binder = binder;
        self
    }

    /// Returns the wrapped handler.
    pub const fn handler(&self) -> &H {
        &self.handler
    }
}

impl<Req, Res, H> Endpoint for HandlerEndpoint<Req, Res, H>
where
    Req: RequestView,
    Res: ResponseView,
    H: Handler<Req, Res>,
{
    fn call<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            if ctx.is_aborted() {
                tracing::debug!(request_id = %ctx.request_id(), "request aborted before binding");
                return;
            }

            let request = match self.binder.bind_context::<Req>(ctx) {
                Ok(request) => request,
                Err(err) => {
                    tracing::debug!(
                        request_id = %ctx.request_id(),
                        bind.source = %err.bind_source(),
                        bind.code = err.error_code(),
                        "binding failed"
                    );
                    ctx.record_error(err.into());
                    return;
                }
            };

            if ctx.set_request_view(request).is_err() {
                ctx.record_error(PylonError::from(anyhow::anyhow!(
                    "request view already bound"
                )));
                return;
            }

            if ctx.is_aborted() {
                tracing::debug!(request_id = %ctx.request_id(), "request aborted before handler");
                return;
            }

            let outcome = match ctx.request_view::<Req>() {
                Some(request) => self.handler.handle(request).await,
                None => Err(PylonError::from(anyhow::anyhow!("request view missing"))),
            };

            match outcome {
                Ok(view) => ctx.set_response_view(view),
                Err(err) => ctx.record_error(err),
            }
        })
    }
}

/// Answers unmatched routes with 404 and a `route not found` envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotFoundEndpoint;

impl Endpoint for NotFoundEndpoint {
    fn call<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let message = ctx
                .translator()
                .message("error.route_not_found", &[])
                .unwrap_or_else(|| "route not found".to_string());
            tracing::debug!(http.method = %ctx.method(), http.path = ctx.path(), "no route matched");
            ctx.set_response_view(Payload::new(ErrorBody::new(message)).with_status(StatusCode::NOT_FOUND));
        })
    }
}
