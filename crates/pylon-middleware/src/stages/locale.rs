//! Locale negotiation stage.
//!
//! Resolves `Accept-Language` once per request and attaches the result to
//! the context. Everything downstream renders messages with
//! [`RequestContext::translator`].

use crate::middleware::{BoxFuture, Middleware, Next};
use http::header::ACCEPT_LANGUAGE;
use pylon_core::RequestContext;
use pylon_i18n::LocaleNegotiator;

/// Attaches the negotiated locale.
#[derive(Debug, Clone, Default)]
pub struct LocaleMiddleware {
    negotiator: LocaleNegotiator,
}

impl LocaleMiddleware {
    /// Creates the stage around a prebuilt negotiator.
    #[must_use]
    pub const fn new(negotiator: LocaleNegotiator) -> Self {
        Self { negotiator }
    }
}

impl Middleware for LocaleMiddleware {
    fn name(&self) -> &'static str {
        "locale"
    }

    fn process<'a>(&'a self, ctx: &'a mut RequestContext, next: Next<'a>) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let negotiated = self.negotiator.negotiate(ctx.header(ACCEPT_LANGUAGE));
            let locale = negotiated.locale();
            if !ctx.set_locale(negotiated) {
                tracing::debug!(request_id = %ctx.request_id(), "locale already attached");
            } else {
                tracing::trace!(locale = locale.as_str(), "locale negotiated");
            }
            next.run(ctx).await;
        })
    }
}
