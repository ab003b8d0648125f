//! Error classification and translation.
//!
//! When the inner chain recorded an error, this stage logs it and installs
//! an [`ErrorResponse`] view in place of whatever view was set. The
//! recorded error stays on the context.
//!
//! # Envelope
//!
//! ```json
//! { "message": "paramètres invalides", "context": { "email": "email est un champ obligatoire" } }
//! ```
//!
//! `message` is the kind's message in the negotiated locale. `context` only
//! appears for `InvalidParameters` with field errors. Unclassified errors
//! always render as `{"message":"internal error"}` with `500`.

use crate::middleware::{BoxFuture, Middleware, Next};
use pylon_core::{ErrorBody, ErrorKind, ErrorResponse, PylonError, RequestContext};
use pylon_telemetry::record_error;

/// Converts the recorded error into the client envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorHandlerMiddleware;

impl ErrorHandlerMiddleware {
    /// Creates the stage.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn log(ctx: &RequestContext, error: &PylonError, kind: ErrorKind) {
        let body = String::from_utf8_lossy(ctx.raw_body());
        let client_addr = ctx.client_addr().map(|addr| addr.to_string());

        if error.is_unclassified() {
            tracing::error!(
                error = %error,
                error.kind = ?kind,
                error.code = kind.code(),
                http.method = %ctx.method(),
                http.path = ctx.path(),
                client_addr = client_addr.as_deref(),
                request_body = %body,
                request_id = %ctx.request_id(),
                "unclassified error"
            );
        } else {
            tracing::warn!(
                error = %error,
                error.kind = ?kind,
                error.code = kind.code(),
                http.method = %ctx.method(),
                http.path = ctx.path(),
                client_addr = client_addr.as_deref(),
                request_body = %body,
                request_id = %ctx.request_id(),
                "request failed"
            );
        }
    }

    fn envelope(ctx: &RequestContext, error: &PylonError) -> ErrorResponse {
        let Some(kind) = error.kind() else {
            return ErrorResponse {
                body: ErrorBody::new(ErrorKind::Internal.message()),
                status: ErrorKind::Internal.status(),
            };
        };

        let message = ctx
            .translator()
            .message(kind.message_key(), &[])
            .unwrap_or_else(|| kind.message().to_string());
        let mut body = ErrorBody::new(message);
        if kind == ErrorKind::InvalidParameters {
            if let Some(fields) = error.field_errors() {
                body = body.with_context(fields.clone());
            }
        }

        ErrorResponse {
            body,
            status: kind.status(),
        }
    }
}

impl Middleware for ErrorHandlerMiddleware {
    fn name(&self) -> &'static str {
        "error_handler"
    }

    fn process<'a>(&'a self, ctx: &'a mut RequestContext, next: Next<'a>) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            next.run(ctx).await;

            let Some(error) = ctx.error() else {
                return;
            };
            let kind = error.classify();
            Self::log(ctx, error, kind);
            let response = Self::envelope(ctx, error);

            record_error(&format!("{kind:?}"));
            ctx.set_response_view(response);
        })
    }
}
