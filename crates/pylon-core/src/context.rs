//! Request-scoped context.
//!
//! A [`RequestContext`] is created when a request enters the server, passed
//! by `&mut` through every pipeline stage, and dropped when the response is
//! written. It is not `Clone`.

use crate::error::PylonError;
use crate::params::Params;
use crate::response::{ErasedResponseView, ResponseView};
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode, Uri};
use http_body_util::Full;
use pylon_i18n::{LocaleContext, Translator};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use uuid::Uuid;

/// The HTTP response type produced by the pipeline.
pub type Response = http::Response<Full<Bytes>>;

/// Unique identifier for a request.
///
/// Request IDs use UUID v7, so they sort by creation time.
///
/// ```
/// use pylon_core::RequestId;
///
/// let a = RequestId::new();
/// let b = RequestId::new();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Why the request body is unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BodyError {
    /// The body exceeded the configured cap.
    #[error("request body exceeds {limit} bytes")]
    TooLarge {
        /// The cap in bytes.
        limit: usize,
    },
    /// The transport failed while reading the body.
    #[error("failed to read request body: {0}")]
    Read(String),
}

/// Shared flag set when the transport gives up on a request.
///
/// The server keeps a clone and flips it on shutdown. The handler endpoint
/// checks it before invoking business code.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    /// Creates an unset handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the request as aborted.
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once [`abort`](Self::abort) was called.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-request state threaded through the pipeline.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use http::{Method, StatusCode};
/// use pylon_core::{Params, RequestContext};
///
/// let mut params = Params::new();
/// params.push("id", "7");
///
/// let ctx = RequestContext::new(Method::GET, "/artists/7".parse().unwrap())
///     .with_path_params(params)
///     .with_body(Bytes::new());
///
/// assert_eq!(ctx.path(), "/artists/7");
/// assert_eq!(ctx.path_params().get("id"), Some("7"));
/// assert_eq!(ctx.status(), StatusCode::OK);
/// ```
pub struct RequestContext {
    request_id: RequestId,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    client_addr: Option<SocketAddr>,
    raw_body: Bytes,
    body_error: Option<BodyError>,
    path_params: Params,
    locale: Option<LocaleContext>,
    request_view: Option<Box<dyn Any + Send + Sync>>,
    response_view: Option<Box<dyn ErasedResponseView>>,
    error: Option<PylonError>,
    status: StatusCode,
    response: Option<Response>,
    abort: AbortHandle,
    started_at: Instant,
}

impl RequestContext {
    /// Creates a context for a request with no headers and an empty body.
    #[must_use]
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            uri,
            headers: HeaderMap::new(),
            client_addr: None,
            raw_body: Bytes::new(),
            body_error: None,
            path_params: Params::new(),
            locale: None,
            request_view: None,
            response_view: None,
            error: None,
            status: StatusCode::OK,
            response: None,
            abort: AbortHandle::new(),
            started_at: Instant::now(),
        }
    }

    /// Sets the request headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the raw request body.
    #[must_use]
    pub fn with_body(mut self, body: Bytes) -> Self {
        self.raw_body = body;
        self
    }

    /// Records that the body could not be read.
    #[must_use]
    pub fn with_body_error(mut self, error: BodyError) -> Self {
        self.body_error = Some(error);
        self
    }

    /// Sets the path parameters captured by the router.
    #[must_use]
    pub fn with_path_params(mut self, params: Params) -> Self {
        self.path_params = params;
        self
    }

    /// Sets the peer address.
    #[must_use]
    pub fn with_client_addr(mut self, addr: SocketAddr) -> Self {
        self.client_addr = Some(addr);
        self
    }

    /// Shares an abort flag with the transport.
    #[must_use]
    pub fn with_abort_handle(mut self, abort: AbortHandle) -> Self {
        self.abort = abort;
        self
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the request method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub const fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the URI path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the raw query string, if any.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Returns the request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: impl http::header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the peer address.
    #[must_use]
    pub const fn client_addr(&self) -> Option<SocketAddr> {
        self.client_addr
    }

    /// Returns the body exactly as received.
    #[must_use]
    pub const fn raw_body(&self) -> &Bytes {
        &self.raw_body
    }

    /// Returns why the body is unavailable, if it is.
    #[must_use]
    pub const fn body_error(&self) -> Option<&BodyError> {
        self.body_error.as_ref()
    }

    /// Returns the captured path parameters.
    #[must_use]
    pub const fn path_params(&self) -> &Params {
        &self.path_params
    }

    /// Attaches the negotiated locale.
    ///
    /// Returns `false` and leaves the context unchanged if a locale was
    /// already attached.
    pub fn set_locale(&mut self, locale: LocaleContext) -> bool {
        if self.locale.is_some() {
            return false;
        }
        self.locale = Some(locale);
        true
    }

    /// Returns the negotiated locale.
    #[must_use]
    pub const fn locale(&self) -> Option<&LocaleContext> {
        self.locale.as_ref()
    }

    /// Returns the active translator, or English if no locale was attached.
    #[must_use]
    pub fn translator(&self) -> Translator {
        self.locale
            .as_ref()
            .map(|l| l.translator().clone())
            .unwrap_or_else(|| LocaleContext::default().translator().clone())
    }

    /// Stores the bound request view.
    ///
    /// A request view is written once. A second call hands the value back.
    pub fn set_request_view<T: Send + Sync + 'static>(&mut self, view: T) -> Result<(), T> {
        if self.request_view.is_some() {
            return Err(view);
        }
        self.request_view = Some(Box::new(view));
        Ok(())
    }

    /// Returns the bound request view if it has type `T`.
    #[must_use]
    pub fn request_view<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.request_view.as_ref()?.downcast_ref::<T>()
    }

    /// Returns `true` once a request view was bound.
    #[must_use]
    pub const fn has_request_view(&self) -> bool {
        self.request_view.is_some()
    }

    /// Stores the response view and adopts its status.
    pub fn set_response_view<V: ResponseView>(&mut self, view: V) {
        self.status = view.status();
        self.response_view = Some(Box::new(view));
    }

    /// Returns the response view.
    #[must_use]
    pub fn response_view(&self) -> Option<&dyn ErasedResponseView> {
        self.response_view.as_deref()
    }

    /// Records an error. A later error replaces an earlier one.
    pub fn record_error(&mut self, error: PylonError) {
        self.error = Some(error);
    }

    /// Returns the recorded error.
    #[must_use]
    pub const fn error(&self) -> Option<&PylonError> {
        self.error.as_ref()
    }

    /// Removes and returns the recorded error.
    pub fn take_error(&mut self) -> Option<PylonError> {
        self.error.take()
    }

    /// Returns the target status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the target status code.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Stores the finished HTTP response.
    pub fn set_response(&mut self, response: Response) {
        self.response = Some(response);
    }

    /// Returns the finished HTTP response.
    #[must_use]
    pub const fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    /// Returns the finished HTTP response for header edits.
    pub fn response_mut(&mut self) -> Option<&mut Response> {
        self.response.as_mut()
    }

    /// Removes and returns the finished HTTP response.
    pub fn take_response(&mut self) -> Option<Response> {
        self.response.take()
    }

    /// Returns a clone of the abort flag.
    #[must_use]
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Returns `true` if the transport abandoned this request.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.abort.is_aborted()
    }

    /// Returns when the request entered the server.
    #[must_use]
    pub const fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the time spent on this request so far.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("client_addr", &self.client_addr)
            .field("body_len", &self.raw_body.len())
            .field("locale", &self.locale.as_ref().map(LocaleContext::locale))
            .field("has_request_view", &self.request_view.is_some())
            .field("has_response_view", &self.response_view.is_some())
            .field("error", &self.error)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{Empty, Payload};
    use pylon_i18n::{Locale, LocaleNegotiator};

    fn ctx() -> RequestContext {
        RequestContext::new(Method::POST, Uri::from_static("/artists?x=1"))
    }

    #[test]
    fn test_request_id_display_is_uuid() {
        let id = RequestId::new();
        assert_eq!(id.to_string().len(), 36);
        assert_eq!(id.as_uuid().get_version_num(), 7);
    }

    #[test]
    fn test_path_and_query() {
        let ctx = ctx();
        assert_eq!(ctx.path(), "/artists");
        assert_eq!(ctx.query(), Some("x=1"));
    }

    #[test]
    fn test_locale_set_once() {
        let negotiator = LocaleNegotiator::default();
        let mut ctx = ctx();
        assert!(ctx.set_locale(negotiator.negotiate(Some("fr"))));
        assert!(!ctx.set_locale(negotiator.negotiate(Some("en"))));
        assert_eq!(ctx.locale().map(LocaleContext::locale), Some(Locale::Fr));
        assert_eq!(ctx.translator().locale(), Locale::Fr);
    }

    #[test]
    fn test_translator_defaults_to_english() {
        assert_eq!(ctx().translator().locale(), Locale::En);
    }

    #[test]
    fn test_request_view_written_once() {
        let mut ctx = ctx();
        assert!(ctx.set_request_view(5_u32).is_ok());
        assert_eq!(ctx.set_request_view(6_u32), Err(6));
        assert_eq!(ctx.request_view::<u32>(), Some(&5));
        assert!(ctx.request_view::<String>().is_none());
    }

    #[test]
    fn test_response_view_sets_status() {
        let mut ctx = ctx();
        ctx.set_response_view(Payload::new("ok").with_status(StatusCode::CREATED));
        assert_eq!(ctx.status(), StatusCode::CREATED);
        ctx.set_response_view(Empty(StatusCode::NO_CONTENT));
        assert_eq!(ctx.status(), StatusCode::NO_CONTENT);
        assert!(ctx.response_view().is_some());
    }

    #[test]
    fn test_later_error_replaces_earlier() {
        let mut ctx = ctx();
        ctx.record_error(PylonError::new(crate::ErrorKind::NotFound));
        ctx.record_error(PylonError::new(crate::ErrorKind::Forbidden));
        assert!(ctx.error().unwrap().is(crate::ErrorKind::Forbidden));
        assert!(ctx.take_error().is_some());
        assert!(ctx.error().is_none());
    }

    #[test]
    fn test_abort_handle_is_shared() {
        let handle = AbortHandle::new();
        let ctx = ctx().with_abort_handle(handle.clone());
        assert!(!ctx.is_aborted());
        handle.abort();
        assert!(ctx.is_aborted());
    }

    #[test]
    fn test_body_error_display() {
        let err = BodyError::TooLarge { limit: 1024 };
        assert_eq!(err.to_string(), "request body exceeds 1024 bytes");
    }
}
