//! Response views.
//!
//! A handler returns a typed [`ResponseView`]. The view names an optional
//! payload and a status; the response shaper turns it into bytes. Views are
//! stored type-erased on the request context as [`ErasedResponseView`].

use crate::error::ErrorBody;
use bytes::Bytes;
use http::StatusCode;
use serde::Serialize;

/// The typed result of a handler.
///
/// If [`body`](ResponseView::body) returns `Some`, its JSON form is the
/// entire HTTP response body. Otherwise only the status is written.
///
/// ```
/// use pylon_core::ResponseView;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct ArtistBody {
///     id: u32,
///     name: String,
/// }
///
/// struct GetArtistResponse {
///     body: ArtistBody,
/// }
///
/// impl ResponseView for GetArtistResponse {
///     type Body = ArtistBody;
///
///     fn body(&self) -> Option<&ArtistBody> {
///         Some(&self.body)
///     }
/// }
/// ```
pub trait ResponseView: Send + Sync + 'static {
    /// The serialized payload type.
    type Body: Serialize;

    /// Returns the payload, if this view declares one.
    fn body(&self) -> Option<&Self::Body>;

    /// Returns the status to answer with.
    fn status(&self) -> StatusCode {
        StatusCode::OK
    }
}

/// Object-safe view of a [`ResponseView`].
pub trait ErasedResponseView: Send + Sync {
    /// Returns the view's status.
    fn view_status(&self) -> StatusCode;

    /// Serializes the payload, or returns `None` for a bare status.
    fn render_body(&self) -> Result<Option<Bytes>, serde_json::Error>;
}

impl<V: ResponseView> ErasedResponseView for V {
    fn view_status(&self) -> StatusCode {
        ResponseView::status(self)
    }

    fn render_body(&self) -> Result<Option<Bytes>, serde_json::Error> {
        self.body()
            .map(|body| serde_json::to_vec(body).map(Bytes::from))
            .transpose()
    }
}

/// A view that always carries `body`.
#[derive(Debug, Clone)]
pub struct Payload<T> {
    body: T,
    status: StatusCode,
}

impl<T> Payload<T> {
    /// Wraps `body` with status 200.
    pub const fn new(body: T) -> Self {
        Self {
            body,
            status: StatusCode::OK,
        }
    }

    /// Overrides the status.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Returns the wrapped body.
    pub const fn get(&self) -> &T {
        &self.body
    }
}

impl<T: Serialize + Send + Sync + 'static> ResponseView for Payload<T> {
    type Body = T;

    fn body(&self) -> Option<&T> {
        Some(&self.body)
    }

    fn status(&self) -> StatusCode {
        self.status
    }
}

/// A view with no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Empty(pub StatusCode);

impl Default for Empty {
    fn default() -> Self {
        Self(StatusCode::OK)
    }
}

impl ResponseView for Empty {
    type Body = ();

    fn body(&self) -> Option<&()> {
        None
    }

    fn status(&self) -> StatusCode {
        self.0
    }
}

/// The view the error handler installs in place of the handler's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    /// The envelope sent to the client.
    pub body: ErrorBody,
    /// The status for the error kind.
    pub status: StatusCode,
}

impl ResponseView for ErrorResponse {
    type Body = ErrorBody;

    fn body(&self) -> Option<&ErrorBody> {
        Some(&self.body)
    }

    fn status(&self) -> StatusCode {
        self.status
    }
}
