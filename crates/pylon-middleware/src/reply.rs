//! Response builders shared by the stages.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::Full;
use pylon_core::{ErrorKind, Response};

/// A response with `status` and no body.
pub(crate) fn empty(status: StatusCode) -> Response {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

/// A JSON response.
pub(crate) fn json(status: StatusCode, body: Bytes) -> Response {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// The opaque 500 answer.
pub(crate) fn internal_error() -> Response {
    let body = format!(r#"{{"message":"{}"}}"#, ErrorKind::Internal.message());
    json(StatusCode::INTERNAL_SERVER_ERROR, Bytes::from(body))
}
