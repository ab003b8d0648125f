//! # Pylon Core
//!
//! Core types and traits for the Pylon request pipeline.
//!
//! - [`RequestContext`] - Per-request state threaded through every stage
//! - [`RequestId`] - UUID v7 request identifier
//! - [`PylonError`] / [`ErrorKind`] - The error taxonomy
//! - [`FieldErrors`] / [`ErrorBody`] - Validation messages and the wire envelope
//! - [`ResponseView`] - Typed handler output
//! - [`Handler`] - The business handler contract

#![doc(html_root_url = "https://docs.rs/pylon-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod handler;
mod params;
mod response;

pub use context::{AbortHandle, BodyError, RequestContext, RequestId, Response};
pub use error::{ErrorBody, ErrorKind, FieldErrors, PylonError, PylonResult};
pub use handler::Handler;
pub use params::Params;
pub use response::{Empty, ErasedResponseView, ErrorResponse, Payload, ResponseView};
