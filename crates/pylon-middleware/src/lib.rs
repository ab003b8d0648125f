//! # Pylon Middleware
//!
//! The request pipeline: an ordered list of [`Middleware`] stages ending in
//! an [`Endpoint`].
//!
//! ```text
//! Telemetry → CORS → Locale → Response Shaper → Error Handler → Endpoint
//!                                                                  │
//!                                       Binder → Validator → Handler
//! ```
//!
//! Stages communicate only through the [`RequestContext`](pylon_core::RequestContext).
//! The endpoint records a response view or an error. On the way out the
//! error handler turns an error into an envelope view, and the response
//! shaper serializes whichever view is left.
//!
//! ## Example
//!
//! ```rust,ignore
//! use pylon_middleware::{HandlerEndpoint, Pipeline, PipelineConfig};
//!
//! let pipeline = Pipeline::standard(&PipelineConfig::default());
//! let endpoint = HandlerEndpoint::new(CreateArtist::new(repo));
//! let response = pipeline.process(&mut ctx, &endpoint).await;
//! ```

#![doc(html_root_url = "https://docs.rs/pylon-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod endpoint;
pub mod middleware;
pub mod pipeline;
mod reply;
pub mod stages;

pub use endpoint::{Endpoint, HandlerEndpoint, NotFoundEndpoint};
pub use middleware::{BoxFuture, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline, PipelineBuilder, PipelineConfig, Stage};
