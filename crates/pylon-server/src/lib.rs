//! # Pylon Server
//!
//! HTTP server for the Pylon pipeline, built on Hyper and Tokio.
//!
//! - [`Server`] - Accept loop, body collection, routing, graceful shutdown
//! - [`Router`] - Method plus path-template matching (`{id}` or `:id`)
//! - [`ServerConfig`] - Bind address, timeouts and the body cap
//! - [`ShutdownSignal`] - SIGTERM/SIGINT or programmatic shutdown
//!
//! ## Request flow
//!
//! ```text
//! TCP → hyper http1 → collect body (capped) → route → RequestContext
//!     → Pipeline::process → Response
//! ```
//!
//! Unmatched routes go through the same pipeline with a
//! [`NotFoundEndpoint`](pylon_middleware::NotFoundEndpoint), so they still
//! get CORS headers and the error envelope.

#![doc(html_root_url = "https://docs.rs/pylon-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod router;
pub mod server;
pub mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use router::{RouteMatch, Router};
pub use server::{Server, ServerBuilder, ServerError};
pub use shutdown::{ConnectionTracker, InFlightRequests, ShutdownSignal};
