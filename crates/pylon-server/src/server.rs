//! HTTP server.
//!
//! The server owns the router and the pipeline. For every request it
//! collects the body under the configured cap, builds a
//! [`RequestContext`], picks the endpoint for the route and hands both to
//! [`Pipeline::process`].
//!
//! # Example
//!
//! ```rust,ignore
//! use pylon_middleware::HandlerEndpoint;
//! use pylon_server::{Server, ServerConfig};
//! use http::Method;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::builder()
//!         .config(ServerConfig::builder().http_addr("0.0.0.0:8080").build())
//!         .route(Method::GET, "/artists/{id}", HandlerEndpoint::new(GetArtist::new(repo)))
//!         .build();
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::request::Parts;
use http::{Method, Request};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use pylon_core::{BodyError, Params, RequestContext, Response};
use pylon_middleware::{Endpoint, NotFoundEndpoint, Pipeline, PipelineConfig};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

use crate::config::ServerConfig;
use crate::router::Router;
use crate::shutdown::{ConnectionTracker, InFlightRequests, ShutdownSignal};

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address does not parse.
    #[error("invalid address '{addr}': {reason}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Failed to bind to the configured address.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        /// The address.
        addr: SocketAddr,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// I/O error during server operation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The Pylon HTTP server.
pub struct Server {
    config: ServerConfig,
    pipeline: Pipeline,
    router: Router<Arc<dyn Endpoint>>,
    not_found: NotFoundEndpoint,
    in_flight: InFlightRequests,
}

impl Server {
    /// Creates a new server builder.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the pipeline every request runs through.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Returns the router.
    #[must_use]
    pub fn router(&self) -> &Router<Arc<dyn Endpoint>> {
        &self.router
    }

    /// Returns the registry of requests currently in the pipeline.
    #[must_use]
    pub fn in_flight(&self) -> &InFlightRequests {
        &self.in_flight
    }

    /// Runs the server until SIGTERM or SIGINT.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Binds the configured address and serves until `shutdown` triggers.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|e| ServerError::InvalidAddress {
                addr: self.config.http_addr().to_string(),
                reason: e.to_string(),
            })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        self.serve(listener, shutdown).await
    }

    /// Serves connections from `listener` until `shutdown` triggers.
    ///
    /// After the signal, no new connection is accepted, requests still in
    /// the pipeline are marked aborted, and open connections get up to the
    /// shutdown timeout to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener address cannot be read.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, routes = self.router.route_count(), "server listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let server = Arc::clone(&server);
                            let token = tracker.acquire();
                            let shutdown = shutdown.clone();

                            tokio::spawn(async move {
                                if let Err(e) = server.handle_connection(stream, remote_addr, shutdown).await {
                                    tracing::debug!(client_addr = %remote_addr, error = %e, "connection error");
                                }
                                drop(token);
                            });
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed to accept connection");
                        }
                    }
                }

                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, stopping server");
                    break;
                }
            }
        }

        let aborted = server.in_flight.abort_all();
        let shutdown_timeout = server.config.shutdown_timeout();
        tracing::info!(
            connections = tracker.active_connections(),
            aborted,
            timeout = ?shutdown_timeout,
            "draining connections"
        );

        tokio::select! {
            () = tracker.wait_for_shutdown() => {
                tracing::info!("all connections closed");
            }
            () = tokio::time::sleep(shutdown_timeout) => {
                tracing::warn!(
                    connections = tracker.active_connections(),
                    "shutdown timeout reached"
                );
            }
        }

        tracing::info!("server stopped");
        Ok(())
    }

    async fn handle_connection(
        self: &Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(self);

        let service = service_fn(move |req: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle_incoming(req, remote_addr).await) }
        });

        let conn = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                tracing::debug!(client_addr = %remote_addr, "closing connection for shutdown");
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    async fn handle_incoming(&self, req: Request<Incoming>, remote_addr: SocketAddr) -> Response {
        let (parts, body) = req.into_parts();
        let body = self.collect_body(body).await;
        self.dispatch(parts, body, Some(remote_addr)).await
    }

    /// Reads the body, stopping at the cap or the request timeout.
    async fn collect_body(&self, body: Incoming) -> Result<Bytes, BodyError> {
        let limit = self.config.max_body_bytes();
        let collect = Limited::new(body, limit).collect();

        match tokio::time::timeout(self.config.request_timeout(), collect).await {
            Ok(Ok(collected)) => Ok(collected.to_bytes()),
            Ok(Err(err)) if err.downcast_ref::<LengthLimitError>().is_some() => {
                Err(BodyError::TooLarge { limit })
            }
            Ok(Err(err)) => Err(BodyError::Read(err.to_string())),
            Err(_) => Err(BodyError::Read("timed out".to_string())),
        }
    }

    /// Runs a fully received request through routing and the pipeline.
    ///
    /// This is the entry point the connection service uses once the body is
    /// collected. A body over the cap is treated as unreadable.
    pub async fn handle(&self, request: Request<Bytes>, remote_addr: Option<SocketAddr>) -> Response {
        let (parts, body) = request.into_parts();
        let limit = self.config.max_body_bytes();
        let body = if body.len() > limit {
            Err(BodyError::TooLarge { limit })
        } else {
            Ok(body)
        };
        self.dispatch(parts, body, remote_addr).await
    }

    async fn dispatch(
        &self,
        parts: Parts,
        body: Result<Bytes, BodyError>,
        remote_addr: Option<SocketAddr>,
    ) -> Response {
        let (endpoint, params): (&dyn Endpoint, Params) =
            match self.router.match_route(&parts.method, parts.uri.path()) {
                Some(route) => {
                    let (endpoint, params) = route.into_parts();
                    (endpoint.as_ref(), params)
                }
                None => (&self.not_found, Params::new()),
            };

        let mut ctx = RequestContext::new(parts.method, parts.uri)
            .with_headers(parts.headers)
            .with_path_params(params);
        ctx = match body {
            Ok(body) => ctx.with_body(body),
            Err(err) => {
                tracing::debug!(request_id = %ctx.request_id(), error = %err, "request body unavailable");
                ctx.with_body_error(err)
            }
        };
        if let Some(addr) = remote_addr {
            ctx = ctx.with_client_addr(addr);
        }

        let _in_flight = self.in_flight.register(ctx.request_id(), ctx.abort_handle());
        self.pipeline.process(&mut ctx, endpoint).await
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("pipeline", &self.pipeline)
            .field("routes", &self.router.routes())
            .finish_non_exhaustive()
    }
}

/// Builder for configuring and creating a [`Server`].
///
/// # Example
///
/// ```rust
/// use pylon_middleware::NotFoundEndpoint;
/// use pylon_server::{Server, ServerConfig};
/// use http::Method;
///
/// let server = Server::builder()
///     .config(ServerConfig::builder().http_addr("127.0.0.1:0").build())
///     .route(Method::GET, "/gone", NotFoundEndpoint)
///     .build();
///
/// assert_eq!(server.router().route_count(), 1);
/// ```
#[derive(Default)]
pub struct ServerBuilder {
    config: ServerConfig,
    pipeline: Option<Pipeline>,
    router: Router<Arc<dyn Endpoint>>,
}

impl ServerBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server configuration.
    #[must_use]
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the pipeline. Defaults to [`Pipeline::standard`] with default
    /// settings.
    #[must_use]
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Registers `endpoint` for `method` and the path template `pattern`.
    ///
    /// Templates accept `{name}` and `:name` placeholders.
    #[must_use]
    pub fn route<E: Endpoint>(mut self, method: Method, pattern: &str, endpoint: E) -> Self {
        self.router.add_route(method, pattern, Arc::new(endpoint));
        self
    }

    /// Builds the server.
    #[must_use]
    pub fn build(self) -> Server {
        Server {
            config: self.config,
            pipeline: self
                .pipeline
                .unwrap_or_else(|| Pipeline::standard(&PipelineConfig::default())),
            router: self.router,
            not_found: NotFoundEndpoint,
            in_flight: InFlightRequests::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use http_body_util::BodyExt;
    use pylon_core::{Empty, PylonError};
    use pylon_middleware::BoxFuture;

    struct Status(StatusCode);

    impl Endpoint for Status {
        fn call<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, ()> {
            Box::pin(async move { ctx.set_response_view(Empty(self.0)) })
        }
    }

    struct EchoParam;

    impl Endpoint for EchoParam {
        fn call<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, ()> {
            Box::pin(async move {
                let id = ctx.path_params().get("id").unwrap_or_default().to_string();
                ctx.set_response_view(pylon_core::Payload::new(id));
            })
        }
    }

    struct BodyCheck;

    impl Endpoint for BodyCheck {
        fn call<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, ()> {
            Box::pin(async move {
                if let Some(err) = ctx.body_error() {
                    let err = PylonError::invalid_parameters(err.to_string());
                    ctx.record_error(err);
                } else {
                    ctx.set_response_view(Empty(StatusCode::NO_CONTENT));
                }
            })
        }
    }

    fn server() -> Server {
        Server::builder()
            .config(ServerConfig::builder().max_body_bytes(8).build())
            .route(Method::GET, "/ping", Status(StatusCode::ACCEPTED))
            .route(Method::GET, "/artists/{id}", EchoParam)
            .route(Method::POST, "/upload", BodyCheck)
            .build()
    }

    fn request(method: Method, uri: &str, body: &'static str) -> Request<Bytes> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_routes_to_endpoint() {
        let response = server().handle(request(Method::GET, "/ping", ""), None).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_path_params_reach_context() {
        let response = server()
            .handle(request(Method::GET, "/artists/42", ""), None)
            .await;
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#""42""#);
    }

    #[tokio::test]
    async fn test_unmatched_route_is_404() {
        let response = server()
            .handle(request(Method::GET, "/missing", ""), None)
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_body_flagged() {
        let server = server();
        let small = server
            .handle(request(Method::POST, "/upload", "12345678"), None)
            .await;
        assert_eq!(small.status(), StatusCode::NO_CONTENT);

        let large = server
            .handle(request(Method::POST, "/upload", "123456789"), None)
            .await;
        assert_eq!(large.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_in_flight_released() {
        let server = server();
        server.handle(request(Method::GET, "/ping", ""), None).await;
        assert!(server.in_flight().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_address() {
        let server = Server::builder()
            .config(ServerConfig::builder().http_addr("nowhere").build())
            .build();
        let err = server
            .run_with_shutdown(ShutdownSignal::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::InvalidAddress { .. }));
    }
}
