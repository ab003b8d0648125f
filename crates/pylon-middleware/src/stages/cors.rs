//! CORS (Cross-Origin Resource Sharing) middleware.
//!
//! The policy is permissive by default: any origin, credentials allowed,
//! and a fixed list of methods and headers. Every response carries the
//! headers, including error and not-found responses.
//!
//! ## Preflight Requests
//!
//! `OPTIONS` requests are answered here with `200` and an empty body.
//! Locale negotiation, binding and the handler never run for them.
//!
//! ## Example
//!
//! ```
//! use pylon_middleware::stages::{CorsConfig, CorsMiddleware};
//! use std::time::Duration;
//!
//! let cors = CorsMiddleware::new(
//!     CorsConfig::default()
//!         .allow_origin("https://app.example.com")
//!         .allow_credentials(false)
//!         .max_age(Duration::from_secs(600)),
//! );
//! # let _ = cors;
//! ```

use crate::middleware::{BoxFuture, Middleware, Next};
use crate::reply;
use http::header::{
    HeaderMap, HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS,
    ACCESS_CONTROL_MAX_AGE,
};
use http::{Method, StatusCode};
use pylon_core::RequestContext;
use std::time::Duration;

const DEFAULT_METHODS: [&str; 7] = ["POST", "GET", "OPTIONS", "PUT", "DELETE", "UPDATE", "PATCH"];

const DEFAULT_HEADERS: [&str; 12] = [
    "Origin",
    "Content-Type",
    "Content-Length",
    "Accept-Encoding",
    "Accept",
    "Authorization",
    "Two-Factor-Code",
    "Recaptcha",
    "Lang",
    "Country",
    "Session-Id",
    "Api-Key",
];

/// CORS policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    allow_origin: String,
    allow_methods: Vec<String>,
    allow_headers: Vec<String>,
    expose_headers: Vec<String>,
    allow_credentials: bool,
    max_age: Option<Duration>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origin: "*".to_string(),
            allow_methods: DEFAULT_METHODS.iter().map(ToString::to_string).collect(),
            allow_headers: DEFAULT_HEADERS.iter().map(ToString::to_string).collect(),
            expose_headers: vec!["Content-Length".to_string()],
            allow_credentials: true,
            max_age: Some(Duration::from_secs(86400)),
        }
    }
}

impl CorsConfig {
    /// Sets `Access-Control-Allow-Origin`.
    #[must_use]
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.allow_origin = origin.into();
        self
    }

    /// Replaces the allowed methods.
    #[must_use]
    pub fn allow_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_methods = methods.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the allowed request headers.
    #[must_use]
    pub fn allow_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the headers exposed to scripts.
    #[must_use]
    pub fn expose_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expose_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    /// Sets `Access-Control-Allow-Credentials`.
    #[must_use]
    pub const fn allow_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }

    /// Sets the preflight cache duration.
    #[must_use]
    pub const fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Writes the CORS headers into `headers`.
    ///
    /// Values that are not valid header text are skipped.
    pub fn apply(&self, headers: &mut HeaderMap) {
        let mut set = |name: HeaderName, value: &str| {
            if value.is_empty() {
                return;
            }
            match HeaderValue::from_str(value) {
                Ok(value) => {
                    headers.insert(name, value);
                }
                Err(_) => tracing::warn!(header = %name, "skipping invalid CORS header value"),
            }
        };

        set(ACCESS_CONTROL_ALLOW_ORIGIN, &self.allow_origin);
        set(ACCESS_CONTROL_ALLOW_METHODS, &self.allow_methods.join(", "));
        set(ACCESS_CONTROL_ALLOW_HEADERS, &self.allow_headers.join(", "));
        set(ACCESS_CONTROL_EXPOSE_HEADERS, &self.expose_headers.join(", "));
        if self.allow_credentials {
            set(ACCESS_CONTROL_ALLOW_CREDENTIALS, "true");
        }
        if let Some(max_age) = self.max_age {
            set(ACCESS_CONTROL_MAX_AGE, &max_age.as_secs().to_string());
        }
    }
}

/// Adds CORS headers and answers preflight requests.
#[derive(Debug, Clone, Default)]
pub struct CorsMiddleware {
    config: CorsConfig,
}

impl CorsMiddleware {
    /// Creates the stage with `config`.
    #[must_use]
    pub const fn new(config: CorsConfig) -> Self {
        Self { config }
    }

    /// Returns the policy.
    #[must_use]
    pub const fn config(&self) -> &CorsConfig {
        &self.config
    }
}

impl Middleware for CorsMiddleware {
    fn name(&self) -> &'static str {
        "cors"
    }

    fn process<'a>(&'a self, ctx: &'a mut RequestContext, next: Next<'a>) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            if *ctx.method() == Method::OPTIONS {
                let mut response = reply::empty(StatusCode::OK);
                self.config.apply(response.headers_mut());
                ctx.set_status(StatusCode::OK);
                ctx.set_response(response);
                return;
            }

            next.run(ctx).await;

            if let Some(response) = ctx.response_mut() {
                self.config.apply(response.headers_mut());
            }
        })
    }
}
