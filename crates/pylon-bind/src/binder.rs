//! The generic binder.
//!
//! Binding builds one JSON object out of the request and deserializes it
//! into the request type:
//!
//! ```text
//! body bytes ──parse──▶ { "body": {...} }
//! path / query ─coerce─▶ { "id": 7, ... }      ──merge──▶ T ──validate──▶ T
//! ```
//!
//! The raw body on the request context is only read, never rewritten.

use crate::error::{BindError, BindSource};
use crate::shape::{FieldSource, RequestView, BODY_KEY};
use crate::validate::Validator;
use pylon_core::{BodyError, Params, RequestContext};
use pylon_i18n::Translator;
use serde_json::{Map, Value};

/// Default cap on request body size (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// The raw request parts the binder reads.
#[derive(Debug, Clone, Copy)]
pub struct BindInput<'a> {
    body: &'a [u8],
    body_error: Option<&'a BodyError>,
    path_params: &'a Params,
    query: Option<&'a str>,
}

impl<'a> BindInput<'a> {
    /// Creates an input from a body and path parameters.
    #[must_use]
    pub const fn new(body: &'a [u8], path_params: &'a Params) -> Self {
        Self {
            body,
            body_error: None,
            path_params,
            query: None,
        }
    }

    /// Sets the raw query string.
    #[must_use]
    pub const fn with_query(mut self, query: Option<&'a str>) -> Self {
        self.query = query;
        self
    }

    /// Records that the body could not be read.
    #[must_use]
    pub const fn with_body_error(mut self, error: Option<&'a BodyError>) -> Self {
        self.body_error = error;
        self
    }

    /// Borrows the raw parts of a request context.
    #[must_use]
    pub fn from_context(ctx: &'a RequestContext) -> Self {
        Self::new(ctx.raw_body(), ctx.path_params())
            .with_query(ctx.query())
            .with_body_error(ctx.body_error())
    }
}

/// Binds and validates request views.
///
/// # Example
///
/// ```
/// use pylon_bind::{BindInput, Binder, FieldSpec, PrimitiveKind, RequestView, Rule, Shape};
/// use pylon_core::Params;
/// use pylon_i18n::{Locale, Translator};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Default, Serialize, Deserialize)]
/// #[serde(default)]
/// struct GetArtist {
///     id: u32,
/// }
///
/// impl RequestView for GetArtist {
///     fn shape() -> Shape {
///         Shape::new("GetArtist").field(FieldSpec::path("id", PrimitiveKind::U32).rule(Rule::Required))
///     }
/// }
///
/// let params: Params = [("id", "7")].into_iter().collect();
/// let translator = Translator::builtin(Locale::En);
/// let view: GetArtist = Binder::new()
///     .bind(&BindInput::new(b"", &params), &translator)
///     .unwrap();
/// assert_eq!(view.id, 7);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Binder {
    max_body_bytes: usize,
}

impl Default for Binder {
    fn default() -> Self {
        Self::new()
    }
}

impl Binder {
    /// Creates a binder with the default body cap.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Sets the body cap in bytes.
    #[must_use]
    pub const fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Returns the body cap in bytes.
    #[must_use]
    pub const fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Binds `T` from a request context, using its negotiated translator.
    ///
    /// # Errors
    ///
    /// See [`Binder::bind`].
    pub fn bind_context<T: RequestView>(&self, ctx: &RequestContext) -> Result<T, BindError> {
        self.bind(&BindInput::from_context(ctx), &ctx.translator())
    }

    /// Binds and validates `T`.
    ///
    /// # Errors
    ///
    /// - the body is unavailable or over the cap
    /// - the body is not JSON (only if the shape reads a body)
    /// - a path or query value does not coerce to its declared type
    /// - the merged object does not deserialize into `T`
    /// - a rule fails, in which case the error carries field messages
    pub fn bind<T: RequestView>(
        &self,
        input: &BindInput<'_>,
        translator: &Translator,
    ) -> Result<T, BindError> {
        let shape = T::shape();

        if let Some(err) = input.body_error {
            return Err(BindError::body_unavailable(err.to_string()));
        }
        if input.body.len() > self.max_body_bytes {
            let err = BodyError::TooLarge {
                limit: self.max_body_bytes,
            };
            return Err(BindError::body_unavailable(err.to_string()));
        }

        let mut root = Map::new();

        if shape.has_body() {
            let body = if input.body.iter().all(u8::is_ascii_whitespace) {
                Value::Object(Map::new())
            } else {
                serde_json::from_slice(input.body)
                    .map_err(|e| BindError::malformed_body(e.to_string()))?
            };
            root.insert(BODY_KEY.to_string(), body);
        }

        let query: Vec<(String, String)> = match input.query {
            Some(q) if !q.is_empty() => serde_urlencoded::from_str(q)
                .map_err(|e| BindError::invalid_parameter(BindSource::Query, "query", e.to_string()))?,
            _ => Vec::new(),
        };

        for field in shape.fields() {
            let (source, param, kind, raw) = match field.source() {
                FieldSource::Path { param, kind } => {
                    (BindSource::Path, *param, *kind, input.path_params.get(param))
                }
                FieldSource::Query { param, kind } => {
                    let raw = query
                        .iter()
                        .find(|(name, _)| name == param)
                        .map(|(_, value)| value.as_str());
                    (BindSource::Query, *param, *kind, raw)
                }
                FieldSource::Body => continue,
            };

            let Some(raw) = raw else {
                continue;
            };
            let value = kind
                .coerce(raw)
                .map_err(|e| BindError::invalid_parameter(source, param, e))?;
            root.insert(field.location().to_string(), value);
        }

        let view: T = serde_json::from_value(Value::Object(root))
            .map_err(|e| BindError::deserialization_failed(shape.name(), e.to_string()))?;

        let canonical = serde_json::to_value(&view)
            .map_err(|e| BindError::deserialization_failed(shape.name(), e.to_string()))?;
        Validator::new(translator)
            .validate(&shape, &canonical)
            .map_err(|errors| BindError::validation(shape.name(), errors))?;

        tracing::trace!(shape = shape.name(), "request bound");
        Ok(view)
    }
}
