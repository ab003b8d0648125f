//! Binding error types.
//!
//! Every binding failure is answered as `InvalidParameters`. Only a
//! validation failure carries per-field context.

use pylon_core::{ErrorKind, FieldErrors, PylonError};
use std::fmt;

/// Where the offending input came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindSource {
    /// Path parameters (e.g., `/artists/{id}`)
    Path,
    /// Query string parameters
    Query,
    /// Request body
    Body,
    /// The merged request object
    Shape,
}

impl fmt::Display for BindSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Query => write!(f, "query"),
            Self::Body => write!(f, "body"),
            Self::Shape => write!(f, "shape"),
        }
    }
}

/// Error that occurs while binding a request view.
///
/// ```rust
/// use pylon_bind::{BindError, BindSource};
/// use pylon_core::{ErrorKind, PylonError};
///
/// let err = BindError::invalid_parameter(BindSource::Path, "id", "invalid digit found in string");
/// assert_eq!(err.bind_source(), BindSource::Path);
/// assert_eq!(err.field(), Some("id"));
///
/// let err: PylonError = err.into();
/// assert!(err.is(ErrorKind::InvalidParameters));
/// assert!(err.field_errors().is_none());
/// ```
#[derive(Debug)]
pub struct BindError {
    bind_source: BindSource,
    kind: BindErrorKind,
    field: Option<String>,
    message: String,
}

#[derive(Debug)]
enum BindErrorKind {
    /// Body was too large or could not be read
    BodyUnavailable,
    /// Body is not valid JSON
    MalformedBody,
    /// Path or query value failed coercion
    InvalidParameter,
    /// Merged object does not fit the request type
    DeserializationFailed,
    /// One or more rules failed
    Validation(FieldErrors),
}

impl BindError {
    /// Creates an error for a body that is too large or failed to read.
    #[must_use]
    pub fn body_unavailable(details: impl Into<String>) -> Self {
        Self {
            bind_source: BindSource::Body,
            kind: BindErrorKind::BodyUnavailable,
            field: None,
            message: format!("request body unavailable: {}", details.into()),
        }
    }

    /// Creates an error for a body that is not valid JSON.
    #[must_use]
    pub fn malformed_body(details: impl Into<String>) -> Self {
        Self {
            bind_source: BindSource::Body,
            kind: BindErrorKind::MalformedBody,
            field: None,
            message: format!("malformed request body: {}", details.into()),
        }
    }

    /// Creates an error for a parameter that failed coercion.
    #[must_use]
    pub fn invalid_parameter(
        source: BindSource,
        field: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        let field = field.into();
        let details = details.into();
        Self {
            bind_source: source,
            kind: BindErrorKind::InvalidParameter,
            message: format!("invalid {source} parameter '{field}': {details}"),
            field: Some(field),
        }
    }

    /// Creates an error for a merged object that does not deserialize.
    #[must_use]
    pub fn deserialization_failed(shape: &str, details: impl Into<String>) -> Self {
        Self {
            bind_source: BindSource::Shape,
            kind: BindErrorKind::DeserializationFailed,
            field: None,
            message: format!("failed to deserialize {shape}: {}", details.into()),
        }
    }

    /// Creates an error for failed rules.
    #[must_use]
    pub fn validation(shape: &str, errors: FieldErrors) -> Self {
        Self {
            bind_source: BindSource::Shape,
            message: format!("{shape} failed validation on {} field(s)", errors.len()),
            kind: BindErrorKind::Validation(errors),
            field: None,
        }
    }

    /// Returns where the bad input came from.
    #[must_use]
    pub fn bind_source(&self) -> BindSource {
        self.bind_source
    }

    /// Returns the offending parameter, if there is a single one.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns the per-field messages of a validation failure.
    #[must_use]
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match &self.kind {
            BindErrorKind::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    /// Returns a stable code for logs.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self.kind {
            BindErrorKind::BodyUnavailable => "BODY_UNAVAILABLE",
            BindErrorKind::MalformedBody => "MALFORMED_BODY",
            BindErrorKind::InvalidParameter => "INVALID_PARAMETER",
            BindErrorKind::DeserializationFailed => "DESERIALIZATION_FAILED",
            BindErrorKind::Validation(_) => "VALIDATION_FAILED",
        }
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for BindError {}

impl From<BindError> for PylonError {
    fn from(err: BindError) -> Self {
        match err.kind {
            BindErrorKind::Validation(errors) => PylonError::invalid_fields(errors),
            _ => PylonError::with_detail(ErrorKind::InvalidParameters, err.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_body() {
        let err = BindError::malformed_body("expected value at line 1 column 1");
        assert_eq!(err.bind_source(), BindSource::Body);
        assert_eq!(err.error_code(), "MALFORMED_BODY");
        assert!(err.to_string().starts_with("malformed request body"));
    }

    #[test]
    fn test_validation_converts_with_fields() {
        let mut fields = FieldErrors::new();
        fields.add("name", "name is a required field");
        let err: PylonError = BindError::validation("CreateArtist", fields).into();
        assert!(err.is(ErrorKind::InvalidParameters));
        assert_eq!(
            err.field_errors().and_then(|f| f.get("name")),
            Some("name is a required field")
        );
    }

    #[test]
    fn test_detail_survives_conversion() {
        let err: PylonError = BindError::body_unavailable("request body exceeds 10 bytes").into();
        assert!(err.to_string().contains("exceeds 10 bytes"));
    }
}
