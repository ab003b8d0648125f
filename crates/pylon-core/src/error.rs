//! Error taxonomy for Pylon.
//!
//! Every failure that reaches the pipeline boundary is a [`PylonError`].
//! Business code classifies a failure once, at the point where it knows what
//! went wrong, by attaching an [`ErrorKind`]. Anything left unclassified is
//! reported to clients as the generic internal error and never with its own
//! message.
//!
//! | Kind | Code | Status |
//! |---|---|---|
//! | `Undefined` | 100 | 500 |
//! | `NotImplemented` | 101 | 501 |
//! | `Database` | 200 | 500 |
//! | `DatabaseMigrate` | 201 | 500 |
//! | `DropProduction` | 202 | 500 |
//! | `InvalidParameters` | 300 | 400 |
//! | `NotFound` | 301 | 400 |
//! | `Unknown` | 302 | 500 |
//! | `ConfigurationFailed` | 303 | 500 |
//! | `Unauthorized` | 400 | 401 |
//! | `Forbidden` | 401 | 403 |
//! | `ExternalLib` | 500 | 500 |
//! | `Email` | 501 | 500 |
//! | `UserAlreadyExists` | 502 | 400 |
//! | `GenerateToken` | 503 | 500 |
//! | `InvalidToken` | 504 | 401 |
//! | `TokenExpired` | 505 | 401 |
//! | `InvalidCredentials` | 506 | 401 |
//! | `Internal` | 999 | 500 |
//!
//! `NotFound` answers 400 rather than 404. Existing clients depend on it.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Result type alias using [`PylonError`].
pub type PylonResult<T> = Result<T, PylonError>;

/// The closed set of error kinds a client can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Catch-all for errors nobody bothered to name.
    Undefined,
    /// Operation exists but is not implemented.
    NotImplemented,
    /// Storage layer failure.
    Database,
    /// Schema migration failure.
    DatabaseMigrate,
    /// Refusal to drop a production database.
    DropProduction,
    /// Request failed binding or validation.
    InvalidParameters,
    /// Requested entity does not exist.
    NotFound,
    /// Unknown failure.
    Unknown,
    /// Service configuration could not be loaded.
    ConfigurationFailed,
    /// Caller is not authenticated.
    Unauthorized,
    /// Caller is authenticated but not allowed.
    Forbidden,
    /// A third-party library failed.
    ExternalLib,
    /// Email templating or delivery failed.
    Email,
    /// Registration with an email that is already taken.
    UserAlreadyExists,
    /// Token issuance failed.
    GenerateToken,
    /// Token could not be verified.
    InvalidToken,
    /// Token is past its expiry.
    TokenExpired,
    /// Email or password mismatch.
    InvalidCredentials,
    /// Boundary kind for anything unclassified.
    Internal,
}

impl ErrorKind {
    /// Every kind, in code order.
    pub const ALL: [ErrorKind; 19] = [
        Self::Undefined,
        Self::NotImplemented,
        Self::Database,
        Self::DatabaseMigrate,
        Self::DropProduction,
        Self::InvalidParameters,
        Self::NotFound,
        Self::Unknown,
        Self::ConfigurationFailed,
        Self::Unauthorized,
        Self::Forbidden,
        Self::ExternalLib,
        Self::Email,
        Self::UserAlreadyExists,
        Self::GenerateToken,
        Self::InvalidToken,
        Self::TokenExpired,
        Self::InvalidCredentials,
        Self::Internal,
    ];

    /// Returns the stable machine code.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Undefined => 100,
            Self::NotImplemented => 101,
            Self::Database => 200,
            Self::DatabaseMigrate => 201,
            Self::DropProduction => 202,
            Self::InvalidParameters => 300,
            Self::NotFound => 301,
            Self::Unknown => 302,
            Self::ConfigurationFailed => 303,
            Self::Unauthorized => 400,
            Self::Forbidden => 401,
            Self::ExternalLib => 500,
            Self::Email => 501,
            Self::UserAlreadyExists => 502,
            Self::GenerateToken => 503,
            Self::InvalidToken => 504,
            Self::TokenExpired => 505,
            Self::InvalidCredentials => 506,
            Self::Internal => 999,
        }
    }

    /// Returns the translation key for this kind's client message.
    #[must_use]
    pub const fn message_key(self) -> &'static str {
        match self {
            Self::Undefined => "error.undefined",
            Self::NotImplemented => "error.not_implemented",
            Self::Database => "error.database",
            Self::DatabaseMigrate => "error.database_migrate",
            Self::DropProduction => "error.drop_production",
            Self::InvalidParameters => "error.invalid_parameters",
            Self::NotFound => "error.not_found",
            Self::Unknown => "error.unknown",
            Self::ConfigurationFailed => "error.configuration_failed",
            Self::Unauthorized => "error.unauthorized",
            Self::Forbidden => "error.forbidden",
            Self::ExternalLib => "error.external_lib",
            Self::Email => "error.email",
            Self::UserAlreadyExists => "error.user_already_exists",
            Self::GenerateToken => "error.generate_token",
            Self::InvalidToken => "error.invalid_token",
            Self::TokenExpired => "error.token_expired",
            Self::InvalidCredentials => "error.invalid_credentials",
            Self::Internal => "error.internal",
        }
    }

    /// Returns the canonical English message.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Undefined => "undefined error",
            Self::NotImplemented => "not implemented",
            Self::Database => "database error",
            Self::DatabaseMigrate => "database migrate error",
            Self::DropProduction => "production database cannot be dropped",
            Self::InvalidParameters => "invalid parameters",
            Self::NotFound => "not found",
            Self::Unknown => "unknown",
            Self::ConfigurationFailed => "configuration failed",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::ExternalLib => "external library error",
            Self::Email => "email error",
            Self::UserAlreadyExists => "user already exists",
            Self::GenerateToken => "error creating token",
            Self::InvalidToken => "invalid token",
            Self::TokenExpired => "token expired",
            Self::InvalidCredentials => "invalid credentials",
            Self::Internal => "internal error",
        }
    }

    /// Returns the HTTP status answered for this kind.
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::InvalidParameters | Self::NotFound | Self::UserAlreadyExists => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized
            | Self::InvalidCredentials
            | Self::InvalidToken
            | Self::TokenExpired => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            Self::Undefined
            | Self::Database
            | Self::DatabaseMigrate
            | Self::DropProduction
            | Self::Unknown
            | Self::ConfigurationFailed
            | Self::ExternalLib
            | Self::Email
            | Self::GenerateToken
            | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Standard error type for Pylon.
///
/// # Example
///
/// ```
/// use pylon_core::{ErrorKind, PylonError};
///
/// fn find(id: u32) -> Result<String, PylonError> {
///     if id == 0 {
///         return Err(PylonError::new(ErrorKind::NotFound));
///     }
///     Ok(format!("artist-{id}"))
/// }
///
/// let err = find(0).unwrap_err();
/// assert!(err.is(ErrorKind::NotFound));
/// assert_eq!(err.status_code(), http::StatusCode::BAD_REQUEST);
/// ```
#[derive(Debug, Error)]
pub enum PylonError {
    /// An error with a known kind.
    #[error("{kind}{}", detail_suffix(.detail))]
    Classified {
        /// The taxonomy entry.
        kind: ErrorKind,
        /// Extra text for logs. Never sent to clients.
        detail: Option<String>,
        /// Per-field messages, for `InvalidParameters`.
        field_errors: Option<FieldErrors>,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Anything that was not classified. Rendered as `Internal`.
    #[error(transparent)]
    Unclassified(#[from] anyhow::Error),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

impl PylonError {
    /// Creates a classified error with no extra context.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self::Classified {
            kind,
            detail: None,
            field_errors: None,
            source: None,
        }
    }

    /// Creates a classified error with a detail string for logs.
    #[must_use]
    pub fn with_detail(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self::Classified {
            kind,
            detail: Some(detail.into()),
            field_errors: None,
            source: None,
        }
    }

    /// Classifies an underlying error.
    ///
    /// This is the one place a foreign error picks up its kind. The source is
    /// kept for logging.
    pub fn wrap(kind: ErrorKind, source: impl Into<anyhow::Error>) -> Self {
        let source = source.into();
        Self::Classified {
            kind,
            detail: Some(source.to_string()),
            field_errors: None,
            source: Some(source),
        }
    }

    /// Creates an `InvalidParameters` error.
    #[must_use]
    pub fn invalid_parameters(detail: impl Into<String>) -> Self {
        Self::with_detail(ErrorKind::InvalidParameters, detail)
    }

    /// Creates an `InvalidParameters` error carrying per-field messages.
    #[must_use]
    pub fn invalid_fields(field_errors: FieldErrors) -> Self {
        Self::Classified {
            kind: ErrorKind::InvalidParameters,
            detail: Some(format!("{} field(s) failed validation", field_errors.len())),
            field_errors: Some(field_errors),
            source: None,
        }
    }

    /// Returns the kind, or `None` if unclassified.
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Classified { kind, .. } => Some(*kind),
            Self::Unclassified(_) => None,
        }
    }

    /// Returns the kind used at the boundary.
    #[must_use]
    pub const fn classify(&self) -> ErrorKind {
        match self.kind() {
            Some(kind) => kind,
            None => ErrorKind::Internal,
        }
    }

    /// Returns `true` if this error was classified as `kind`.
    #[must_use]
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == Some(kind)
    }

    /// Returns `true` if this error was never classified.
    #[must_use]
    pub const fn is_unclassified(&self) -> bool {
        matches!(self, Self::Unclassified(_))
    }

    /// Returns the field errors attached to this error.
    #[must_use]
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Classified { field_errors, .. } => field_errors.as_ref(),
            Self::Unclassified(_) => None,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.classify().status()
    }
}

impl From<ErrorKind> for PylonError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Per-field validation messages, keyed by wire-visible field name.
///
/// Each field holds one message. Adding a second message for the same field
/// replaces the first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Creates a new empty `FieldErrors`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the message for a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    /// Returns the message for a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Returns `true` if there are no field errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of fields with errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// The client-visible error envelope.
///
/// ```json
/// { "message": "invalid parameters", "context": { "email": "email is a required field" } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Translated message for the error kind.
    pub message: String,
    /// Field errors, present only for invalid parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<FieldErrors>,
}

impl ErrorBody {
    /// Creates an envelope with no field context.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
        }
    }

    /// Attaches field errors. An empty map is dropped.
    #[must_use]
    pub fn with_context(mut self, context: FieldErrors) -> Self {
        self.context = if context.is_empty() { None } else { Some(context) };
        self
    }
}
