//! Request shapes.
//!
//! A [`Shape`] tells the binder where each field of a request view comes
//! from and which rules it must satisfy. Shapes are written by hand next to
//! the request type:
//!
//! ```
//! use pylon_bind::{FieldSpec, PrimitiveKind, RequestView, Rule, Shape};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! #[serde(default)]
//! struct RenameArtist {
//!     id: u32,
//!     body: RenameArtistBody,
//! }
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! #[serde(default)]
//! struct RenameArtistBody {
//!     name: String,
//! }
//!
//! impl RequestView for RenameArtist {
//!     fn shape() -> Shape {
//!         Shape::new("RenameArtist")
//!             .with_body()
//!             .field(FieldSpec::path("id", PrimitiveKind::U32).rule(Rule::Required))
//!             .field(FieldSpec::body("body.name").rule(Rule::Required).rule(Rule::MaxLength(255)))
//!     }
//! }
//! ```

use crate::rules::Rule;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Key under which the request body is nested in the merged object.
pub const BODY_KEY: &str = "body";

/// A bound request type.
///
/// Types implementing this trait should use `#[serde(default)]` so that
/// absent fields take their zero value. Presence is the validator's job.
pub trait RequestView: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Returns the binding schema for this type.
    fn shape() -> Shape;
}

/// Scalar types a path or query parameter can be coerced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    /// Passed through unchanged.
    Str,
    /// `true` or `false`.
    Bool,
    /// 8-bit unsigned.
    U8,
    /// 16-bit unsigned.
    U16,
    /// 32-bit unsigned.
    U32,
    /// 64-bit unsigned.
    U64,
    /// 8-bit signed.
    I8,
    /// 16-bit signed.
    I16,
    /// 32-bit signed.
    I32,
    /// 64-bit signed.
    I64,
}

impl PrimitiveKind {
    /// Parses `raw` into a JSON value of this kind.
    ///
    /// Integers are parsed base 10 into the exact width, so out-of-range
    /// values fail here rather than wrapping. Unsigned kinds take digits
    /// only; a leading `+` is accepted for signed kinds.
    pub fn coerce(self, raw: &str) -> Result<Value, String> {
        fn int<T>(raw: &str) -> Result<Value, String>
        where
            T: std::str::FromStr + Into<Value>,
            T::Err: fmt::Display,
        {
            raw.parse::<T>().map(Into::into).map_err(|e| e.to_string())
        }

        fn uint<T>(raw: &str) -> Result<Value, String>
        where
            T: std::str::FromStr + Into<Value>,
            T::Err: fmt::Display,
        {
            if raw.starts_with('+') {
                return Err("invalid digit found in string".to_string());
            }
            int::<T>(raw)
        }

        match self {
            Self::Str => Ok(Value::String(raw.to_string())),
            Self::Bool => raw
                .parse::<bool>()
                .map(Value::Bool)
                .map_err(|e| e.to_string()),
            Self::U8 => uint::<u8>(raw),
            Self::U16 => uint::<u16>(raw),
            Self::U32 => uint::<u32>(raw),
            Self::U64 => uint::<u64>(raw),
            Self::I8 => int::<i8>(raw),
            Self::I16 => int::<i16>(raw),
            Self::I32 => int::<i32>(raw),
            Self::I64 => int::<i64>(raw),
        }
    }

    /// Returns a short name for log lines.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Str => "string",
            Self::Bool => "bool",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
        }
    }
}

/// Where a field's value comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSource {
    /// A path parameter, coerced to `kind`.
    Path {
        /// Parameter name in the route template.
        param: &'static str,
        /// Target scalar type.
        kind: PrimitiveKind,
    },
    /// A query string parameter, coerced to `kind`.
    Query {
        /// Parameter name in the query string.
        param: &'static str,
        /// Target scalar type.
        kind: PrimitiveKind,
    },
    /// Part of the JSON body.
    Body,
}

/// One field of a [`Shape`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    location: &'static str,
    source: FieldSource,
    optional: bool,
    rules: Vec<Rule>,
}

impl FieldSpec {
    /// A top-level field filled from the path parameter of the same name.
    #[must_use]
    pub fn path(name: &'static str, kind: PrimitiveKind) -> Self {
        Self::new(name, FieldSource::Path { param: name, kind })
    }

    /// A top-level field filled from the query parameter of the same name.
    #[must_use]
    pub fn query(name: &'static str, kind: PrimitiveKind) -> Self {
        Self::new(name, FieldSource::Query { param: name, kind })
    }

    /// A field inside the body, addressed by dotted path from the root,
    /// e.g. `body.email`.
    #[must_use]
    pub fn body(location: &'static str) -> Self {
        Self::new(location, FieldSource::Body)
    }

    fn new(location: &'static str, source: FieldSource) -> Self {
        Self {
            location,
            source,
            optional: false,
            rules: Vec::new(),
        }
    }

    /// Reads the value from a differently named path or query parameter.
    #[must_use]
    pub fn param(mut self, name: &'static str) -> Self {
        match &mut self.source {
            FieldSource::Path { param, .. } | FieldSource::Query { param, .. } => *param = name,
            FieldSource::Body => {}
        }
        self
    }

    /// Skips every rule when the value is empty.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Appends a rule. Rules run in the order they are added.
    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Returns the dotted location in the merged object.
    #[must_use]
    pub const fn location(&self) -> &'static str {
        self.location
    }

    /// Returns the name clients see in error context: the last path segment.
    #[must_use]
    pub fn wire_name(&self) -> &'static str {
        self.location.rsplit('.').next().unwrap_or(self.location)
    }

    /// Returns where the value comes from.
    #[must_use]
    pub const fn source(&self) -> &FieldSource {
        &self.source
    }

    /// Returns `true` if empty values skip validation.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    /// Returns the rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

/// The binding schema of one request type.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    name: &'static str,
    body: bool,
    fields: Vec<FieldSpec>,
}

impl Shape {
    /// Creates a shape with no body and no fields.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            body: false,
            fields: Vec::new(),
        }
    }

    /// Declares that the JSON body is nested under [`BODY_KEY`].
    #[must_use]
    pub fn with_body(mut self) -> Self {
        self.body = true;
        self
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Returns the shape name, used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if the shape reads the request body.
    #[must_use]
    pub const fn has_body(&self) -> bool {
        self.body
    }

    /// Returns the declared fields.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }
}

/// Looks up a dotted path in a JSON object.
pub(crate) fn lookup<'v>(root: &'v Value, location: &str) -> Option<&'v Value> {
    location
        .split('.')
        .try_fold(root, |value, segment| value.get(segment))
}
