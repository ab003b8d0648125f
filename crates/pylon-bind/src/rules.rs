//! Field rules.
//!
//! Every rule runs against the value as it is, zero values included. Only
//! a field marked [`optional`](crate::FieldSpec::optional) skips its rules
//! when empty. To report "required" rather than "invalid email" for an
//! empty string, declare `Required` after the format rule: the last
//! failing rule's message wins.

use crate::shape::lookup;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// A constraint on one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Value must be non-empty.
    Required,
    /// At least `n` characters (strings) or items (arrays).
    MinLength(usize),
    /// At most `n` characters (strings) or items (arrays).
    MaxLength(usize),
    /// Exactly `n` characters (strings) or items (arrays).
    Length(usize),
    /// Number must be `>=` the bound.
    Min(f64),
    /// Number must be `<=` the bound.
    Max(f64),
    /// String must look like an email address.
    Email,
    /// String must be an E.164 phone number.
    E164,
    /// String must parse with the given chrono format, e.g. `%Y-%m-%d`.
    DateFormat(&'static str),
    /// String must be one of the listed values.
    OneOf(&'static [&'static str]),
    /// Required when the field at `field` equals `equals`.
    RequiredIf {
        /// Dotted location of the other field.
        field: &'static str,
        /// Value that triggers the requirement.
        equals: &'static str,
    },
    /// Required when the field at this dotted location is non-empty.
    RequiredWith(&'static str),
}

impl Rule {
    /// Returns the tag used for message lookup (`validation.<tag>`).
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::MinLength(_) => "min",
            Self::MaxLength(_) => "max",
            Self::Length(_) => "len",
            Self::Min(_) => "gte",
            Self::Max(_) => "lte",
            Self::Email => "email",
            Self::E164 => "e164",
            Self::DateFormat(_) => "datetime",
            Self::OneOf(_) => "oneof",
            Self::RequiredIf { .. } => "required_if",
            Self::RequiredWith(_) => "required_with",
        }
    }

    /// Returns the rule parameter as shown in messages.
    #[must_use]
    pub fn param(&self) -> String {
        match self {
            Self::Required | Self::Email | Self::E164 => String::new(),
            Self::MinLength(n) | Self::MaxLength(n) | Self::Length(n) => n.to_string(),
            Self::Min(n) | Self::Max(n) => n.to_string(),
            Self::DateFormat(format) => human_layout(format),
            Self::OneOf(values) => values.join(" "),
            Self::RequiredIf { field, equals } => format!("{field} {equals}"),
            Self::RequiredWith(field) => (*field).to_string(),
        }
    }

    /// Returns `true` if `value` satisfies the rule.
    ///
    /// `root` is the whole request object, used by the conditional rules.
    #[must_use]
    pub fn check(&self, value: Option<&Value>, root: &Value) -> bool {
        let empty = is_empty(value);
        match self {
            Self::Required => !empty,
            Self::RequiredIf { field, equals } => {
                let triggered = lookup(root, field).is_some_and(|v| scalar_eq(v, equals));
                !triggered || !empty
            }
            Self::RequiredWith(field) => is_empty(lookup(root, field)) || !empty,
            Self::MinLength(n) => size(value).map_or(true, |len| len >= *n),
            Self::MaxLength(n) => size(value).map_or(true, |len| len <= *n),
            Self::Length(n) => size(value).map_or(true, |len| len == *n),
            Self::Min(bound) => number(value).map_or(true, |x| x >= *bound),
            Self::Max(bound) => number(value).map_or(true, |x| x <= *bound),
            Self::Email => string(value).is_some_and(|s| email_regex().is_match(s)),
            Self::E164 => string(value).is_some_and(|s| e164_regex().is_match(s)),
            Self::DateFormat(format) => string(value).is_some_and(|s| parses_as(s, format)),
            Self::OneOf(values) => string(value).is_some_and(|s| values.contains(&s)),
        }
    }
}

/// Returns `true` for absent, null, `""`, `0`, `false`, `[]` and `{}`.
pub(crate) fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::Bool(b)) => !b,
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
    }
}

fn string(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str)
}

fn number(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64)
}

fn size(value: Option<&Value>) -> Option<usize> {
    match value? {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

fn scalar_eq(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s == expected,
        Value::Number(n) => n.to_string() == expected,
        Value::Bool(b) => b.to_string() == expected,
        _ => false,
    }
}

fn parses_as(input: &str, format: &str) -> bool {
    NaiveDateTime::parse_from_str(input, format).is_ok()
        || NaiveDate::parse_from_str(input, format).is_ok()
        || NaiveTime::parse_from_str(input, format).is_ok()
}

/// Renders a chrono format the way it is shown to users.
fn human_layout(format: &str) -> String {
    format
        .replace("%Y", "YYYY")
        .replace("%m", "MM")
        .replace("%d", "DD")
        .replace("%H", "hh")
        .replace("%M", "mm")
        .replace("%S", "ss")
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
        )
        .expect("valid regex")
    })
}

fn e164_regex() -> &'static Regex {
    static E164: OnceLock<Regex> = OnceLock::new();
    E164.get_or_init(|| Regex::new(r"^\+[1-9]?[0-9]{7,14}$").expect("valid regex"))
}
