//! Rule evaluation and message translation.

use crate::rules::{is_empty, Rule};
use crate::shape::{lookup, Shape};
use pylon_core::FieldErrors;
use pylon_i18n::Translator;
use serde_json::Value;

/// Runs a shape's rules over a bound request.
///
/// Every rule of a field is evaluated in declaration order. When several
/// rules on the same field fail, the message of the last failing rule is
/// the one reported.
#[derive(Debug, Clone)]
pub struct Validator<'t> {
    translator: &'t Translator,
}

impl<'t> Validator<'t> {
    /// Creates a validator that renders messages with `translator`.
    #[must_use]
    pub const fn new(translator: &'t Translator) -> Self {
        Self { translator }
    }

    /// Validates `root`, the canonical JSON form of a bound request.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages when any rule fails. Keys are wire
    /// names, not locations.
    pub fn validate(&self, shape: &Shape, root: &Value) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        for field in shape.fields() {
            let value = lookup(root, field.location());
            if field.is_optional() && is_empty(value) {
                continue;
            }

            for rule in field.rules() {
                if !rule.check(value, root) {
                    errors.add(field.wire_name(), self.message(field.wire_name(), rule));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            tracing::debug!(shape = shape.name(), fields = errors.len(), "validation failed");
            Err(errors)
        }
    }

    /// Renders the message for a failed rule.
    ///
    /// Falls back to a fixed English sentence if no catalog has the tag.
    fn message(&self, field: &str, rule: &Rule) -> String {
        let tag = rule.tag();
        let param = rule.param();
        let key = format!("validation.{tag}");
        self.translator
            .message(&key, &[("field", field), ("param", &param)])
            .unwrap_or_else(|| {
                format!("Key: '{field}' Error:Field validation for '{field}' failed on the '{tag}' tag")
            })
    }
}
