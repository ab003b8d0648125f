//! # Pylon Bind
//!
//! Declarative request binding and validation.
//!
//! A request type describes itself with a [`Shape`]: where each field comes
//! from and which [`Rule`]s it must satisfy. The [`Binder`] merges the
//! request parts into one JSON object, deserializes it into the type and
//! runs the rules.
//!
//! | Source | Declared with | Lands at |
//! |--------|---------------|----------|
//! | Path parameter | [`FieldSpec::path`] | top-level field |
//! | Query parameter | [`FieldSpec::query`] | top-level field |
//! | JSON body | [`FieldSpec::body`] | under [`BODY_KEY`] |
//!
//! ## Errors
//!
//! Binding fails with a [`BindError`]. Converted into a
//! [`PylonError`](pylon_core::PylonError) it is always `InvalidParameters`;
//! rule failures additionally carry one translated message per field, keyed
//! by the field's wire name.

#![doc(html_root_url = "https://docs.rs/pylon-bind/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binder;
mod error;
mod rules;
mod shape;
mod validate;

pub use binder::{BindInput, Binder, DEFAULT_MAX_BODY_BYTES};
pub use error::{BindError, BindSource};
pub use rules::Rule;
pub use shape::{FieldSource, FieldSpec, PrimitiveKind, RequestView, Shape, BODY_KEY};
pub use validate::Validator;
