//! # Pylon i18n
//!
//! Locale negotiation and translated messages for the Pylon pipeline.
//!
//! - [`Locale`] - The closed set of locales the service can answer in
//! - [`Catalog`] - Message templates for one locale
//! - [`Translator`] - A catalog bound to a locale, with English fallback
//! - [`LocaleNegotiator`] - Resolves `Accept-Language` to a [`LocaleContext`]
//!
//! Translators are built once per supported locale when the negotiator is
//! constructed and then shared read-only between requests.
//!
//! ```
//! use pylon_i18n::{Locale, LocaleNegotiator};
//!
//! let negotiator = LocaleNegotiator::new(vec![Locale::En, Locale::Fr], Locale::En);
//! let ctx = negotiator.negotiate(Some("fr-CA,fr;q=0.9,en;q=0.5"));
//! assert_eq!(ctx.locale(), Locale::Fr);
//!
//! let message = ctx
//!     .translator()
//!     .message("validation.required", &[("field", "name")]);
//! assert_eq!(message.as_deref(), Some("name est un champ obligatoire"));
//! ```

#![doc(html_root_url = "https://docs.rs/pylon-i18n/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod catalog;
mod locale;
mod negotiate;

pub use catalog::{Catalog, Translator};
pub use locale::{Locale, UnsupportedLocale};
pub use negotiate::{LocaleContext, LocaleNegotiator};
