//! `Accept-Language` negotiation.

use crate::catalog::Translator;
use crate::locale::Locale;
use std::cmp::Ordering;

/// The locale resolved for one request, with its translator.
#[derive(Debug, Clone)]
pub struct LocaleContext {
    locale: Locale,
    translator: Translator,
}

impl LocaleContext {
    /// Creates a context from a resolved locale and translator.
    #[must_use]
    pub const fn new(locale: Locale, translator: Translator) -> Self {
        Self { locale, translator }
    }

    /// Returns the resolved locale.
    #[must_use]
    pub const fn locale(&self) -> Locale {
        self.locale
    }

    /// Returns the translator bound to the resolved locale.
    #[must_use]
    pub const fn translator(&self) -> &Translator {
        &self.translator
    }
}

impl Default for LocaleContext {
    fn default() -> Self {
        Self::new(Locale::En, Translator::builtin(Locale::En))
    }
}

/// Resolves client language preferences against a fixed locale list.
///
/// One translator per supported locale is built in [`LocaleNegotiator::new`].
/// Negotiation only clones an existing translator.
#[derive(Debug, Clone)]
pub struct LocaleNegotiator {
    supported: Vec<(Locale, Translator)>,
    default: (Locale, Translator),
}

impl LocaleNegotiator {
    /// Creates a negotiator over `supported`, falling back to `default`.
    ///
    /// Duplicates in `supported` are ignored. The default is not required to
    /// be in the list.
    #[must_use]
    pub fn new(supported: Vec<Locale>, default: Locale) -> Self {
        let mut entries: Vec<(Locale, Translator)> = Vec::with_capacity(supported.len());
        for locale in supported {
            if entries.iter().all(|(l, _)| *l != locale) {
                entries.push((locale, Translator::builtin(locale)));
            }
        }
        let default_translator = entries
            .iter()
            .find(|(l, _)| *l == default)
            .map(|(_, t)| t.clone())
            .unwrap_or_else(|| Translator::builtin(default));
        Self {
            supported: entries,
            default: (default, default_translator),
        }
    }

    /// Returns the supported locales in priority order.
    pub fn supported(&self) -> impl Iterator<Item = Locale> + '_ {
        self.supported.iter().map(|(l, _)| *l)
    }

    /// Returns the fallback locale.
    #[must_use]
    pub const fn default_locale(&self) -> Locale {
        self.default.0
    }

    /// Resolves an `Accept-Language` value to a locale.
    ///
    /// Preferences are visited by descending quality. For each one an exact
    /// tag match is tried first, then a match on the base language. An
    /// absent, empty, or unparsable header yields the default locale.
    #[must_use]
    pub fn negotiate(&self, header: Option<&str>) -> LocaleContext {
        let preferences = header.map(parse_preferences).unwrap_or_default();

        for tag in &preferences {
            if let Some((locale, translator)) = self.match_tag(tag) {
                return LocaleContext::new(locale, translator.clone());
            }
        }

        tracing::trace!(
            header = header.unwrap_or(""),
            locale = %self.default.0,
            "no acceptable language, using default locale"
        );
        LocaleContext::new(self.default.0, self.default.1.clone())
    }

    fn match_tag(&self, tag: &str) -> Option<(Locale, &Translator)> {
        let exact = self
            .supported
            .iter()
            .find(|(l, _)| l.as_str().eq_ignore_ascii_case(tag));
        if let Some((l, t)) = exact {
            return Some((*l, t));
        }

        let base = tag.split(['-', '_']).next().unwrap_or(tag);
        self.supported
            .iter()
            .find(|(l, _)| l.as_str().eq_ignore_ascii_case(base))
            .map(|(l, t)| (*l, t))
    }
}

impl Default for LocaleNegotiator {
    fn default() -> Self {
        Self::new(Locale::ALL.to_vec(), Locale::En)
    }
}

/// Parses an `Accept-Language` list into tags ordered by quality.
///
/// Entries with a malformed or non-positive `q`, and the `*` wildcard, are
/// dropped. Equal weights keep their header order.
fn parse_preferences(header: &str) -> Vec<String> {
    let mut weighted: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let tag = parts.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }

            let mut quality = 1.0_f32;
            for param in parts {
                let param = param.trim();
                if let Some(value) = param.strip_prefix("q=").or_else(|| param.strip_prefix("Q=")) {
                    quality = value.trim().parse().ok()?;
                }
            }
            if quality.is_nan() || quality <= 0.0 || quality > 1.0 {
                return None;
            }
            Some((tag.to_string(), quality))
        })
        .collect();

    weighted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    weighted.into_iter().map(|(tag, _)| tag).collect()
}
