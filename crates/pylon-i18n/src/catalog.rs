//! Message catalogs and translators.
//!
//! Templates use `{name}` placeholders. Keys are grouped by prefix:
//! `validation.<tag>` for field rule violations and `error.<kind>` for
//! the message of each error kind.

use crate::locale::Locale;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

const EN_MESSAGES: &[(&str, &str)] = &[
    ("validation.required", "{field} is a required field"),
    ("validation.required_if", "{field} is a required field"),
    ("validation.required_with", "{field} is required when {param} is present"),
    ("validation.min", "{field} must be at least {param} characters in length"),
    ("validation.max", "{field} must be a maximum of {param} characters in length"),
    ("validation.len", "{field} must be {param} characters in length"),
    ("validation.gte", "{field} must be {param} or greater"),
    ("validation.lte", "{field} must be {param} or less"),
    ("validation.email", "{field} must be a valid email address"),
    ("validation.e164", "{field} must be a valid E.164 formatted phone number"),
    ("validation.datetime", "{field} does not match the {param} format"),
    ("validation.oneof", "{field} must be one of [{param}]"),
    ("error.undefined", "undefined error"),
    ("error.not_implemented", "not implemented"),
    ("error.database", "database error"),
    ("error.database_migrate", "database migrate error"),
    ("error.drop_production", "production database cannot be dropped"),
    ("error.invalid_parameters", "invalid parameters"),
    ("error.not_found", "not found"),
    ("error.unknown", "unknown"),
    ("error.configuration_failed", "configuration failed"),
    ("error.unauthorized", "unauthorized"),
    ("error.forbidden", "forbidden"),
    ("error.external_lib", "external library error"),
    ("error.email", "email error"),
    ("error.user_already_exists", "user already exists"),
    ("error.generate_token", "error creating token"),
    ("error.invalid_token", "invalid token"),
    ("error.token_expired", "token expired"),
    ("error.invalid_credentials", "invalid credentials"),
    ("error.internal", "internal error"),
    ("error.route_not_found", "route not found"),
];

// French has no entry for a few internal-only kinds; those fall back to English.
const FR_MESSAGES: &[(&str, &str)] = &[
    ("validation.required", "{field} est un champ obligatoire"),
    ("validation.required_if", "{field} est un champ obligatoire"),
    ("validation.required_with", "{field} est obligatoire lorsque {param} est présent"),
    ("validation.min", "{field} doit faire une taille minimum de {param} caractères"),
    ("validation.max", "{field} doit faire une taille maximum de {param} caractères"),
    ("validation.len", "{field} doit faire une taille de {param} caractères"),
    ("validation.gte", "{field} doit être {param} ou plus"),
    ("validation.lte", "{field} doit être {param} ou moins"),
    ("validation.email", "{field} doit être une adresse email valide"),
    ("validation.e164", "{field} doit être un numéro de téléphone au format E.164 valide"),
    ("validation.datetime", "{field} ne respecte pas le format {param}"),
    ("validation.oneof", "{field} doit être l'un des choix suivants [{param}]"),
    ("error.invalid_parameters", "paramètres invalides"),
    ("error.not_found", "introuvable"),
    ("error.unauthorized", "non autorisé"),
    ("error.forbidden", "interdit"),
    ("error.user_already_exists", "l'utilisateur existe déjà"),
    ("error.invalid_token", "jeton invalide"),
    ("error.token_expired", "jeton expiré"),
    ("error.invalid_credentials", "identifiants invalides"),
    ("error.not_implemented", "non implémenté"),
    ("error.internal", "erreur interne"),
    ("error.route_not_found", "route introuvable"),
];

/// Message templates for a single locale.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    messages: HashMap<Cow<'static, str>, Cow<'static, str>>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the built-in catalog for a locale.
    #[must_use]
    pub fn builtin(locale: Locale) -> Self {
        let entries = match locale {
            Locale::En => EN_MESSAGES,
            Locale::Fr => FR_MESSAGES,
        };
        Self {
            messages: entries
                .iter()
                .map(|(k, v)| (Cow::Borrowed(*k), Cow::Borrowed(*v)))
                .collect(),
        }
    }

    /// Adds or replaces a template.
    #[must_use]
    pub fn with_message(
        mut self,
        key: impl Into<Cow<'static, str>>,
        template: impl Into<Cow<'static, str>>,
    ) -> Self {
        self.messages.insert(key.into(), template.into());
        self
    }

    /// Returns the raw template for a key.
    #[must_use]
    pub fn template(&self, key: &str) -> Option<&str> {
        self.messages.get(key).map(AsRef::as_ref)
    }

    /// Returns the number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if the catalog has no templates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

fn english() -> Arc<Catalog> {
    static ENGLISH: OnceLock<Arc<Catalog>> = OnceLock::new();
    ENGLISH
        .get_or_init(|| Arc::new(Catalog::builtin(Locale::En)))
        .clone()
}

/// A catalog bound to one locale.
///
/// Lookups try the bound catalog and then English. A translator is
/// immutable and cheap to clone.
#[derive(Debug, Clone)]
pub struct Translator {
    locale: Locale,
    catalog: Arc<Catalog>,
    fallback: Arc<Catalog>,
}

impl Translator {
    /// Creates a translator over the built-in catalog for `locale`.
    #[must_use]
    pub fn builtin(locale: Locale) -> Self {
        let catalog = match locale {
            Locale::En => english(),
            other => Arc::new(Catalog::builtin(other)),
        };
        Self::new(locale, catalog)
    }

    /// Creates a translator over a custom catalog.
    #[must_use]
    pub fn new(locale: Locale, catalog: Arc<Catalog>) -> Self {
        Self {
            locale,
            catalog,
            fallback: english(),
        }
    }

    /// Returns the locale this translator answers in.
    #[must_use]
    pub const fn locale(&self) -> Locale {
        self.locale
    }

    /// Renders the message for `key`, substituting `{name}` placeholders.
    ///
    /// Returns `None` if neither the bound catalog nor English knows the key.
    #[must_use]
    pub fn message(&self, key: &str, args: &[(&str, &str)]) -> Option<String> {
        let template = self
            .catalog
            .template(key)
            .or_else(|| self.fallback.template(key))?;
        Some(render(template, args))
    }
}

fn render(template: &str, args: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in args {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalogs_cover_validation_tags() {
        let en = Catalog::builtin(Locale::En);
        let fr = Catalog::builtin(Locale::Fr);
        for (key, _) in EN_MESSAGES.iter().filter(|(k, _)| k.starts_with("validation.")) {
            assert!(fr.template(key).is_some(), "missing fr template for {key}");
            assert!(en.template(key).is_some());
        }
    }

    #[test]
    fn test_message_substitutes_placeholders() {
        let t = Translator::builtin(Locale::En);
        let msg = t.message("validation.min", &[("field", "password"), ("param", "8")]);
        assert_eq!(
            msg.as_deref(),
            Some("password must be at least 8 characters in length")
        );
    }

    #[test]
    fn test_missing_french_key_falls_back_to_english() {
        let t = Translator::builtin(Locale::Fr);
        assert_eq!(t.message("error.database", &[]).as_deref(), Some("database error"));
    }

    #[test]
    fn test_unknown_key_is_none() {
        let t = Translator::builtin(Locale::Fr);
        assert!(t.message("validation.nope", &[]).is_none());
    }

    #[test]
    fn test_custom_catalog_overrides() {
        let catalog = Catalog::builtin(Locale::Fr).with_message("error.not_found", "pas trouvé");
        let t = Translator::new(Locale::Fr, Arc::new(catalog));
        assert_eq!(t.message("error.not_found", &[]).as_deref(), Some("pas trouvé"));
    }
}
