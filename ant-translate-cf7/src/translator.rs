//! Collaborator traits for the external translation engine
//!
//! The add-on never translates anything itself. String lookup, HTML-aware
//! translation and language detection belong to the translation core, which
//! is reached through these traits. Absence of a collaborator is expressed as
//! `None` at construction time (see [`crate::pipeline::Collaborators`]) rather
//! than probed on every call.
//!
//! # Example
//!
//! ```ignore
//! use ant_translate_cf7::{MockMode, MockTranslator, PlainTranslator};
//!
//! let mock = MockTranslator::new(MockMode::Suffix("en".to_string()));
//! assert_eq!(mock.translate("Pošalji")?, "Pošalji_en");
//! ```

use crate::error::{Cf7Error, Cf7Result};
use icu_locale::Locale;
use std::sync::Arc;

/// Plain string translator into the request's target language
///
/// Implementations return the translated text, or the original text when
/// there is nothing to translate. Calling twice with the same input must be
/// safe; the pipeline caches results per request anyway.
pub trait PlainTranslator: Send + Sync {
    /// Translate a single non-empty string
    fn translate(&self, text: &str) -> Cf7Result<String>;

    /// Name used in log output
    fn provider_name(&self) -> &str;
}

impl<T: PlainTranslator + ?Sized> PlainTranslator for Arc<T> {
    fn translate(&self, text: &str) -> Cf7Result<String> {
        (**self).translate(text)
    }

    fn provider_name(&self) -> &str {
        (**self).provider_name()
    }
}

/// Translator for rendered form markup
///
/// Only text content (and human-facing attribute values) may change; tag and
/// attribute structure must come back untouched.
pub trait HtmlTranslator: Send + Sync {
    fn translate_html(&self, markup: &str) -> Cf7Result<String>;
}

/// Language detection for the current request
pub trait LanguageResolver: Send + Sync {
    /// Language of the page being served (e.g. "en")
    fn current_language(&self) -> String;

    /// Slug of the configured target language as used in URL path segments.
    /// An empty string means no target language is configured.
    fn target_language_slug(&self) -> String;
}

/// A resolver with fixed answers, used by the CLI and the web host where the
/// host already knows both languages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticLanguages {
    pub current: String,
    pub target_slug: String,
}

impl StaticLanguages {
    pub fn new(current: &str, target_slug: &str) -> Self {
        Self {
            current: current.to_string(),
            target_slug: target_slug.to_string(),
        }
    }
}

impl LanguageResolver for StaticLanguages {
    fn current_language(&self) -> String {
        self.current.clone()
    }

    fn target_language_slug(&self) -> String {
        self.target_slug.clone()
    }
}

/// Validate a target language slug
///
/// The slug ends up inside URL path matching, so it must be a well-formed
/// BCP 47 language tag. The empty slug is accepted and means "disabled".
///
/// # Example
///
/// ```ignore
/// validate_language_slug("en")?; // OK
/// validate_language_slug("")?; // OK, translation disabled
/// validate_language_slug("en/us").unwrap_err();
/// ```
pub fn validate_language_slug(slug: &str) -> Cf7Result<()> {
    if slug.is_empty() {
        return Ok(());
    }

    let _locale: Locale = slug.parse().map_err(|e| {
        Cf7Error::Config(format!("Invalid target language slug '{}': {}", slug, e))
    })?;

    Ok(())
}
