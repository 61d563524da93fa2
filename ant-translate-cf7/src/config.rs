use crate::dictionary::{DictionaryTranslator, load_dictionary};
use crate::error::Cf7Result;
use crate::translator::validate_language_slug;
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

pub const TARGET_LANG_VAR: &str = "ANT_CF7_TARGET_LANG";
pub const DICTIONARY_VAR: &str = "ANT_CF7_DICTIONARY";
pub const BIND_VAR: &str = "ANT_CF7_BIND";

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Add-on settings
///
/// Loaded from the environment and then overridden by command-line flags
/// where a binary offers them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Target language slug; empty disables translation
    pub target_language: String,
    /// Dictionary file, or directory of `<lang>.json` files
    pub dictionary: Option<PathBuf>,
    /// Web host bind address
    pub bind: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            target_language: String::new(),
            dictionary: None,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

impl Settings {
    /// Read settings from `ANT_CF7_*` environment variables
    pub fn from_env() -> Cf7Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup (the environment, a test map, ...)
    pub fn from_lookup<F>(lookup: F) -> Cf7Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let settings = Settings {
            target_language: non_empty(TARGET_LANG_VAR).unwrap_or_default(),
            dictionary: non_empty(DICTIONARY_VAR).map(PathBuf::from),
            bind: non_empty(BIND_VAR).unwrap_or_else(|| DEFAULT_BIND.to_string()),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn with_target_language(mut self, slug: &str) -> Cf7Result<Self> {
        self.target_language = slug.trim().to_string();
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Cf7Result<()> {
        validate_language_slug(&self.target_language)
    }

    pub fn translation_enabled(&self) -> bool {
        !self.target_language.is_empty()
    }

    /// Load the configured dictionary for the target language
    ///
    /// `Ok(None)` when no dictionary is configured: the add-on then has no
    /// plain translator and stays dormant.
    pub fn load_dictionary(&self) -> Cf7Result<Option<DictionaryTranslator>> {
        let Some(path) = &self.dictionary else {
            warn!("no dictionary configured ({}), translation stays dormant", DICTIONARY_VAR);
            return Ok(None);
        };

        let dictionary = load_dictionary(path, &self.target_language)?;
        info!(
            path = %path.display(),
            language = %self.target_language,
            entries = dictionary.len(),
            "dictionary loaded"
        );
        Ok(Some(dictionary))
    }
}
