//! Request-scoped state
//!
//! Everything cached while handling one request lives here and dies with the
//! request. A [`RequestScope`] is owned by exactly one
//! [`crate::pipeline::RequestPipeline`]; nothing is shared between requests.

use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Content fingerprint used to key the form markup cache
pub fn fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Default)]
pub struct RequestScope {
    translations: HashMap<String, String>,
    html: HashMap<String, String>,
    response_translated: bool,
}

impl RequestScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached_translation(&self, text: &str) -> Option<&str> {
        self.translations.get(text).map(String::as_str)
    }

    pub fn store_translation(&mut self, text: &str, translated: String) {
        self.translations.insert(text.to_string(), translated);
    }

    pub fn cached_html(&self, key: &str) -> Option<&str> {
        self.html.get(key).map(String::as_str)
    }

    pub fn store_html(&mut self, key: String, translated: String) {
        self.html.insert(key, translated);
    }

    /// Whether a submission response was already translated in this request
    pub fn response_translated(&self) -> bool {
        self.response_translated
    }

    pub fn mark_response_translated(&mut self) {
        self.response_translated = true;
    }

    /// Forget everything, as at the start of a new request
    pub fn reset(&mut self) {
        self.translations.clear();
        self.html.clear();
        self.response_translated = false;
    }

    pub fn cached_translation_count(&self) -> usize {
        self.translations.len()
    }

    pub fn cached_html_count(&self) -> usize {
        self.html.len()
    }
}
