//! Mock translator for testing
//!
//! A deterministic, engine-free translator for exercising the pipeline
//! without the translation core. It implements both [`PlainTranslator`] and
//! [`HtmlTranslator`] (the latter treats the whole markup as one string) and
//! counts every call it receives.
//!
//! # Example
//!
//! ```ignore
//! use ant_translate_cf7::{MockMode, MockTranslator, PlainTranslator};
//!
//! let mock = MockTranslator::new(MockMode::Suffix("en".to_string()));
//! assert_eq!(mock.translate("Ime").unwrap(), "Ime_en");
//! assert_eq!(mock.call_count(), 1);
//! ```

use crate::error::{Cf7Error, Cf7Result};
use crate::translator::{HtmlTranslator, PlainTranslator};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock translation modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append a language suffix: "hello" → "hello_en".
    /// Placeholders survive untouched, which makes masking easy to observe.
    Suffix(String),

    /// Predefined source → translation pairs; unknown text comes back unchanged
    Mappings(HashMap<String, String>),

    /// Simulate an engine failure
    Error(String),

    /// Return the input unchanged
    NoOp,

    /// Return an empty string, as a misbehaving engine might
    Empty,
}

/// Mock translator that simulates various translation scenarios
#[derive(Debug)]
pub struct MockTranslator {
    mode: MockMode,
    calls: AtomicUsize,
}

impl MockTranslator {
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            calls: AtomicUsize::new(0),
        }
    }

    /// Convenience constructor for [`MockMode::Mappings`]
    ///
    /// ```ignore
    /// let mock = MockTranslator::with_mappings(&[("Pošalji", "Send")]);
    /// ```
    pub fn with_mappings(pairs: &[(&str, &str)]) -> Self {
        let map = pairs
            .iter()
            .map(|(source, target)| (source.to_string(), target.to_string()))
            .collect();
        Self::new(MockMode::Mappings(map))
    }

    /// Number of translate calls received so far (plain and HTML)
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn apply_translation(&self, text: &str) -> Cf7Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.mode {
            MockMode::Suffix(suffix) => Ok(format!("{}_{}", text, suffix)),
            MockMode::Mappings(map) => Ok(map.get(text).cloned().unwrap_or_else(|| text.to_string())),
            MockMode::Error(msg) => Err(Cf7Error::Translation(msg.clone())),
            MockMode::NoOp => Ok(text.to_string()),
            MockMode::Empty => Ok(String::new()),
        }
    }
}

impl PlainTranslator for MockTranslator {
    fn translate(&self, text: &str) -> Cf7Result<String> {
        self.apply_translation(text)
    }

    fn provider_name(&self) -> &str {
        "Mock Translator"
    }
}

impl HtmlTranslator for MockTranslator {
    fn translate_html(&self, markup: &str) -> Cf7Result<String> {
        self.apply_translation(markup)
    }
}
