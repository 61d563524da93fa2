use crate::error::{Cf7Error, Cf7Result};
use crate::translator::PlainTranslator;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Exact-match string table for one target language
///
/// Stands in for the translation core's string lookup. A miss returns the
/// input unchanged, which is exactly what the pipeline treats as "nothing to
/// translate".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DictionaryTranslator {
    entries: HashMap<String, String>,
}

impl DictionaryTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(&mut self, source: &str, translation: &str) -> &mut Self {
        self.entries
            .insert(source.to_owned(), translation.to_owned());
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up `text`, retrying without surrounding whitespace
    pub fn lookup(&self, text: &str) -> Option<String> {
        if let Some(found) = self.entries.get(text) {
            return Some(found.clone());
        }

        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.len() == text.len() {
            return None;
        }

        let found = self.entries.get(trimmed)?;
        let leading = &text[..text.len() - text.trim_start().len()];
        let trailing = &text[text.trim_end().len()..];
        Some(format!("{}{}{}", leading, found, trailing))
    }
}

impl PlainTranslator for DictionaryTranslator {
    fn translate(&self, text: &str) -> Cf7Result<String> {
        match self.lookup(text) {
            Some(translated) => Ok(translated),
            None => {
                debug!(text, "no dictionary entry");
                Ok(text.to_string())
            }
        }
    }

    fn provider_name(&self) -> &str {
        "Dictionary"
    }
}

/// Load a dictionary from a single JSON file
///
/// The JSON file should have the following structure:
/// ```json
/// {
///     "@metadata": { ... },  // Ignored
///     "Vaše ime": "Your name",
///     "Pošalji": "Send"
/// }
/// ```
///
/// # Errors
/// - File not found
/// - Invalid JSON
/// - Root is not an object
pub fn load_dictionary_from_file(path: &Path) -> Cf7Result<DictionaryTranslator> {
    let content = fs::read_to_string(path).map_err(|e| {
        Cf7Error::Dictionary(format!("Failed to read file '{}': {}", path.display(), e))
    })?;

    let json: Value = serde_json::from_str(&content).map_err(|e| {
        Cf7Error::Dictionary(format!(
            "Failed to parse JSON from '{}': {}",
            path.display(),
            e
        ))
    })?;

    let obj = json.as_object().ok_or_else(|| {
        Cf7Error::Dictionary(format!(
            "Invalid JSON in '{}': root must be an object",
            path.display()
        ))
    })?;

    let mut dictionary = DictionaryTranslator::new();
    for (source, value) in obj {
        if source.starts_with('@') {
            continue;
        }

        if let Some(translation) = value.as_str() {
            dictionary.with_entry(source, translation);
        } else {
            warn!(source = %source, "dictionary entry is not a string, skipping");
        }
    }

    Ok(dictionary)
}

/// Load all dictionaries from a directory of `<lang>.json` files
///
/// The file stem is used as the language slug: `en.json` → `"en"`.
pub fn load_dictionaries_from_dir(dir: &Path) -> Cf7Result<HashMap<String, DictionaryTranslator>> {
    if !dir.is_dir() {
        return Err(Cf7Error::Dictionary(format!(
            "Not a directory: {}",
            dir.display()
        )));
    }

    let entries = fs::read_dir(dir).map_err(|e| {
        Cf7Error::Dictionary(format!("Failed to read directory '{}': {}", dir.display(), e))
    })?;

    let mut dictionaries = HashMap::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| Cf7Error::Dictionary(format!("Error reading directory entry: {}", e)))?;
        let path = entry.path();

        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }

        let language = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| Cf7Error::Dictionary(format!("Invalid filename: {}", path.display())))?
            .to_string();

        dictionaries.insert(language, load_dictionary_from_file(&path)?);
    }

    if dictionaries.is_empty() {
        warn!(dir = %dir.display(), "no dictionary files found");
    }

    Ok(dictionaries)
}

/// Load the dictionary for `language` from a file or a directory
///
/// A file path is used as-is; a directory is searched for `<language>.json`.
pub fn load_dictionary(path: &Path, language: &str) -> Cf7Result<DictionaryTranslator> {
    if !path.is_dir() {
        return load_dictionary_from_file(path);
    }

    let mut dictionaries = load_dictionaries_from_dir(path)?;
    dictionaries.remove(language).ok_or_else(|| {
        Cf7Error::Dictionary(format!(
            "No dictionary for '{}' in {}",
            language,
            path.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ant-cf7-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_lookup_exact_and_trimmed() {
        let mut dictionary = DictionaryTranslator::new();
        dictionary.with_entry("Pošalji", "Send");
        assert_eq!(dictionary.lookup("Pošalji").as_deref(), Some("Send"));
        assert_eq!(dictionary.lookup("  Pošalji\n").as_deref(), Some("  Send\n"));
        assert_eq!(dictionary.lookup("Nepoznato"), None);
        assert_eq!(dictionary.lookup("   "), None);
    }

    #[test]
    fn test_translate_miss_returns_input() {
        let dictionary = DictionaryTranslator::new();
        assert_eq!(dictionary.translate("Ime").unwrap(), "Ime");
    }

    #[test]
    fn test_load_from_file_skips_metadata_and_non_strings() {
        let dir = scratch_dir("file");
        let path = dir.join("en.json");
        fs::write(
            &path,
            r#"{"@metadata": {"authors": ["x"]}, "Ime": "Name", "Broj": 3}"#,
        )
        .unwrap();

        let dictionary = load_dictionary_from_file(&path).unwrap();
        assert_eq!(dictionary.len(), 1);
        assert_eq!(dictionary.lookup("Ime").as_deref(), Some("Name"));
    }

    #[test]
    fn test_load_from_file_errors() {
        let dir = scratch_dir("errors");
        assert!(load_dictionary_from_file(&dir.join("missing.json")).is_err());

        let not_object = dir.join("list.json");
        fs::write(&not_object, "[1, 2]").unwrap();
        match load_dictionary_from_file(&not_object) {
            Err(Cf7Error::Dictionary(msg)) => assert!(msg.contains("root must be an object")),
            other => panic!("Expected Dictionary error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_from_dir_by_language() {
        let dir = scratch_dir("dir");
        fs::write(dir.join("en.json"), r#"{"Pošalji": "Send"}"#).unwrap();
        fs::write(dir.join("de.json"), r#"{"Pošalji": "Senden"}"#).unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let all = load_dictionaries_from_dir(&dir).unwrap();
        assert_eq!(all.len(), 2);

        let de = load_dictionary(&dir, "de").unwrap();
        assert_eq!(de.lookup("Pošalji").as_deref(), Some("Senden"));
        assert!(load_dictionary(&dir, "fr").is_err());
    }
}
