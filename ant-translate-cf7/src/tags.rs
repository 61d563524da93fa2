//! Tag-safe text transformation for CF7 mail templates
//!
//! Mail templates embed CF7 tags such as `[your-email]` or `[_site_title]`
//! that the form system later substitutes with field values. A translation
//! engine would happily translate or reformat those tag names, so before a
//! template is translated every tag is swapped for a numbered placeholder and
//! swapped back afterwards.
//!
//! # Example
//!
//! ```ignore
//! Source:      "Hello [your-name], welcome!"
//! Masked:      "Hello {{ANT_CF7_TAG_1}}, welcome!"
//! Translated:  "Bonjour {{ANT_CF7_TAG_1}}, bienvenue!"
//! Restored:    "Bonjour [your-name], bienvenue!"
//! ```
//!
//! Nested brackets are not supported: a tag runs from `[` to the nearest
//! following `]`.

use regex::Regex;
use std::sync::LazyLock;

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]+\]").expect("tag pattern is valid"));

static LONE_TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[[^\]]+\]$").expect("lone tag pattern is valid"));

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

static SENDER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s*(<.+>)$").expect("sender pattern is valid"));

/// One masked CF7 tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedTag {
    /// 1-based position of the tag within the masked text
    pub index: usize,
    /// The placeholder that replaced the tag (e.g. `{{ANT_CF7_TAG_1}}`)
    pub placeholder: String,
    /// The original tag text including brackets (e.g. `[your-name]`)
    pub original: String,
}

impl MaskedTag {
    pub fn new(index: usize, original: &str) -> Self {
        MaskedTag {
            index,
            placeholder: placeholder_for(index),
            original: original.to_string(),
        }
    }
}

/// Placeholder text for the n-th tag of a masking call
pub fn placeholder_for(index: usize) -> String {
    format!("{{{{ANT_CF7_TAG_{}}}}}", index)
}

/// Ordered placeholder → original tag mapping produced by [`mask_tags`]
///
/// Lives for exactly one mask/translate/unmask round and is then dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagMap {
    tags: Vec<MaskedTag>,
}

impl TagMap {
    pub fn new() -> Self {
        TagMap { tags: Vec::new() }
    }

    fn push(&mut self, original: &str) -> &MaskedTag {
        let index = self.tags.len() + 1;
        self.tags.push(MaskedTag::new(index, original));
        &self.tags[index - 1]
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MaskedTag> {
        self.tags.iter()
    }

    /// Original tag text for a placeholder, if this map produced it
    pub fn get(&self, placeholder: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| tag.placeholder == placeholder)
            .map(|tag| tag.original.as_str())
    }
}

/// Replace every CF7 tag in `text` with a numbered placeholder
///
/// Tags are numbered from 1 in order of appearance. Repeated tags get
/// separate placeholders. Text without tags comes back unchanged with an
/// empty map.
pub fn mask_tags(text: &str) -> (String, TagMap) {
    let mut map = TagMap::new();
    let mut masked = String::with_capacity(text.len());
    let mut last_end = 0;

    for found in TAG_PATTERN.find_iter(text) {
        masked.push_str(&text[last_end..found.start()]);
        masked.push_str(&map.push(found.as_str()).placeholder);
        last_end = found.end();
    }

    if map.is_empty() {
        return (text.to_string(), map);
    }

    masked.push_str(&text[last_end..]);
    (masked, map)
}

/// Restore the original tags from their placeholders
///
/// Every occurrence of a placeholder is replaced, including duplicates a
/// translation engine may have introduced. Placeholders never contain each
/// other, so the replacement order does not matter.
pub fn unmask_tags(text: &str, map: &TagMap) -> String {
    if map.is_empty() {
        return text.to_string();
    }

    let mut result = text.to_string();
    for tag in map.iter() {
        result = result.replace(&tag.placeholder, &tag.original);
    }
    result
}

/// Address syntax check used by the mail guard
pub fn is_email(text: &str) -> bool {
    EMAIL_PATTERN.is_match(text)
}

/// Strings that must never be sent to the translator: proper addresses, and
/// anything with an `@` and no whitespace.
///
/// The second rule also skips human text such as `@handle` tokens. That is a
/// known false negative and is kept.
fn looks_like_email(text: &str) -> bool {
    is_email(text) || (text.contains('@') && !text.chars().any(char::is_whitespace))
}

/// Translate a mail text field without disturbing its CF7 tags
///
/// Returns the input unchanged when it is empty, consists of a single tag,
/// or looks like an email address. Otherwise the tags are masked, the masked
/// text goes through `translate`, and the tags are restored.
pub fn safe_translate<F>(text: &str, mut translate: F) -> String
where
    F: FnMut(&str) -> String,
{
    if text.is_empty() {
        return text.to_string();
    }

    if LONE_TAG_PATTERN.is_match(text.trim()) {
        return text.to_string();
    }

    if looks_like_email(text) {
        return text.to_string();
    }

    let (masked, map) = mask_tags(text);
    let translated = translate(&masked);
    unmask_tags(&translated, &map)
}

/// Translate only the display name of a `Name <address>` sender string
///
/// ```ignore
/// Input:  "Kontakt Forma <[_site_admin_email]>"
/// Output: "Contact Form <[_site_admin_email]>"
/// ```
///
/// Strings without a trailing `<...>` part are treated as a bare address and
/// returned unchanged.
pub fn translate_sender_name<F>(sender: &str, translate: F) -> String
where
    F: FnMut(&str) -> String,
{
    let Some(captures) = SENDER_PATTERN.captures(sender) else {
        return sender.to_string();
    };

    let display_name = captures[1].trim();
    let address = &captures[2];

    let display_name = if display_name.is_empty() {
        String::new()
    } else {
        safe_translate(display_name, translate)
    };

    format!("{} {}", display_name, address)
}
