use crate::error::{Cf7Error, Cf7Result};
use crate::translator::{HtmlTranslator, PlainTranslator};
use regex::{Captures, Regex};
use std::ops::Range;
use std::sync::LazyLock;
use tree_sitter::{Node, Parser as TSParser};

/// Attributes whose values are shown to the visitor
const TRANSLATABLE_ATTRIBUTES: [&str; 4] = ["placeholder", "title", "alt", "aria-label"];

/// Input types whose `value` is a button caption
const BUTTON_INPUT_TYPES: [&str; 3] = ["submit", "button", "reset"];

static ENTITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]+);").expect("entity pattern is valid")
});

/// Where a translated fragment is spliced back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fragment {
    Text,
    QuotedValue,
    UnquotedValue,
}

/// HTML-aware translator for rendered form markup
///
/// Parses the markup with tree-sitter and sends every human-facing piece
/// through the wrapped [`PlainTranslator`]: text nodes, the values of
/// [`TRANSLATABLE_ATTRIBUTES`], and button captions of `<input>` elements.
/// Tags, attribute names, comments and script/style contents are copied
/// byte for byte. Whitespace around text nodes is preserved. Character
/// references are decoded before lookup and translations are escaped for
/// the position they are written back to.
pub struct TextNodeTranslator<T> {
    inner: T,
}

struct Edit {
    range: Range<usize>,
    replacement: String,
}

impl<T: PlainTranslator> TextNodeTranslator<T> {
    pub fn new(inner: T) -> Self {
        TextNodeTranslator { inner }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    fn collect(&self, node: Node, source: &str, edits: &mut Vec<Edit>) -> Cf7Result<()> {
        match node.kind() {
            "text" | "entity" => {
                self.translate_fragment(node.byte_range(), Fragment::Text, source, edits)
            }
            "start_tag" | "self_closing_tag" => self.collect_attributes(node, source, edits),
            "comment" | "doctype" | "script_element" | "style_element" | "raw_text" => Ok(()),
            _ => {
                // adjacent text and entity nodes form one visible run
                let mut run: Option<Range<usize>> = None;
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if matches!(child.kind(), "text" | "entity") {
                        let range = child.byte_range();
                        run = Some(match run {
                            Some(open) => open.start..range.end,
                            None => range,
                        });
                        continue;
                    }
                    if let Some(open) = run.take() {
                        self.translate_fragment(open, Fragment::Text, source, edits)?;
                    }
                    self.collect(child, source, edits)?;
                }
                if let Some(open) = run {
                    self.translate_fragment(open, Fragment::Text, source, edits)?;
                }
                Ok(())
            }
        }
    }

    fn collect_attributes(&self, tag: Node, source: &str, edits: &mut Vec<Edit>) -> Cf7Result<()> {
        let mut tag_name = String::new();
        let mut attributes: Vec<(String, Option<Node>)> = Vec::new();

        let mut cursor = tag.walk();
        for child in tag.children(&mut cursor) {
            match child.kind() {
                "tag_name" => tag_name = node_text(child, source).to_ascii_lowercase(),
                "attribute" => attributes.push(read_attribute(child, source)),
                _ => {}
            }
        }

        let is_button_input = tag_name == "input"
            && attributes.iter().any(|(name, value)| {
                name == "type"
                    && value.is_some_and(|v| {
                        BUTTON_INPUT_TYPES.contains(&node_text(v, source).to_ascii_lowercase().as_str())
                    })
            });

        for (name, value) in attributes {
            let Some(value) = value else { continue };
            let translatable = TRANSLATABLE_ATTRIBUTES.contains(&name.as_str())
                || (is_button_input && name == "value");
            if translatable {
                let quoted = value
                    .parent()
                    .is_some_and(|parent| parent.kind() == "quoted_attribute_value");
                let fragment = if quoted {
                    Fragment::QuotedValue
                } else {
                    Fragment::UnquotedValue
                };
                self.translate_fragment(value.byte_range(), fragment, source, edits)?;
            }
        }

        Ok(())
    }

    fn translate_fragment(
        &self,
        range: Range<usize>,
        kind: Fragment,
        source: &str,
        edits: &mut Vec<Edit>,
    ) -> Cf7Result<()> {
        let fragment = &source[range.clone()];
        let core = fragment.trim();
        let start = range.start + (fragment.len() - fragment.trim_start().len());
        let end = start + core.len();

        let text = decode_entities(core);
        if !text.chars().any(char::is_alphabetic) {
            return Ok(());
        }

        let translated = self.inner.translate(&text)?;
        if translated.is_empty() || translated == text {
            return Ok(());
        }

        let replacement = match kind {
            Fragment::Text => escape_text(&translated),
            Fragment::QuotedValue => escape_attribute(&translated),
            // rewritten as a double-quoted value
            Fragment::UnquotedValue => format!("\"{}\"", escape_attribute(&translated)),
        };
        edits.push(Edit {
            range: start..end,
            replacement,
        });
        Ok(())
    }
}

impl<T: PlainTranslator> HtmlTranslator for TextNodeTranslator<T> {
    fn translate_html(&self, markup: &str) -> Cf7Result<String> {
        let mut parser = TSParser::new();
        parser
            .set_language(&tree_sitter_html::LANGUAGE.into())
            .map_err(|e| Cf7Error::Markup(format!("Error loading HTML grammar: {}", e)))?;

        let tree = parser
            .parse(markup, None)
            .ok_or_else(|| Cf7Error::Markup("Failed to parse form markup".to_string()))?;

        let mut edits = Vec::new();
        self.collect(tree.root_node(), markup, &mut edits)?;

        Ok(apply_edits(markup, edits))
    }
}

/// Resolve character references so the translator sees the visible text
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    ENTITY_PATTERN
        .replace_all(text, |caps: &Captures| {
            let name = &caps[1];
            let decoded = if let Some(hex) = name.strip_prefix("#x").or(name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match name {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

/// Attribute name (lowercased) and the node holding its unquoted value
fn read_attribute<'t>(attribute: Node<'t>, source: &str) -> (String, Option<Node<'t>>) {
    let mut name = String::new();
    let mut value = None;

    let mut cursor = attribute.walk();
    for child in attribute.children(&mut cursor) {
        match child.kind() {
            "attribute_name" => name = node_text(child, source).to_ascii_lowercase(),
            "attribute_value" => value = Some(child),
            "quoted_attribute_value" => {
                let mut inner = child.walk();
                value = child
                    .children(&mut inner)
                    .find(|c| c.kind() == "attribute_value");
            }
            _ => {}
        }
    }

    (name, value)
}

fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|edit| edit.range.start);

    let mut result = String::with_capacity(source.len());
    let mut last_end = 0;
    for edit in edits {
        if edit.range.start < last_end {
            continue;
        }
        result.push_str(&source[last_end..edit.range.start]);
        result.push_str(&edit.replacement);
        last_end = edit.range.end;
    }
    result.push_str(&source[last_end..]);
    result
}
