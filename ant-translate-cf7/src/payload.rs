//! Payload shapes handed over by the host form system
//!
//! Only the fields the add-on may rewrite are typed. Every other key is kept
//! in a flattened JSON map and written back exactly as it came in. A
//! rewritable field that does not hold a string is treated as any other key:
//! it stays in the map untouched and the remaining fields are still handled.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A CF7 mail template (`mail` and `mail_2` properties)
///
/// Only `subject`, `body` and the display-name part of `sender` are ever
/// rewritten. Recipients, headers, attachments and flags pass through.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MailProperty {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_headers: Option<String>,
    /// attachments, use_html, exclude_blank, ...
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl From<Map<String, Value>> for MailProperty {
    fn from(mut map: Map<String, Value>) -> Self {
        MailProperty {
            subject: take_string(&mut map, "subject"),
            sender: take_string(&mut map, "sender"),
            body: take_string(&mut map, "body"),
            recipient: take_string(&mut map, "recipient"),
            additional_headers: take_string(&mut map, "additional_headers"),
            other: map,
        }
    }
}

impl<'de> Deserialize<'de> for MailProperty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::<String, Value>::deserialize(deserializer).map(MailProperty::from)
    }
}

/// The `messages` property: message key → user-facing template
pub type MessagesProperty = Map<String, Value>;

/// An object entry of `invalid_fields` in a submission response
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InvalidField {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// into, idref, error_id, ...
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl From<Map<String, Value>> for InvalidField {
    fn from(mut map: Map<String, Value>) -> Self {
        InvalidField {
            message: take_string(&mut map, "message"),
            other: map,
        }
    }
}

/// One element of `invalid_fields`; anything but an object is kept verbatim
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InvalidFieldEntry {
    Field(InvalidField),
    Unrecognized(Value),
}

impl From<Value> for InvalidFieldEntry {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => InvalidFieldEntry::Field(InvalidField::from(map)),
            other => InvalidFieldEntry::Unrecognized(other),
        }
    }
}

impl From<InvalidField> for InvalidFieldEntry {
    fn from(field: InvalidField) -> Self {
        InvalidFieldEntry::Field(field)
    }
}

/// AJAX/REST submission response, also used for refill responses
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponsePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Present only when the host sent an array
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_fields: Option<Vec<InvalidFieldEntry>>,
    /// status, into, posted_data_hash, ...
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl From<Map<String, Value>> for ResponsePayload {
    fn from(mut map: Map<String, Value>) -> Self {
        let message = take_string(&mut map, "message");
        let invalid_fields = match map.remove("invalid_fields") {
            Some(Value::Array(entries)) => {
                Some(entries.into_iter().map(InvalidFieldEntry::from).collect())
            }
            Some(other) => {
                map.insert("invalid_fields".to_string(), other);
                None
            }
            None => None,
        };
        ResponsePayload {
            message,
            invalid_fields,
            other: map,
        }
    }
}

impl<'de> Deserialize<'de> for ResponsePayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::<String, Value>::deserialize(deserializer).map(ResponsePayload::from)
    }
}

/// Remove `key` from `map` only if it holds a string
fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    if !map.get(key).is_some_and(Value::is_string) {
        return None;
    }
    match map.remove(key) {
        Some(Value::String(text)) => Some(text),
        _ => None,
    }
}
