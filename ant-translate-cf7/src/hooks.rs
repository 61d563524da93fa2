//! Host pipeline points
//!
//! Names every point at which the host hands a payload to the add-on, and
//! applies the matching [`RequestPipeline`] entry point to a raw JSON payload.
//! This is the boundary where malformed host data is absorbed: anything that
//! does not have the expected shape goes back to the host unchanged.

use crate::error::{Cf7Error, Cf7Result};
use crate::payload::{MailProperty, MessagesProperty, ResponsePayload};
use crate::pipeline::RequestPipeline;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hook {
    /// Rendered form markup (string)
    FormElements,
    /// `mail` property (object)
    MailProperty,
    /// `mail_2` property (object)
    #[serde(rename = "mail_2_property")]
    Mail2Property,
    /// `messages` property (object)
    MessagesProperty,
    /// Status message about to be displayed (string)
    DisplayMessage,
    /// Submission response, CF7 5.2+ (object)
    FeedbackResponse,
    /// Submission response, before CF7 5.2 (object)
    AjaxJsonEcho,
    /// Captcha/quiz refill response (object)
    RefillResponse,
}

impl Hook {
    pub const ALL: [Hook; 8] = [
        Hook::FormElements,
        Hook::MailProperty,
        Hook::Mail2Property,
        Hook::MessagesProperty,
        Hook::DisplayMessage,
        Hook::FeedbackResponse,
        Hook::AjaxJsonEcho,
        Hook::RefillResponse,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Hook::FormElements => "form_elements",
            Hook::MailProperty => "mail_property",
            Hook::Mail2Property => "mail_2_property",
            Hook::MessagesProperty => "messages_property",
            Hook::DisplayMessage => "display_message",
            Hook::FeedbackResponse => "feedback_response",
            Hook::AjaxJsonEcho => "ajax_json_echo",
            Hook::RefillResponse => "refill_response",
        }
    }

    /// Whether the payload is a bare string rather than an object
    pub fn takes_text(self) -> bool {
        matches!(self, Hook::FormElements | Hook::DisplayMessage)
    }
}

impl std::fmt::Display for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Hook {
    type Err = Cf7Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_");
        Hook::ALL
            .into_iter()
            .find(|hook| hook.name() == wanted)
            .ok_or_else(|| Cf7Error::Other(format!("Unknown hook: {}", s)))
    }
}

fn parse<T: DeserializeOwned>(payload: &Value) -> Cf7Result<T> {
    Ok(serde_json::from_value(payload.clone())?)
}

fn to_value<T: Serialize>(payload: &T) -> Cf7Result<Value> {
    Ok(serde_json::to_value(payload)?)
}

impl RequestPipeline<'_> {
    /// Run `hook` on a raw host payload
    ///
    /// Never fails: a payload of the wrong shape is logged and returned as-is.
    pub fn apply(&mut self, hook: Hook, payload: Value) -> Value {
        match self.try_apply(hook, &payload) {
            Ok(out) => out,
            Err(e) => {
                warn!(%hook, error = %e, "payload passed through untranslated");
                payload
            }
        }
    }

    fn try_apply(&mut self, hook: Hook, payload: &Value) -> Cf7Result<Value> {
        match hook {
            Hook::FormElements => {
                let markup = expect_text(hook, payload)?;
                Ok(Value::String(self.form_elements(markup)))
            }
            Hook::DisplayMessage => {
                let message = expect_text(hook, payload)?;
                Ok(Value::String(self.display_message(message, "")))
            }
            Hook::MailProperty => {
                let prop: MailProperty = parse(payload)?;
                to_value(&self.mail_property(prop))
            }
            Hook::Mail2Property => {
                let prop: MailProperty = parse(payload)?;
                to_value(&self.mail_2_property(prop))
            }
            Hook::MessagesProperty => {
                let prop: MessagesProperty = parse(payload)?;
                Ok(Value::Object(self.messages_property(prop)))
            }
            Hook::FeedbackResponse => {
                let response: ResponsePayload = parse(payload)?;
                to_value(&self.feedback_response(response))
            }
            Hook::AjaxJsonEcho => {
                let response: ResponsePayload = parse(payload)?;
                to_value(&self.ajax_json_echo(response))
            }
            Hook::RefillResponse => {
                let response: ResponsePayload = parse(payload)?;
                to_value(&self.refill_response(response))
            }
        }
    }
}

fn expect_text(hook: Hook, payload: &Value) -> Cf7Result<&str> {
    payload
        .as_str()
        .ok_or_else(|| Cf7Error::Payload(format!("{} expects a string payload", hook)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::HostRequest;
    use crate::mock::{MockMode, MockTranslator};
    use crate::pipeline::Collaborators;
    use crate::translator::StaticLanguages;
    use serde_json::json;

    fn collaborators<'a>(
        mock: &'a MockTranslator,
        languages: &'a StaticLanguages,
    ) -> Collaborators<'a> {
        Collaborators {
            plain: Some(mock),
            html: Some(mock),
            languages: Some(languages),
        }
    }

    #[test]
    fn test_hook_names_round_trip() {
        for hook in Hook::ALL {
            assert_eq!(hook.name().parse::<Hook>().unwrap(), hook);
            assert_eq!(serde_json::to_value(hook).unwrap(), json!(hook.name()));
        }
    }

    #[test]
    fn test_mail_2_hook_deserializes_by_name() {
        let hook: Hook = serde_json::from_value(json!("mail_2_property")).unwrap();
        assert_eq!(hook, Hook::Mail2Property);
        assert!(serde_json::from_value::<Hook>(json!("mail2_property")).is_err());
    }

    #[test]
    fn test_hook_from_str_accepts_dashes() {
        assert_eq!("mail-2-property".parse::<Hook>().unwrap(), Hook::Mail2Property);
        assert!("wpcf7_mail".parse::<Hook>().is_err());
    }

    #[test]
    fn test_apply_text_hooks() {
        let mock = MockTranslator::new(MockMode::Suffix("en".to_string()));
        let languages = StaticLanguages::new("en", "en");
        let mut pipeline =
            RequestPipeline::new(&HostRequest::page_load(), collaborators(&mock, &languages));

        assert_eq!(
            pipeline.apply(Hook::DisplayMessage, json!("Hvala")),
            json!("Hvala_en")
        );
        assert_eq!(
            pipeline.apply(Hook::FormElements, json!("<p>Ime</p>")),
            json!("<p>Ime</p>_en")
        );
    }

    #[test]
    fn test_apply_mail_hook() {
        let mock = MockTranslator::with_mappings(&[("Kontakt Forma", "Contact Form")]);
        let languages = StaticLanguages::new("en", "en");
        let mut pipeline =
            RequestPipeline::new(&HostRequest::page_load(), collaborators(&mock, &languages));

        let out = pipeline.apply(
            Hook::MailProperty,
            json!({
                "sender": "Kontakt Forma <[_site_admin_email]>",
                "recipient": "[_site_admin_email]",
                "use_html": true
            }),
        );
        assert_eq!(
            out,
            json!({
                "sender": "Contact Form <[_site_admin_email]>",
                "recipient": "[_site_admin_email]",
                "use_html": true
            })
        );
    }

    #[test]
    fn test_apply_response_hooks_share_idempotence_flag() {
        let mock = MockTranslator::new(MockMode::Suffix("en".to_string()));
        let languages = StaticLanguages::new("hr", "en");
        let request = HostRequest::rest_submission("https://example.com/en/kontakt/");
        let mut pipeline = RequestPipeline::new(&request, collaborators(&mock, &languages));

        let response = json!({ "status": "mail_sent", "message": "Hvala" });
        let first = pipeline.apply(Hook::FeedbackResponse, response);
        assert_eq!(first, json!({ "status": "mail_sent", "message": "Hvala_en" }));
        let second = pipeline.apply(Hook::AjaxJsonEcho, first.clone());
        assert_eq!(second, first);
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn test_apply_skips_only_the_malformed_fields() {
        let mock = MockTranslator::new(MockMode::Suffix("en".to_string()));
        let languages = StaticLanguages::new("hr", "en");
        let request = HostRequest::rest_submission("https://example.com/en/kontakt/");
        let mut pipeline = RequestPipeline::new(&request, collaborators(&mock, &languages));

        let mail = pipeline.apply(Hook::MailProperty, json!({ "subject": 42, "body": "Poruka" }));
        assert_eq!(mail, json!({ "subject": 42, "body": "Poruka_en" }));

        let response = pipeline.apply(
            Hook::FeedbackResponse,
            json!({
                "message": "Greska",
                "invalid_fields": [{ "message": 7 }, "your-name", { "message": "Obavezno" }]
            }),
        );
        assert_eq!(
            response,
            json!({
                "message": "Greska_en",
                "invalid_fields": [{ "message": 7 }, "your-name", { "message": "Obavezno_en" }]
            })
        );
    }

    #[test]
    fn test_apply_malformed_payload_is_returned_unchanged() {
        let mock = MockTranslator::new(MockMode::Suffix("en".to_string()));
        let languages = StaticLanguages::new("en", "en");
        let mut pipeline =
            RequestPipeline::new(&HostRequest::page_load(), collaborators(&mock, &languages));

        let cases = [
            (Hook::FormElements, json!({ "html": "<p>x</p>" })),
            (Hook::DisplayMessage, json!(42)),
            (Hook::MailProperty, json!(["subject"])),
            (Hook::Mail2Property, json!({ "subject": 42 })),
            (Hook::MessagesProperty, json!(["not", "a", "map"])),
            (Hook::FeedbackResponse, json!("text")),
            (Hook::RefillResponse, Value::Null),
        ];
        for (hook, payload) in cases {
            assert_eq!(pipeline.apply(hook, payload.clone()), payload);
        }
        assert_eq!(mock.call_count(), 0);
    }
}
