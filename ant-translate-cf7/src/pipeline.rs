//! Per-request payload translation
//!
//! The host calls one [`RequestPipeline`] method per pipeline point it
//! reaches while handling a request (form render, mail preparation,
//! submission response, ...). The pipeline decides once whether the request
//! is translatable, owns the request-scoped caches and never fails: whatever
//! goes wrong, the host gets its payload back unchanged.
//!
//! # Example
//!
//! ```ignore
//! use ant_translate_cf7::{Collaborators, HostRequest, RequestPipeline, StaticLanguages};
//!
//! let languages = StaticLanguages::new("hr", "en");
//! let request = HostRequest::rest_submission("https://example.com/en/contact/");
//! let mut pipeline = RequestPipeline::new(
//!     &request,
//!     Collaborators { plain: Some(&dictionary), html: None, languages: Some(&languages) },
//! );
//! let mail = pipeline.mail_property(mail);
//! ```

use crate::context::{HostRequest, RequestContext, should_translate};
use crate::payload::{InvalidFieldEntry, MailProperty, MessagesProperty, ResponsePayload};
use crate::scope::{RequestScope, fingerprint};
use crate::tags::{safe_translate, translate_sender_name};
use crate::translator::{HtmlTranslator, LanguageResolver, PlainTranslator};
use serde_json::Value;
use tracing::{debug, warn};

/// The translation core's services, each optional
///
/// A `None` collaborator is the typed form of "the translation core does not
/// provide this"; the affected payloads pass through untranslated.
#[derive(Clone, Copy, Default)]
pub struct Collaborators<'a> {
    pub plain: Option<&'a dyn PlainTranslator>,
    pub html: Option<&'a dyn HtmlTranslator>,
    pub languages: Option<&'a dyn LanguageResolver>,
}

/// Translation state and entry points for one request
pub struct RequestPipeline<'a> {
    context: RequestContext,
    enabled: bool,
    plain: Option<&'a dyn PlainTranslator>,
    html: Option<&'a dyn HtmlTranslator>,
    scope: RequestScope,
}

impl<'a> RequestPipeline<'a> {
    pub fn new(request: &HostRequest, collaborators: Collaborators<'a>) -> Self {
        let context = RequestContext::build(request, collaborators.languages);
        Self::from_context(context, collaborators)
    }

    pub fn from_context(context: RequestContext, collaborators: Collaborators<'a>) -> Self {
        let enabled = should_translate(&context);
        RequestPipeline {
            context,
            enabled,
            plain: collaborators.plain,
            html: collaborators.html,
            scope: RequestScope::new(),
        }
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    /// Whether payloads of this request get translated
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn scope(&self) -> &RequestScope {
        &self.scope
    }

    /// Plain translation with the request-level cache
    ///
    /// Empty text, a missing translator, a translator error and an empty
    /// result all yield the input.
    pub fn translate_plain(&mut self, text: &str) -> String {
        translate_cached(self.plain, &mut self.scope, text)
    }

    /// Rendered form markup
    pub fn form_elements(&mut self, markup: &str) -> String {
        if markup.is_empty() || !self.enabled {
            return markup.to_string();
        }
        let Some(html) = self.html else {
            return markup.to_string();
        };

        let key = fingerprint(markup);
        if let Some(cached) = self.scope.cached_html(&key) {
            debug!("form markup served from request cache");
            return cached.to_string();
        }

        match html.translate_html(markup) {
            Ok(out) if !out.is_empty() => {
                self.scope.store_html(key, out.clone());
                out
            }
            Ok(_) => markup.to_string(),
            Err(e) => {
                warn!(error = %e, "form markup translation failed, keeping original");
                markup.to_string()
            }
        }
    }

    /// The `mail` property
    pub fn mail_property(&mut self, prop: MailProperty) -> MailProperty {
        if !self.enabled {
            return prop;
        }
        self.translate_mail(prop)
    }

    /// The `mail_2` property (auto-responder); same rules as `mail`
    pub fn mail_2_property(&mut self, prop: MailProperty) -> MailProperty {
        if !self.enabled {
            return prop;
        }
        self.translate_mail(prop)
    }

    fn translate_mail(&mut self, mut prop: MailProperty) -> MailProperty {
        let plain = self.plain;
        let scope = &mut self.scope;

        if let Some(subject) = prop.subject.take() {
            prop.subject = Some(safe_translate(&subject, |t| translate_cached(plain, scope, t)));
        }
        if let Some(body) = prop.body.take() {
            prop.body = Some(safe_translate(&body, |t| translate_cached(plain, scope, t)));
        }
        if let Some(sender) = prop.sender.take() {
            prop.sender = Some(translate_sender_name(&sender, |t| {
                translate_cached(plain, scope, t)
            }));
        }

        prop
    }

    /// The `messages` property: every non-empty string value is translated
    pub fn messages_property(&mut self, prop: MessagesProperty) -> MessagesProperty {
        if !self.enabled {
            return prop;
        }

        prop.into_iter()
            .map(|(key, value)| match value {
                Value::String(message) if !message.is_empty() => {
                    let translated = self.translate_plain(&message);
                    (key, Value::String(translated))
                }
                other => (key, other),
            })
            .collect()
    }

    /// A status message about to be displayed
    pub fn display_message(&mut self, message: &str, _status: &str) -> String {
        if message.is_empty() || !self.enabled {
            return message.to_string();
        }
        self.translate_plain(message)
    }

    /// Submission response (`wpcf7_feedback_response`, CF7 5.2+)
    pub fn feedback_response(&mut self, response: ResponsePayload) -> ResponsePayload {
        self.translate_response(response)
    }

    /// Submission response (`wpcf7_ajax_json_echo`, before CF7 5.2)
    ///
    /// When both hooks fire for the same submission, whichever runs second
    /// leaves the response alone.
    pub fn ajax_json_echo(&mut self, response: ResponsePayload) -> ResponsePayload {
        self.translate_response(response)
    }

    fn translate_response(&mut self, mut response: ResponsePayload) -> ResponsePayload {
        if self.scope.response_translated() {
            debug!("submission response already translated in this request");
            return response;
        }
        if !self.enabled {
            return response;
        }

        if let Some(message) = response.message.take() {
            response.message = Some(self.translate_non_empty(message));
        }

        if let Some(entries) = response.invalid_fields.as_mut() {
            for entry in entries.iter_mut() {
                let InvalidFieldEntry::Field(field) = entry else {
                    continue;
                };
                if let Some(message) = field.message.take() {
                    field.message = Some(self.translate_non_empty(message));
                }
            }
        }

        self.scope.mark_response_translated();
        response
    }

    /// Captcha/quiz refill response; only its `message` is translated
    pub fn refill_response(&mut self, mut response: ResponsePayload) -> ResponsePayload {
        if !self.enabled {
            return response;
        }
        if let Some(message) = response.message.take() {
            response.message = Some(self.translate_non_empty(message));
        }
        response
    }

    fn translate_non_empty(&mut self, text: String) -> String {
        if text.is_empty() {
            return text;
        }
        self.translate_plain(&text)
    }
}

fn translate_cached(
    plain: Option<&dyn PlainTranslator>,
    scope: &mut RequestScope,
    text: &str,
) -> String {
    if text.is_empty() {
        return text.to_string();
    }
    let Some(translator) = plain else {
        return text.to_string();
    };

    if let Some(cached) = scope.cached_translation(text) {
        return cached.to_string();
    }

    let translated = match translator.translate(text) {
        Ok(out) if !out.is_empty() => out,
        Ok(_) => text.to_string(),
        Err(e) => {
            warn!(
                provider = translator.provider_name(),
                error = %e,
                "translation failed, keeping original"
            );
            text.to_string()
        }
    };

    scope.store_translation(text, translated.clone());
    translated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockMode, MockTranslator};
    use crate::payload::InvalidField;
    use crate::translator::StaticLanguages;
    use serde_json::json;

    fn new_pipeline<'a>(
        request: &HostRequest,
        plain: &'a MockTranslator,
        languages: &'a StaticLanguages,
    ) -> RequestPipeline<'a> {
        RequestPipeline::new(
            request,
            Collaborators {
                plain: Some(plain),
                html: Some(plain),
                languages: Some(languages),
            },
        )
    }

    fn english_page() -> (HostRequest, StaticLanguages) {
        (HostRequest::page_load(), StaticLanguages::new("en", "en"))
    }

    fn croatian_page() -> (HostRequest, StaticLanguages) {
        (HostRequest::page_load(), StaticLanguages::new("hr", "en"))
    }

    fn sample_mail() -> MailProperty {
        serde_json::from_value(json!({
            "subject": "[_site_title] \"[your-subject]\"",
            "sender": "Kontakt Forma <[_site_admin_email]>",
            "body": "Od: [your-name] <[your-email]>\n\nPoruka:\n[your-message]",
            "recipient": "[_site_admin_email]",
            "additional_headers": "Reply-To: [your-email]",
            "attachments": "",
            "use_html": false
        }))
        .unwrap()
    }

    fn sample_response() -> ResponsePayload {
        ResponsePayload {
            message: Some("Greška".to_string()),
            invalid_fields: Some(vec![
                InvalidField {
                    message: Some("Obavezno polje".to_string()),
                    ..InvalidField::default()
                }
                .into(),
                InvalidField {
                    message: Some(String::new()),
                    ..InvalidField::default()
                }
                .into(),
                InvalidFieldEntry::Unrecognized(json!("your-name")),
            ]),
            ..ResponsePayload::default()
        }
    }

    #[test]
    fn test_disabled_pipeline_passes_everything_through() {
        let mock = MockTranslator::new(MockMode::Suffix("en".to_string()));
        let (request, languages) = croatian_page();
        let mut pipeline = new_pipeline(&request, &mock, &languages);

        assert!(!pipeline.is_enabled());
        assert_eq!(pipeline.form_elements("<p>Ime</p>"), "<p>Ime</p>");
        assert_eq!(pipeline.mail_property(sample_mail()), sample_mail());
        assert_eq!(pipeline.display_message("Hvala", "mail_sent"), "Hvala");
        assert_eq!(pipeline.feedback_response(sample_response()), sample_response());
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_translate_plain_uses_request_cache() {
        let mock = MockTranslator::new(MockMode::Suffix("en".to_string()));
        let (request, languages) = english_page();
        let mut pipeline = new_pipeline(&request, &mock, &languages);

        assert_eq!(pipeline.translate_plain("Ime"), "Ime_en");
        assert_eq!(pipeline.translate_plain("Ime"), "Ime_en");
        assert_eq!(mock.call_count(), 1);
        assert_eq!(pipeline.translate_plain(""), "");
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn test_translate_plain_falls_back_on_error_and_empty() {
        let (request, languages) = english_page();

        let failing = MockTranslator::new(MockMode::Error("offline".to_string()));
        let mut pipeline = new_pipeline(&request, &failing, &languages);
        assert_eq!(pipeline.translate_plain("Ime"), "Ime");

        let empty = MockTranslator::new(MockMode::Empty);
        let mut pipeline = new_pipeline(&request, &empty, &languages);
        assert_eq!(pipeline.translate_plain("Ime"), "Ime");
    }

    #[test]
    fn test_missing_plain_translator_is_a_noop() {
        let (request, languages) = english_page();
        let mut pipeline = RequestPipeline::new(
            &request,
            Collaborators {
                plain: None,
                html: None,
                languages: Some(&languages),
            },
        );
        assert!(pipeline.is_enabled());
        assert_eq!(pipeline.translate_plain("Ime"), "Ime");
        assert_eq!(pipeline.form_elements("<p>Ime</p>"), "<p>Ime</p>");
        assert_eq!(pipeline.mail_property(sample_mail()), sample_mail());
    }

    #[test]
    fn test_form_elements_cached_by_content() {
        let mock = MockTranslator::new(MockMode::Suffix("en".to_string()));
        let (request, languages) = english_page();
        let mut pipeline = new_pipeline(&request, &mock, &languages);

        assert_eq!(pipeline.form_elements("<p>Ime</p>"), "<p>Ime</p>_en");
        assert_eq!(pipeline.form_elements("<p>Ime</p>"), "<p>Ime</p>_en");
        assert_eq!(mock.call_count(), 1);

        pipeline.form_elements("<p>Prezime</p>");
        assert_eq!(mock.call_count(), 2);
        assert_eq!(pipeline.scope().cached_html_count(), 2);
    }

    #[test]
    fn test_form_elements_failure_is_not_cached() {
        let mock = MockTranslator::new(MockMode::Empty);
        let (request, languages) = english_page();
        let mut pipeline = new_pipeline(&request, &mock, &languages);

        assert_eq!(pipeline.form_elements("<p>Ime</p>"), "<p>Ime</p>");
        assert_eq!(pipeline.form_elements("<p>Ime</p>"), "<p>Ime</p>");
        assert_eq!(mock.call_count(), 2);
        assert_eq!(pipeline.form_elements(""), "");
    }

    #[test]
    fn test_mail_property_translates_only_human_fields() {
        let mock = MockTranslator::with_mappings(&[
            ("{{ANT_CF7_TAG_1}} \"{{ANT_CF7_TAG_2}}\"", "{{ANT_CF7_TAG_1}}: \"{{ANT_CF7_TAG_2}}\""),
            (
                "Od: {{ANT_CF7_TAG_1}} <{{ANT_CF7_TAG_2}}>\n\nPoruka:\n{{ANT_CF7_TAG_3}}",
                "From: {{ANT_CF7_TAG_1}} <{{ANT_CF7_TAG_2}}>\n\nMessage:\n{{ANT_CF7_TAG_3}}",
            ),
            ("Kontakt Forma", "Contact Form"),
            ("Reply-To: {{ANT_CF7_TAG_1}}", "SHOULD NOT APPEAR"),
        ]);
        let (request, languages) = english_page();
        let mut pipeline = new_pipeline(&request, &mock, &languages);

        let mail = pipeline.mail_property(sample_mail());
        assert_eq!(mail.subject.as_deref(), Some("[_site_title]: \"[your-subject]\""));
        assert_eq!(
            mail.body.as_deref(),
            Some("From: [your-name] <[your-email]>\n\nMessage:\n[your-message]")
        );
        assert_eq!(mail.sender.as_deref(), Some("Contact Form <[_site_admin_email]>"));
        assert_eq!(mail.recipient.as_deref(), Some("[_site_admin_email]"));
        assert_eq!(mail.additional_headers.as_deref(), Some("Reply-To: [your-email]"));
        assert_eq!(mail.other, sample_mail().other);
    }

    #[test]
    fn test_mail_2_property_matches_mail_property() {
        let mock = MockTranslator::new(MockMode::Suffix("en".to_string()));
        let (request, languages) = english_page();
        let mut first = new_pipeline(&request, &mock, &languages);
        let mut second = new_pipeline(&request, &mock, &languages);
        assert_eq!(
            first.mail_property(sample_mail()),
            second.mail_2_property(sample_mail())
        );
    }

    #[test]
    fn test_mail_property_missing_fields() {
        let mock = MockTranslator::new(MockMode::Suffix("en".to_string()));
        let (request, languages) = english_page();
        let mut pipeline = new_pipeline(&request, &mock, &languages);
        let mail = pipeline.mail_property(MailProperty::default());
        assert_eq!(mail, MailProperty::default());
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_messages_property() {
        let mock = MockTranslator::new(MockMode::Suffix("en".to_string()));
        let (request, languages) = english_page();
        let mut pipeline = new_pipeline(&request, &mock, &languages);

        let messages: MessagesProperty = serde_json::from_value(json!({
            "mail_sent_ok": "Hvala na poruci.",
            "invalid_required": "",
            "quiz_answer_not_correct": null,
            "upload_file_too_large": 5
        }))
        .unwrap();

        let out = pipeline.messages_property(messages);
        assert_eq!(out["mail_sent_ok"], json!("Hvala na poruci._en"));
        assert_eq!(out["invalid_required"], json!(""));
        assert_eq!(out["quiz_answer_not_correct"], Value::Null);
        assert_eq!(out["upload_file_too_large"], json!(5));
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_display_message() {
        let mock = MockTranslator::new(MockMode::Suffix("en".to_string()));
        let (request, languages) = english_page();
        let mut pipeline = new_pipeline(&request, &mock, &languages);
        assert_eq!(pipeline.display_message("Hvala", "mail_sent_ok"), "Hvala_en");
        assert_eq!(pipeline.display_message("", "mail_sent_ok"), "");
    }

    #[test]
    fn test_response_translates_message_and_invalid_fields() {
        let mock = MockTranslator::new(MockMode::Suffix("en".to_string()));
        let request = HostRequest::rest_submission("https://example.com/en/kontakt/");
        let languages = StaticLanguages::new("hr", "en");
        let mut pipeline = new_pipeline(&request, &mock, &languages);

        let response = pipeline.feedback_response(sample_response());
        assert_eq!(response.message.as_deref(), Some("Greška_en"));
        let entries = response.invalid_fields.unwrap();
        let messages: Vec<Option<&str>> = entries
            .iter()
            .map(|entry| match entry {
                InvalidFieldEntry::Field(field) => field.message.as_deref(),
                InvalidFieldEntry::Unrecognized(_) => None,
            })
            .collect();
        assert_eq!(messages, vec![Some("Obavezno polje_en"), Some(""), None]);
        assert_eq!(entries[2], InvalidFieldEntry::Unrecognized(json!("your-name")));
    }

    #[test]
    fn test_response_translated_once_per_request() {
        let mock = MockTranslator::new(MockMode::Suffix("en".to_string()));
        let request = HostRequest::rest_submission("https://example.com/en/kontakt/");
        let languages = StaticLanguages::new("hr", "en");
        let mut pipeline = new_pipeline(&request, &mock, &languages);

        let first = pipeline.feedback_response(sample_response());
        let second = pipeline.ajax_json_echo(first.clone());
        assert_eq!(second, first);
        assert_eq!(second.message.as_deref(), Some("Greška_en"));

        // Same request, fresh payload: still untouched
        let third = pipeline.feedback_response(sample_response());
        assert_eq!(third, sample_response());
    }

    #[test]
    fn test_idempotence_flag_does_not_leak_across_requests() {
        let mock = MockTranslator::new(MockMode::Suffix("en".to_string()));
        let request = HostRequest::rest_submission("https://example.com/en/kontakt/");
        let languages = StaticLanguages::new("hr", "en");

        let mut first = new_pipeline(&request, &mock, &languages);
        first.feedback_response(sample_response());

        let mut second = new_pipeline(&request, &mock, &languages);
        let response = second.feedback_response(sample_response());
        assert_eq!(response.message.as_deref(), Some("Greška_en"));
    }

    #[test]
    fn test_disabled_response_does_not_set_flag() {
        let mock = MockTranslator::new(MockMode::Suffix("en".to_string()));
        let (request, languages) = croatian_page();
        let mut pipeline = new_pipeline(&request, &mock, &languages);
        pipeline.feedback_response(sample_response());
        assert!(!pipeline.scope().response_translated());
    }

    #[test]
    fn test_refill_response_translates_message_only() {
        let mock = MockTranslator::new(MockMode::Suffix("en".to_string()));
        let (request, languages) = english_page();
        let mut pipeline = new_pipeline(&request, &mock, &languages);

        let refill = pipeline.refill_response(sample_response());
        assert_eq!(refill.message.as_deref(), Some("Greška_en"));
        assert_eq!(refill.invalid_fields, sample_response().invalid_fields);
        // Refill does not consume the response flag
        assert!(!pipeline.scope().response_translated());
    }
}
