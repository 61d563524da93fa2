//! Contact Form 7 integration for the ANT Translate core
//!
//! Translates CF7 form markup, mail templates, messages and submission
//! responses into the request's target language, without ever touching the
//! `[tag]` placeholders CF7 substitutes later.
//!
//! # Workflow Example
//!
//! ```ignore
//! use ant_translate_cf7::{
//!     Collaborators, DictionaryTranslator, Hook, HostRequest, RequestPipeline, StaticLanguages,
//!     TextNodeTranslator,
//! };
//!
//! let mut dictionary = DictionaryTranslator::new();
//! dictionary.with_entry("Kontakt Forma", "Contact Form");
//! let html = TextNodeTranslator::new(dictionary.clone());
//! let languages = StaticLanguages::new("hr", "en");
//!
//! // One pipeline per request
//! let request = HostRequest::rest_submission("https://example.com/en/contact/");
//! let mut pipeline = RequestPipeline::new(
//!     &request,
//!     Collaborators { plain: Some(&dictionary), html: Some(&html), languages: Some(&languages) },
//! );
//!
//! let mail = pipeline.apply(Hook::MailProperty, mail_json);
//! ```

pub mod config;
pub mod context;
pub mod dictionary;
pub mod error;
pub mod hooks;
pub mod html;
pub mod mock;
pub mod payload;
pub mod pipeline;
pub mod scope;
pub mod tags;
pub mod translator;

pub use config::Settings;
pub use context::{Decision, HostRequest, PageLanguages, RequestContext, classify, should_translate};
pub use dictionary::{
    DictionaryTranslator, load_dictionaries_from_dir, load_dictionary, load_dictionary_from_file,
};
pub use error::{Cf7Error, Cf7Result};
pub use hooks::Hook;
pub use html::TextNodeTranslator;
pub use mock::{MockMode, MockTranslator};
pub use payload::{
    InvalidField, InvalidFieldEntry, MailProperty, MessagesProperty, ResponsePayload,
};
pub use pipeline::{Collaborators, RequestPipeline};
pub use scope::RequestScope;
pub use tags::{TagMap, mask_tags, safe_translate, translate_sender_name, unmask_tags};
pub use translator::{HtmlTranslator, LanguageResolver, PlainTranslator, StaticLanguages};

/// Add-on version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
