//! Translation context classification
//!
//! Decides, once per request, whether anything produced during the request
//! should be translated. Three kinds of request matter:
//!
//! - ordinary page loads, which carry the language in their own URL;
//! - the form editor in the admin, which must never be translated;
//! - AJAX/REST submissions, which arrive on a language-neutral endpoint. For
//!   those the only signal is the page the visitor submitted *from*, so the
//!   referer path is inspected, but only when the call is provably a CF7
//!   submission and not unrelated admin-ajax traffic.
//!
//! Every missing signal degrades to "do not translate".

use crate::translator::LanguageResolver;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::debug;

/// POST fields CF7 adds to every submission
pub const SUBMISSION_FIELDS: [&str; 3] = ["_wpcf7", "_wpcf7_version", "_wpcf7_unit_tag"];

/// Route fragment of the CF7 REST API
pub const SUBMISSION_ROUTE: &str = "/contact-form-7/";

// scheme, then optional authority, then the path up to query or fragment
static URL_PATH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z][A-Za-z0-9+.\-]*:)?(?://[^/?#]*)?([^?#]*)")
        .expect("url path pattern is valid")
});

/// Raw signals the host exposes about the current request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostRequest {
    /// The request targets an admin screen
    pub is_admin: bool,
    /// The request is an admin-ajax call
    pub doing_ajax: bool,
    /// The request is served by the REST API
    pub serving_rest: bool,
    /// Referer explicitly supplied with the request (preferred)
    pub referer: Option<String>,
    /// Raw `Referer` header (fallback)
    pub referer_header: Option<String>,
    /// Raw request URI
    pub request_uri: Option<String>,
    /// Names of the submitted POST fields
    pub post_fields: BTreeSet<String>,
}

impl HostRequest {
    /// A front-end page load
    pub fn page_load() -> Self {
        Self::default()
    }

    /// A CF7 REST submission posted from `referer`
    pub fn rest_submission(referer: &str) -> Self {
        Self {
            serving_rest: true,
            referer: Some(referer.to_string()),
            request_uri: Some("/wp-json/contact-form-7/v1/contact-forms/1/feedback".to_string()),
            post_fields: SUBMISSION_FIELDS.iter().map(|f| f.to_string()).collect(),
            ..Self::default()
        }
    }

    fn is_ajax_or_rest(&self) -> bool {
        self.doing_ajax || self.serving_rest
    }

    fn has_submission_marker(&self) -> bool {
        SUBMISSION_FIELDS
            .iter()
            .any(|field| self.post_fields.contains(*field))
            || self
                .request_uri
                .as_deref()
                .is_some_and(|uri| uri.contains(SUBMISSION_ROUTE))
    }

    /// The usable referer: explicit first, then the raw header
    fn effective_referer(&self) -> Option<&str> {
        [self.referer.as_deref(), self.referer_header.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|referer| !referer.is_empty())
    }
}

/// Languages known for the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLanguages {
    pub current: String,
    pub target_slug: String,
}

/// Request-scoped view the classifier works on
///
/// Built once per request from the host signals and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub is_admin_screen: bool,
    pub is_ajax_or_rest: bool,
    /// `None` when no language resolver is available
    pub languages: Option<PageLanguages>,
    /// Path component of the referer, empty when there is no usable referer
    pub referer_path: String,
    pub submission_marker_present: bool,
}

impl RequestContext {
    pub fn build(request: &HostRequest, languages: Option<&dyn LanguageResolver>) -> Self {
        RequestContext {
            is_admin_screen: request.is_admin,
            is_ajax_or_rest: request.is_ajax_or_rest(),
            languages: languages.map(|resolver| PageLanguages {
                current: resolver.current_language(),
                target_slug: resolver.target_language_slug(),
            }),
            referer_path: request
                .effective_referer()
                .map(url_path)
                .unwrap_or_default(),
            submission_marker_present: request.has_submission_marker(),
        }
    }
}

/// Which rule settled a [`classify`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    AdminScreen,
    LanguageUnavailable,
    NoTargetLanguage,
    PageInTargetLanguage,
    NotASubmission,
    RefererInTargetLanguage,
    RefererInOtherLanguage,
    OtherContext,
}

impl Decision {
    pub fn translates(self) -> bool {
        matches!(
            self,
            Decision::PageInTargetLanguage | Decision::RefererInTargetLanguage
        )
    }
}

/// Run the decision rules in order; the first matching rule wins
pub fn classify(ctx: &RequestContext) -> Decision {
    if ctx.is_admin_screen && !ctx.is_ajax_or_rest {
        return Decision::AdminScreen;
    }

    let Some(languages) = &ctx.languages else {
        return Decision::LanguageUnavailable;
    };

    if languages.target_slug.is_empty() {
        return Decision::NoTargetLanguage;
    }

    if languages.current == languages.target_slug {
        return Decision::PageInTargetLanguage;
    }

    if ctx.is_ajax_or_rest {
        if !ctx.submission_marker_present {
            return Decision::NotASubmission;
        }
        if path_has_segment(&ctx.referer_path, &languages.target_slug) {
            return Decision::RefererInTargetLanguage;
        }
        return Decision::RefererInOtherLanguage;
    }

    Decision::OtherContext
}

/// Should payloads produced during this request be translated?
pub fn should_translate(ctx: &RequestContext) -> bool {
    let decision = classify(ctx);
    debug!(?decision, referer_path = %ctx.referer_path, "CF7 translation context");
    decision.translates()
}

/// Path component of a URL; relative references are accepted as-is
pub fn url_path(url: &str) -> String {
    URL_PATH_PATTERN
        .captures(url.trim())
        .and_then(|captures| captures.get(1))
        .map(|path| path.as_str().to_string())
        .unwrap_or_default()
}

/// Does `path` contain `slug` as a whole segment (`/slug/` or trailing `/slug`)?
pub fn path_has_segment(path: &str, slug: &str) -> bool {
    if path.is_empty() || slug.is_empty() {
        return false;
    }
    let needle = format!("/{}", slug);
    path.match_indices(&needle).any(|(start, _)| {
        let rest = &path[start + needle.len()..];
        rest.is_empty() || rest.starts_with('/')
    })
}
