//! The request descriptor and its building blocks.

use crate::dom::{Element, FormInfo, UiEvent};
use crate::exclusion::ExclusionSet;
use crate::transport::RequestHandle;
use serde::Deserialize;
use std::time::Duration;

/// HTTP method of the outgoing request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Method {
    /// GET, the default for links and method-less forms.
    #[default]
    Get,
    /// POST.
    Post,
    /// Anything else, lowercased.
    Other(String),
}

impl Method {
    /// Parse a method attribute value; unknown/empty input yields GET.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "get" => Method::Get,
            "post" => Method::Post,
            other => Method::Other(other.to_owned()),
        }
    }

    /// Lowercase wire name.
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
            Method::Other(s) => s,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The body of an outgoing request.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// Caller-supplied key/value pairs, not yet encoded.
    Pairs(Vec<(String, String)>),
    /// A final urlencoded body.
    Encoded(String),
    /// A multipart body.
    Multipart(Vec<Part>),
}

impl RequestBody {
    /// Whether there is nothing to send.
    pub fn is_empty(&self) -> bool {
        match self {
            RequestBody::Empty => true,
            RequestBody::Pairs(pairs) => pairs.is_empty(),
            RequestBody::Encoded(s) => s.is_empty(),
            RequestBody::Multipart(parts) => parts.is_empty(),
        }
    }
}

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    /// Part name.
    pub name: String,
    /// Part content.
    pub value: PartValue,
}

/// Content of a multipart part.
#[derive(Debug, Clone, PartialEq)]
pub enum PartValue {
    /// Plain text.
    Text(String),
    /// File upload.
    File(FilePart),
}

/// An uploaded file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilePart {
    /// Client-side file name; empty for an untouched file input.
    pub filename: String,
    /// Declared content type, if known.
    pub content_type: Option<String>,
    /// Raw bytes.
    pub bytes: Vec<u8>,
}

impl FilePart {
    /// An untouched file input: no name, no content.
    pub fn is_empty(&self) -> bool {
        self.filename.is_empty() && self.bytes.is_empty()
    }
}

/// Classification of the triggering element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// A `<form>` submitting itself.
    Form,
    /// A submit input or submit button.
    SubmitControl,
    /// An image input.
    ImageControl,
    /// Anything else, treated as a link.
    Link,
}

impl ElementKind {
    /// Classify a triggering element by tag and `type` attribute.
    pub fn classify(element: &Element) -> Self {
        let ty = element.attr("type").unwrap_or("");
        match element.tag.as_str() {
            "form" => ElementKind::Form,
            "input" if ty.eq_ignore_ascii_case("submit") => ElementKind::SubmitControl,
            "button" if ty.eq_ignore_ascii_case("submit") => ElementKind::SubmitControl,
            "input" if ty.eq_ignore_ascii_case("image") => ElementKind::ImageControl,
            _ => ElementKind::Link,
        }
    }

    /// Whether this kind submits a form.
    pub fn is_form_related(self) -> bool {
        !matches!(self, ElementKind::Link)
    }
}

/// The DOM action a request originated from.
///
/// Derived once when a trigger fires and owned exclusively by the request
/// descriptor; extensions read it, never share it.
#[derive(Debug, Clone)]
pub struct ActionOrigin {
    /// The triggering UI event.
    pub event: UiEvent,
    /// The triggering element.
    pub element: Element,
    /// Its classification.
    pub kind: ElementKind,
    /// The resolved owning form, when the trigger submits one.
    pub form: Option<FormInfo>,
}

impl ActionOrigin {
    /// Derive the origin record from a trigger: classify the element and
    /// resolve the owning form.
    pub fn derive(element: Element, event: UiEvent) -> Self {
        let kind = ElementKind::classify(&element);
        let form = if kind.is_form_related() {
            element.form.clone()
        } else {
            None
        };
        Self {
            event,
            element,
            kind,
            form,
        }
    }
}

/// Partial override of the validation extension's checks.
///
/// Merged onto the extension defaults; fields left out keep their default.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct ValidateOverrides {
    /// Override the modifier-key check.
    #[serde(default)]
    pub keys: Option<bool>,
    /// Override the URL check.
    #[serde(default)]
    pub url: Option<bool>,
    /// Override the native form validation check.
    #[serde(default)]
    pub form: Option<bool>,
}

impl ValidateOverrides {
    /// Disable all three checks.
    pub fn none() -> Self {
        Self {
            keys: Some(false),
            url: Some(false),
            form: Some(false),
        }
    }
}

/// Effective validation checks after overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
    /// Veto on modifier keys / non-primary buttons.
    pub keys: bool,
    /// Veto on same-page anchors and non-http schemes.
    pub url: bool,
    /// Veto when the native form validator rejects.
    pub form: bool,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            keys: true,
            url: true,
            form: true,
        }
    }
}

impl ValidationRules {
    /// Apply a partial override.
    pub fn apply(self, overrides: ValidateOverrides) -> Self {
        Self {
            keys: overrides.keys.unwrap_or(self.keys),
            url: overrides.url.unwrap_or(self.url),
            form: overrides.form.unwrap_or(self.form),
        }
    }
}

/// One-off per-call customization of the settings, run after `prepare`.
pub type PrepareHook = Box<dyn FnOnce(&mut RequestSettings) + Send + Sync>;

/// One-off gate run after `before`; returning `false` aborts the send.
pub type BeforeSendHook = Box<dyn FnOnce(&RequestSettings) -> bool + Send + Sync>;

/// One-off observer run after the `start` fire.
pub type StartHook = Box<dyn FnOnce(&RequestHandle, &RequestSettings) + Send + Sync>;

/// Configuration of one outgoing request (the request descriptor).
#[derive(Default)]
pub struct RequestSettings {
    /// Target URL.
    pub url: String,
    /// HTTP method.
    pub method: Method,
    /// Request body; the forms extension replaces it for form submissions.
    pub body: RequestBody,
    /// Extensions/events excluded for this request only.
    pub off: ExclusionSet,
    /// Pass-through transport timeout; the pipeline adds none of its own.
    pub timeout: Option<Duration>,
    /// The DOM action this request originated from, when it did.
    pub origin: Option<ActionOrigin>,
    /// Per-call override of validation checks.
    pub validate: Option<ValidateOverrides>,
    /// One-off settings customization hook.
    pub prepare: Option<PrepareHook>,
    /// One-off final gate before the transport engages.
    pub before_send: Option<BeforeSendHook>,
    /// One-off observer of the issued handle.
    pub start: Option<StartHook>,
}

impl RequestSettings {
    /// Settings for a bare URL, everything else defaulted.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

impl From<&str> for RequestSettings {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for RequestSettings {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}
