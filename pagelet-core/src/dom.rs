//! Host-side collaborators: document, navigator, form runtime, UI events.
//!
//! The pipeline never touches a real DOM. The host supplies a [`Document`]
//! for query/patch primitives and feeds triggering UI actions in as plain
//! data ([`Element`], [`UiEvent`]). Everything here is the *interface the
//! core needs*, nothing more.

use crate::request::FilePart;
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

bitflags::bitflags! {
    /// Modifier keys active on a pointer or keyboard event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u8 {
        /// Control key.
        const CTRL = 1;
        /// Shift key.
        const SHIFT = 1 << 1;
        /// Alt/Option key.
        const ALT = 1 << 2;
        /// Meta/Command key.
        const META = 1 << 3;
    }
}

/// The originating UI action (click or submit) as the core sees it.
///
/// The core only reads button/modifier state and flips the prevent-default
/// and stop-propagation flags; the host owns the real event object and
/// honors the flags afterwards.
#[derive(Debug, Clone, Default)]
pub struct UiEvent {
    /// Pointer button; `0` is the primary button.
    pub button: u8,
    /// Modifier keys held during the action.
    pub modifiers: Modifiers,
    /// Pointer position relative to the control, for image controls.
    pub offset: Option<(i32, i32)>,
    flags: Arc<EventFlags>,
}

#[derive(Debug, Default)]
struct EventFlags {
    prevented: AtomicBool,
    stopped: AtomicBool,
}

impl UiEvent {
    /// An unmodified primary-button action.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the modifier keys.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Set the pointer button.
    pub fn with_button(mut self, button: u8) -> Self {
        self.button = button;
        self
    }

    /// Set the pointer offset relative to the control.
    pub fn with_offset(mut self, x: i32, y: i32) -> Self {
        self.offset = Some((x, y));
        self
    }

    /// Whether a modifier key or a non-primary button signals
    /// open-in-new-view intent.
    pub fn modified(&self) -> bool {
        self.button != 0 || !self.modifiers.is_empty()
    }

    /// Suppress the native default action.
    pub fn prevent_default(&self) {
        self.flags.prevented.store(true, Ordering::Release);
    }

    /// Whether the default action was suppressed.
    pub fn default_prevented(&self) -> bool {
        self.flags.prevented.load(Ordering::Acquire)
    }

    /// Stop the native event from propagating further.
    pub fn stop_propagation(&self) {
        self.flags.stopped.store(true, Ordering::Release);
    }

    /// Whether propagation was stopped.
    pub fn propagation_stopped(&self) -> bool {
        self.flags.stopped.load(Ordering::Acquire)
    }
}

/// Keys the pipeline reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Escape.
    Escape,
    /// Enter.
    Enter,
    /// Anything else.
    Other,
}

/// A document-level keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStroke {
    /// The pressed key.
    pub key: Key,
    /// Modifier keys held.
    pub modifiers: Modifiers,
}

impl KeyStroke {
    /// A bare key press with no modifiers.
    pub fn bare(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::empty(),
        }
    }
}

/// A document-level keyboard callback.
pub type KeyCallback = Arc<dyn Fn(&KeyStroke) + Send + Sync>;

/// The triggering element of a request, as plain data.
///
/// `form` holds the element's own form description when the element *is* a
/// form, otherwise its closest enclosing form, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    /// Lowercase tag name.
    pub tag: String,
    /// Attribute map.
    pub attrs: BTreeMap<String, String>,
    /// Own or enclosing form.
    pub form: Option<FormInfo>,
}

impl Element {
    /// A bare element with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Add an attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Attach the own/enclosing form description.
    pub fn with_form(mut self, form: FormInfo) -> Self {
        self.form = Some(form);
        self
    }

    /// Read an attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Whether the attribute is present, whatever its value.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }
}

/// A form as the pipeline needs it: target, method and serializable fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormInfo {
    /// `action` attribute, if declared.
    pub action: Option<String>,
    /// `method` attribute, if declared.
    pub method: Option<String>,
    /// Serializable fields in document order.
    pub fields: Vec<FormField>,
}

impl FormInfo {
    /// An empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the action target.
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Set the submit method.
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Add a text field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(FormField {
            name: name.into(),
            value: FieldValue::Text(value.into()),
        });
        self
    }

    /// Add a file field.
    pub fn with_file(mut self, name: impl Into<String>, file: FilePart) -> Self {
        self.fields.push(FormField {
            name: name.into(),
            value: FieldValue::File(file),
        });
        self
    }

    /// Whether the form declares a POST method.
    pub fn is_post(&self) -> bool {
        self.method
            .as_deref()
            .is_some_and(|m| m.eq_ignore_ascii_case("post"))
    }
}

/// One named form field.
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    /// Field name.
    pub name: String,
    /// Field value.
    pub value: FieldValue,
}

/// A form field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Plain text value.
    Text(String),
    /// File upload.
    File(FilePart),
}

/// CSS selectors the default binder extension installs triggers for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindSelectors {
    /// Link selector.
    pub links: String,
    /// Form selector.
    pub forms: String,
    /// Submit/image control selector.
    pub buttons: String,
}

impl Default for BindSelectors {
    fn default() -> Self {
        Self {
            links: "a.ajax".into(),
            forms: "form.ajax".into(),
            buttons: "input.ajax[type=\"submit\"], button.ajax[type=\"submit\"], \
                      input.ajax[type=\"image\"]"
                .into(),
        }
    }
}

/// DOM query/patch primitives the pipeline needs from the host.
///
/// Nodes are addressed by opaque string keys returned from [`select`].
///
/// [`select`]: Document::select
pub trait Document: Send + Sync {
    /// Resolve a CSS selector to the matched element's node key, if any.
    fn select(&self, selector: &str) -> Option<String>;

    /// Lowercase tag name of a node.
    fn tag_of(&self, node: &str) -> Option<String>;

    /// Current inner markup of a node.
    fn inner_html(&self, node: &str) -> Option<String>;

    /// Replace a node's inner markup.
    fn set_inner_html(&self, node: &str, markup: &str);

    /// Append markup to a node's content.
    fn append_html(&self, node: &str, markup: &str);

    /// Prepend markup to a node's content.
    fn prepend_html(&self, node: &str, markup: &str);

    /// Read an attribute of a node.
    fn attr(&self, node: &str, name: &str) -> Option<String>;

    /// Write an attribute of a node.
    fn set_attr(&self, node: &str, name: &str, value: &str);

    /// Set the document title.
    fn set_title(&self, text: &str);

    /// Resolve once pending visual effects on the given nodes have settled.
    fn settle(&self, nodes: &[String]) -> BoxFuture<'static, ()>;

    /// (Re)install delegated request triggers for the given selector set.
    fn install_triggers(&self, selectors: &BindSelectors);

    /// Register a document-level keyboard callback.
    fn bind_keydown(&self, callback: KeyCallback);
}

/// Browser navigation as the pipeline needs it.
pub trait Navigator: Send + Sync {
    /// Absolute URL of the current page.
    fn location(&self) -> String;

    /// Hard navigation to the given URL.
    fn assign(&self, url: &str);
}

/// Third-party form validation runtime.
pub trait FormRuntime: Send + Sync {
    /// Run validation for a form about to submit. `submitted_by` names the
    /// control that initiated the submission, when one did.
    fn validate(&self, form: &FormInfo, submitted_by: Option<&str>) -> bool;

    /// Re-initialize validation bindings on forms inside a freshly patched
    /// node.
    fn init_forms_within(&self, node: &str);
}
