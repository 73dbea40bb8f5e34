//! # pagelet - Extensible Partial-Update Pipeline
//!
//! `pagelet` coordinates AJAX-driven partial page updates ("snippets") for
//! server-rendered web applications. Its heart is an extensible event
//! pipeline: a named-event bus with ordered, cancelable, context-bound
//! handlers ("extensions") that cooperate to decide whether a request
//! fires, how it is built, and how its response mutates the DOM.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pagelet::prelude::*;
//!
//! let bus = Bus::builder(transport)
//!     .document(document)
//!     .navigator(navigator)
//!     .build();
//! bus.init().await?;
//!
//! // Triggered by the host when a bound element fires:
//! bus.request_from(element, event).await?;
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use pagelet_core::{
    ActionOrigin,
    BeforeSendHook,
    // Collaborators
    BindSelectors,
    // Errors
    BoxError,
    BusError,
    Document,
    DynExtension,
    // Triggers
    Element,
    ElementKind,
    // Events
    EventKind,
    ExclusionSet,
    // Extensions
    Extension,
    FieldValue,
    FilePart,
    FireCx,
    FireOutcome,
    FormField,
    FormInfo,
    FormRuntime,
    HandleStatus,
    InFlight,
    IntoOutcome,
    Key,
    KeyCallback,
    KeyStroke,
    Manager,
    Method,
    Modifiers,
    Navigator,
    Part,
    PartValue,
    PrepareHook,
    // Requests
    RequestBody,
    RequestHandle,
    RequestOutcome,
    RequestSettings,
    ResponsePayload,
    StartHook,
    Transport,
    TransportError,
    TransportReply,
    TransportRequest,
    UiEvent,
    ValidateOverrides,
    ValidationRules,
    attrs,
};

pub use pagelet_std::{Bus, BusBuilder, CallbackList, SnippetEngine, escape_selector};

/// Bundled extensions and their canonical ids.
pub mod ext {
    pub use pagelet_std::ext::{
        AbortExt, BinderExt, FormsExt, LoadExt, RedirectExt, SnippetsExt, StateExt, UniqueExt,
        ValidationExt, ids,
    };
}

/// Testing utilities.
pub mod testing {
    pub use pagelet_std::testing::{
        FakeDocument, FakeNavigator, GatedTransport, RecordingExtension, ScriptedFormRuntime,
        StaticTransport,
    };
}

/// Prelude module - common imports for pagelet.
///
/// # Usage
///
/// ```rust,ignore
/// use pagelet::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        BoxError, Bus, BusBuilder, BusError, Document, Element, EventKind, ExclusionSet,
        Extension, FireCx, FireOutcome, FormRuntime, Method, Navigator, RequestOutcome,
        RequestSettings, ResponsePayload, Transport, UiEvent,
    };
}
