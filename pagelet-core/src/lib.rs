//! # pagelet-core
//!
//! Core traits and types for the Pagelet partial-update pipeline.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! extensions and host integrations that don't need the full `pagelet-std`
//! implementation.
//!
//! # Pipeline Architecture
//!
//! Pagelet sequences one request/response lifecycle per user-triggered
//! action and applies declarative DOM patches from the response payload.
//! The moving parts, leaves first:
//!
//! ## Events ([`EventKind`])
//!
//! A fixed vocabulary of eight lifecycle events. `prepare` and `before` are
//! *gating*: their handlers aggregate with short-circuit AND, and a single
//! [`FireOutcome::Veto`] stops the fire. The remaining events are
//! fire-and-collect: every handler runs, vetoes are tracked but do not stop
//! enumeration.
//!
//! ## Extensions ([`Extension`])
//!
//! The unit of pluggable behavior: a named bundle of per-event handlers
//! plus private state. Extensions observe and veto each other's behavior
//! without direct coupling; cross-extension access goes through the manager
//! lookup exposed on [`FireCx`].
//!
//! ## Collaborators
//!
//! The pipeline performs no I/O and touches no real DOM. The host supplies
//! a [`Transport`] (one HTTP exchange, cancelable mid-flight), a
//! [`Document`] (query/patch primitives), a [`Navigator`] (location and
//! hard navigation) and optionally a [`FormRuntime`] (third-party form
//! validation).
//!
//! # Error Types
//!
//! - [`BusError`] - configuration and dependency errors, fail-fast
//! - [`TransportError`] - transport failures surfaced through the `error` event
//! - [`BoxError`] - handler-originated errors

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub mod attrs;
mod dom;
mod error;
mod event;
mod exclusion;
mod extension;
mod outcome;
mod payload;
mod request;
mod transport;

// Re-exports
pub use dom::{
    BindSelectors, Document, Element, FieldValue, FormField, FormInfo, FormRuntime, Key,
    KeyCallback, KeyStroke, Modifiers, Navigator, UiEvent,
};
pub use error::{BoxError, BusError, TransportError};
pub use event::EventKind;
pub use exclusion::ExclusionSet;
pub use extension::{DynExtension, Extension, FireCx, Manager};
pub use outcome::{FireOutcome, IntoOutcome};
pub use payload::ResponsePayload;
pub use request::{
    ActionOrigin, BeforeSendHook, ElementKind, FilePart, Method, Part, PartValue, PrepareHook,
    RequestBody, RequestSettings, StartHook, ValidateOverrides, ValidationRules,
};
pub use transport::{
    HandleStatus, InFlight, RequestHandle, RequestOutcome, Transport, TransportReply,
    TransportRequest,
};
