//! Error types for the pipeline.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`BusError`] - configuration, dependency and handler errors
//! - [`TransportError`] - transport failures surfaced through the `error` event

use crate::event::EventKind;
use thiserror::Error;

/// A boxed error type for handler-originated errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by the bus itself.
///
/// Configuration errors fail fast at the call site; dependency errors name
/// both the dependent and the missing extension. Veto outcomes are *not*
/// errors — they are ordinary control flow carried by
/// [`FireOutcome`](crate::FireOutcome).
#[derive(Error, Debug)]
pub enum BusError {
    /// An extension with the same id is already registered.
    #[error("extension '{id}' is already registered")]
    DuplicateExtension {
        /// The contested id.
        id: String,
    },

    /// A required cross-extension lookup found nothing.
    #[error("extension '{dependent}' depends on missing extension '{missing}'")]
    MissingDependency {
        /// The extension that asked.
        dependent: String,
        /// The id it asked for.
        missing: String,
    },

    /// `init` was called a second time.
    #[error("pipeline is already initialized")]
    AlreadyInitialized,

    /// A handler failed; the fire it belonged to was aborted.
    #[error("extension '{id}' failed during {event}")]
    Extension {
        /// The misbehaving extension.
        id: String,
        /// The event that was being fired.
        event: EventKind,
        /// The underlying failure.
        #[source]
        source: BoxError,
    },
}

/// Errors reported by the transport collaborator.
///
/// Surfaced through the `error` event with no automatic retry; reaction is
/// entirely up to whichever extension or integrator chooses to observe it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The server answered with a non-success status.
    #[error("request failed with status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body, if any.
        body: String,
    },

    /// The exchange failed below the HTTP layer.
    #[error("transport failure: {0}")]
    Io(String),

    /// The response body was not a well-formed payload.
    #[error("malformed response payload: {0}")]
    Payload(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_error_names_both_sides() {
        let err = BusError::MissingDependency {
            dependent: "forms".into(),
            missing: "snippets".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("forms") && msg.contains("snippets"));
    }

    #[test]
    fn extension_error_carries_source() {
        let err = BusError::Extension {
            id: "broken".into(),
            event: EventKind::Success,
            source: "inner".into(),
        };
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("success"));
    }
}
