//! Lifecycle event vocabulary.

use std::fmt;

/// The fixed set of pipeline events.
///
/// Each request/response lifecycle walks `prepare` → `before` → `start` →
/// (`success` | `error`) → `complete`. `init` fires once when the pipeline
/// is initialized and `load` fires on every (re)bind of request triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// One-time pipeline initialization.
    Init,
    /// (Re)binding of delegated request triggers.
    Load,
    /// Request settings are being assembled; handlers may mutate them.
    Prepare,
    /// Last gate before the transport engages; a veto aborts the send.
    Before,
    /// The request was issued; the handle is available for cancellation.
    Start,
    /// The response payload arrived and parsed.
    Success,
    /// The transport failed.
    Error,
    /// The exchange settled, whatever the outcome.
    Complete,
}

impl EventKind {
    /// All events, in lifecycle order.
    pub const ALL: [EventKind; 8] = [
        EventKind::Init,
        EventKind::Load,
        EventKind::Prepare,
        EventKind::Before,
        EventKind::Start,
        EventKind::Success,
        EventKind::Error,
        EventKind::Complete,
    ];

    /// Stable lowercase name, matched against off-list tokens.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::Init => "init",
            EventKind::Load => "load",
            EventKind::Prepare => "prepare",
            EventKind::Before => "before",
            EventKind::Start => "start",
            EventKind::Success => "success",
            EventKind::Error => "error",
            EventKind::Complete => "complete",
        }
    }

    /// Gating events aggregate handler outcomes with short-circuit AND;
    /// the rest run every handler and only track vetoes.
    pub fn is_gating(self) -> bool {
        matches!(self, EventKind::Prepare | EventKind::Before)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
