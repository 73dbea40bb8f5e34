//! Declarative DOM attribute surface.
//!
//! These attribute names are read by the request orchestrator, the snippet
//! patch engine and the bundled extensions.

/// Per-element list of extensions/events excluded for requests it triggers.
pub const OFF: &str = "data-ajax-off";

/// Per-element override of validation checks: `false` disables all of them,
/// a JSON object selectively disables a subset.
pub const VALIDATE: &str = "data-ajax-validate";

/// When present (and not `"false"`), the native browser action is not
/// suppressed after the AJAX path handled the trigger.
pub const PASS: &str = "data-ajax-pass";

/// Snippet patch mode marker: append the fragment instead of replacing.
pub const APPEND: &str = "data-ajax-append";

/// Snippet patch mode marker: prepend the fragment instead of replacing.
pub const PREPEND: &str = "data-ajax-prepend";

/// Stash for a pending title change when a history layer owns title
/// mutation.
pub const PENDING_TITLE: &str = "data-ajax-update";
