//! Per-request exclusion of extensions and events.

use std::collections::BTreeSet;

/// A normalized set of exclusion tokens for one request.
///
/// A token matching a registered extension id skips that extension's
/// handlers; a token matching an event name suppresses that event entirely.
/// The set is a per-invocation override, never global state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet(BTreeSet<String>);

impl ExclusionSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the `data-ajax-off` attribute value.
    ///
    /// Accepts a JSON array (`["a", "b"]`), a comma-separated list or a
    /// space-separated list. Tokens are trimmed and empties dropped; a
    /// malformed array degrades to the delimiter forms.
    pub fn parse_attr(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with('[') {
            if let Ok(items) = serde_json::from_str::<Vec<String>>(raw) {
                return items.into_iter().collect();
            }
        }
        if raw.contains(',') {
            raw.split(',').collect()
        } else {
            raw.split_whitespace().collect()
        }
    }

    /// Whether the given token is excluded.
    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    /// Add a token.
    pub fn insert(&mut self, token: impl Into<String>) {
        self.0.insert(token.into());
    }

    /// Whether nothing is excluded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of excluded tokens.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate the tokens.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(Into::into)
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }
}
