//! The response payload contract.

use serde::Deserialize;
use std::collections::BTreeMap;

/// A parsed response payload.
///
/// Servers answer with a JSON object whose members are all optional:
/// `snippets` maps element ids to replacement markup, `redirect` asks for a
/// hard navigation, `state` is an opaque blob passed through unmodified.
/// Unknown members are retained for custom extensions.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResponsePayload {
    /// Element id → replacement markup.
    #[serde(default)]
    pub snippets: BTreeMap<String, String>,
    /// Absolute or relative URL to navigate to.
    #[serde(default)]
    pub redirect: Option<String>,
    /// Opaque page state blob.
    #[serde(default)]
    pub state: Option<serde_json::Value>,
    /// Everything else the server sent.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ResponsePayload {
    /// Parse a raw response body.
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// Whether the payload carries any snippets.
    pub fn has_snippets(&self) -> bool {
        !self.snippets.is_empty()
    }
}
