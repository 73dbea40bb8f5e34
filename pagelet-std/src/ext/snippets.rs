//! The snippets extension: applies response snippet maps to the document.

use crate::ext::ids;
use crate::snippets::SnippetEngine;
use pagelet_core::{
    BoxError, Document, Extension, FireCx, FireOutcome, RequestHandle, RequestSettings,
    ResponsePayload,
};
use std::sync::Arc;

/// Delegates each successful response's snippet map to the patch engine.
///
/// History recording is suppressed when the `history` extension is absent
/// or excluded for the request. Other extensions reach the patch queues
/// through [`engine`](SnippetsExt::engine).
pub struct SnippetsExt {
    engine: Arc<SnippetEngine>,
}

impl SnippetsExt {
    /// A snippets extension patching the given document.
    pub fn new(document: Arc<dyn Document>) -> Self {
        Self {
            engine: Arc::new(SnippetEngine::new(document)),
        }
    }

    /// The shared patch engine.
    pub fn engine(&self) -> &SnippetEngine {
        &self.engine
    }
}

impl Extension for SnippetsExt {
    async fn on_success(
        &self,
        payload: &ResponsePayload,
        _handle: &RequestHandle,
        settings: &RequestSettings,
        cx: &FireCx<'_>,
    ) -> Result<FireOutcome, BoxError> {
        if !payload.has_snippets() {
            return Ok(FireOutcome::Continue);
        }
        let record_history = cx.has(ids::HISTORY) && !settings.off.contains(ids::HISTORY);
        self.engine
            .update(&payload.snippets, false, record_history)
            .await;
        Ok(FireOutcome::Continue)
    }
}
