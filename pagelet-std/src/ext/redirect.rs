//! The redirect extension: honors server-side redirects.

use pagelet_core::{
    BoxError, Extension, FireCx, FireOutcome, Navigator, RequestHandle, RequestSettings,
    ResponsePayload,
};
use std::sync::Arc;

/// Navigates to a payload's redirect URL and vetoes further success
/// processing.
pub struct RedirectExt {
    navigator: Arc<dyn Navigator>,
}

impl RedirectExt {
    /// A redirect extension navigating through the given navigator.
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self { navigator }
    }
}

impl Extension for RedirectExt {
    async fn on_success(
        &self,
        payload: &ResponsePayload,
        _handle: &RequestHandle,
        _settings: &RequestSettings,
        _cx: &FireCx<'_>,
    ) -> Result<FireOutcome, BoxError> {
        let Some(url) = payload.redirect.as_deref() else {
            return Ok(FireOutcome::Continue);
        };
        tracing::debug!(%url, "payload redirect");
        self.navigator.assign(url);
        Ok(FireOutcome::Veto)
    }
}
