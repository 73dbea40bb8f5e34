//! The auto-rebind extension.

use pagelet_core::{
    BoxError, Extension, FireCx, FireOutcome, RequestHandle, RequestSettings, ResponsePayload,
};

/// Re-fires `load` after every successful response.
///
/// Snippet replacement can introduce new triggering elements; rebinding
/// after each success keeps them wired.
#[derive(Default)]
pub struct LoadExt;

impl LoadExt {
    /// The auto-rebind extension.
    pub fn new() -> Self {
        Self
    }
}

impl Extension for LoadExt {
    async fn on_success(
        &self,
        _payload: &ResponsePayload,
        _handle: &RequestHandle,
        _settings: &RequestSettings,
        cx: &FireCx<'_>,
    ) -> Result<FireOutcome, BoxError> {
        cx.rebind().await?;
        Ok(FireOutcome::Continue)
    }
}
