//! The state extension: tracks the latest page state blob.

use pagelet_core::{
    BoxError, Extension, FireCx, FireOutcome, RequestHandle, RequestSettings, ResponsePayload,
};
use std::sync::Mutex;

/// Stores each payload's opaque state blob for other extensions (most
/// notably a history layer) to read later.
#[derive(Default)]
pub struct StateExt {
    latest: Mutex<Option<serde_json::Value>>,
}

impl StateExt {
    /// A state extension with nothing tracked yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent state blob, if any arrived.
    pub fn latest(&self) -> Option<serde_json::Value> {
        self.latest.lock().unwrap().clone()
    }
}

impl Extension for StateExt {
    async fn on_success(
        &self,
        payload: &ResponsePayload,
        _handle: &RequestHandle,
        _settings: &RequestSettings,
        _cx: &FireCx<'_>,
    ) -> Result<FireOutcome, BoxError> {
        if let Some(state) = &payload.state {
            *self.latest.lock().unwrap() = Some(state.clone());
        }
        Ok(FireOutcome::Continue)
    }
}
