//! The unique extension: at most one request in flight.

use pagelet_core::{
    BoxError, Extension, FireCx, FireOutcome, RequestHandle, RequestSettings,
};
use std::sync::Mutex;

/// Cancels any tracked in-flight request when a new one starts.
///
/// Tracking is cleared when the tracked exchange completes, so at most one
/// handle is held at any instant.
#[derive(Default)]
pub struct UniqueExt {
    current: Mutex<Option<RequestHandle>>,
}

impl UniqueExt {
    /// A unique extension with nothing tracked.
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently tracked handle, if a request is in flight.
    pub fn current(&self) -> Option<RequestHandle> {
        self.current.lock().unwrap().clone()
    }
}

impl Extension for UniqueExt {
    async fn on_start(
        &self,
        handle: &RequestHandle,
        _settings: &RequestSettings,
        _cx: &FireCx<'_>,
    ) -> Result<FireOutcome, BoxError> {
        let previous = self.current.lock().unwrap().replace(handle.clone());
        if let Some(previous) = previous {
            tracing::debug!("canceling superseded request");
            previous.cancel();
        }
        Ok(FireOutcome::Continue)
    }

    async fn on_complete(
        &self,
        handle: &RequestHandle,
        _settings: &RequestSettings,
        _cx: &FireCx<'_>,
    ) -> Result<FireOutcome, BoxError> {
        let mut current = self.current.lock().unwrap();
        if current.as_ref().is_some_and(|tracked| tracked.same(handle)) {
            *current = None;
        }
        Ok(FireOutcome::Continue)
    }
}
