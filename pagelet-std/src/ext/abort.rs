//! The abort extension: Escape cancels the current request.

use pagelet_core::{
    BoxError, Document, Extension, FireCx, FireOutcome, Key, RequestHandle, RequestSettings,
};
use std::sync::{Arc, Mutex};

/// Tracks the current in-flight handle and cancels it on a bare Escape.
pub struct AbortExt {
    document: Arc<dyn Document>,
    current: Arc<Mutex<Option<RequestHandle>>>,
}

impl AbortExt {
    /// An abort extension listening on the given document.
    pub fn new(document: Arc<dyn Document>) -> Self {
        Self {
            document,
            current: Arc::new(Mutex::new(None)),
        }
    }
}

impl Extension for AbortExt {
    async fn on_init(&self, _cx: &FireCx<'_>) -> Result<FireOutcome, BoxError> {
        let current = Arc::clone(&self.current);
        self.document.bind_keydown(Arc::new(move |stroke| {
            if stroke.key == Key::Escape && stroke.modifiers.is_empty() {
                if let Some(handle) = current.lock().unwrap().as_ref() {
                    tracing::debug!("escape pressed; canceling request");
                    handle.cancel();
                }
            }
        }));
        Ok(FireOutcome::Continue)
    }

    async fn on_start(
        &self,
        handle: &RequestHandle,
        _settings: &RequestSettings,
        _cx: &FireCx<'_>,
    ) -> Result<FireOutcome, BoxError> {
        *self.current.lock().unwrap() = Some(handle.clone());
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
