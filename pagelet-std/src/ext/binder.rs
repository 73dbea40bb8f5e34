//! The default binder extension (registered under the `init` id).

use pagelet_core::{BindSelectors, BoxError, Document, Extension, FireCx, FireOutcome};
use std::sync::Arc;

/// Installs delegated request triggers on every `load`.
///
/// The selector set is configurable; the host's document implementation
/// owns the actual event delegation and feeds triggered actions back into
/// the bus.
pub struct BinderExt {
    document: Arc<dyn Document>,
    selectors: BindSelectors,
}

impl BinderExt {
    /// A binder with the default `.ajax` selectors.
    pub fn new(document: Arc<dyn Document>) -> Self {
        Self {
            document,
            selectors: BindSelectors::default(),
        }
    }

    /// Override the trigger selectors.
    pub fn with_selectors(mut self, selectors: BindSelectors) -> Self {
        self.selectors = selectors;
        self
    }
}

impl Extension for BinderExt {
    async fn on_load(&self, _cx: &FireCx<'_>) -> Result<FireOutcome, BoxError> {
        self.document.install_triggers(&self.selectors);
        Ok(FireOutcome::Continue)
    }
}
