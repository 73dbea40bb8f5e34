//! Builder wiring the bundled extensions to host collaborators.

use crate::bus::Bus;
use crate::ext::{
    AbortExt, BinderExt, FormsExt, LoadExt, RedirectExt, SnippetsExt, StateExt, UniqueExt,
    ValidationExt, ids,
};
use pagelet_core::{BindSelectors, Document, Extension, FormRuntime, Navigator, Transport};
use std::sync::Arc;

/// Builds a [`Bus`] with the bundled extensions registered in their
/// canonical order.
///
/// Extensions that need an absent collaborator are skipped: `snippets`,
/// `abort` and the binder need a document, `redirect` needs a navigator.
/// Call [`without_default_extensions`](BusBuilder::without_default_extensions)
/// for an empty bus with collaborators attached.
pub struct BusBuilder {
    transport: Arc<dyn Transport>,
    document: Option<Arc<dyn Document>>,
    navigator: Option<Arc<dyn Navigator>>,
    form_runtime: Option<Arc<dyn FormRuntime>>,
    selectors: BindSelectors,
    defaults: bool,
}

impl BusBuilder {
    /// A builder over the given transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            document: None,
            navigator: None,
            form_runtime: None,
            selectors: BindSelectors::default(),
            defaults: true,
        }
    }

    /// Attach the host document.
    pub fn document(mut self, document: Arc<dyn Document>) -> Self {
        self.document = Some(document);
        self
    }

    /// Attach the host navigator.
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Attach a third-party form validation runtime.
    pub fn form_runtime(mut self, runtime: Arc<dyn FormRuntime>) -> Self {
        self.form_runtime = Some(runtime);
        self
    }

    /// Override the trigger selectors used by the default binder.
    pub fn selectors(mut self, selectors: BindSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// Skip the bundled extensions entirely.
    pub fn without_default_extensions(mut self) -> Self {
        self.defaults = false;
        self
    }

    /// Build the bus.
    pub fn build(self) -> Bus {
        let mut bus = Bus::new(self.transport);
        if let Some(navigator) = self.navigator.clone() {
            bus = bus.with_navigator(navigator);
        }
        if !self.defaults {
            return bus;
        }

        let mut validation = ValidationExt::new();
        if let Some(navigator) = self.navigator.clone() {
            validation = validation.with_navigator(navigator);
        }
        if let Some(runtime) = self.form_runtime.clone() {
            validation = validation.with_runtime(runtime);
        }
        seed(&bus, ids::VALIDATION, validation);

        let mut forms = FormsExt::new();
        if let Some(runtime) = self.form_runtime.clone() {
            forms = forms.with_runtime(runtime);
        }
        seed(&bus, ids::FORMS, forms);

        if let Some(document) = self.document.clone() {
            seed(&bus, ids::SNIPPETS, SnippetsExt::new(document));
        }
        if let Some(navigator) = self.navigator.clone() {
            seed(&bus, ids::REDIRECT, RedirectExt::new(navigator));
        }
        seed(&bus, ids::STATE, StateExt::new());
        seed(&bus, ids::UNIQUE, UniqueExt::new());
        if let Some(document) = self.document.clone() {
            seed(&bus, ids::ABORT, AbortExt::new(document));
        }
        seed(&bus, ids::LOAD, LoadExt::new());
        if let Some(document) = self.document {
            seed(
                &bus,
                ids::INIT,
                BinderExt::new(document).with_selectors(self.selectors),
            );
        }
        bus
    }
}

// The builder owns a freshly created bus, so the bundled ids cannot clash.
fn seed<X: Extension>(bus: &Bus, id: &str, ext: X) {
    bus.register(id, ext)
        .expect("bundled extension ids are unique");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDocument, FakeNavigator, StaticTransport};

    #[test]
    fn registers_bundled_extensions_in_canonical_order() {
        let bus = BusBuilder::new(Arc::new(StaticTransport::new()))
            .document(Arc::new(FakeDocument::new()))
            .navigator(Arc::new(FakeNavigator::at("http://app.test/")))
            .build();
        assert_eq!(
            bus.ids(),
            vec![
                "validation",
                "forms",
                "snippets",
                "redirect",
                "state",
                "unique",
                "abort",
                "load",
                "init"
            ]
        );
    }

    #[test]
    fn document_dependent_extensions_are_skipped_without_a_document() {
        let bus = BusBuilder::new(Arc::new(StaticTransport::new())).build();
        assert!(!bus.contains(ids::SNIPPETS));
        assert!(!bus.contains(ids::ABORT));
        assert!(!bus.contains(ids::INIT));
        assert!(!bus.contains(ids::REDIRECT));
        assert!(bus.contains(ids::VALIDATION));
    }

    #[test]
    fn defaults_can_be_skipped() {
        let bus = BusBuilder::new(Arc::new(StaticTransport::new()))
            .without_default_extensions()
            .build();
        assert!(bus.ids().is_empty());
    }
}
