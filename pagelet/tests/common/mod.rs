#![allow(dead_code)]

use pagelet::testing::{FakeDocument, FakeNavigator, ScriptedFormRuntime, StaticTransport};
use pagelet::{Bus, BusBuilder};
use std::sync::Arc;

/// A fully wired bus plus handles to every fake collaborator.
pub struct TestHost {
    pub transport: Arc<StaticTransport>,
    pub document: Arc<FakeDocument>,
    pub navigator: Arc<FakeNavigator>,
    pub runtime: Arc<ScriptedFormRuntime>,
    pub bus: Arc<Bus>,
}

/// A bus with all bundled extensions and fake collaborators.
pub fn host() -> TestHost {
    let transport = Arc::new(StaticTransport::new());
    let document = Arc::new(FakeDocument::new());
    let navigator = Arc::new(FakeNavigator::at("http://app.test/list?page=1"));
    let runtime = Arc::new(ScriptedFormRuntime::accepting());
    let bus = BusBuilder::new(transport.clone())
        .document(document.clone())
        .navigator(navigator.clone())
        .form_runtime(runtime.clone())
        .build();
    TestHost {
        transport,
        document,
        navigator,
        runtime,
        bus: Arc::new(bus),
    }
}

/// A bus with no extensions at all, over a static transport.
pub fn bare_bus() -> (Arc<StaticTransport>, Bus) {
    let transport = Arc::new(StaticTransport::new());
    let bus = Bus::new(transport.clone());
    (transport, bus)
}
