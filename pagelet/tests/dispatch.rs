//! Dispatch semantics: ordering, gating, exclusion, context isolation.

use pagelet::testing::RecordingExtension;
use pagelet::{
    BoxError, Element, EventKind, Extension, FireCx, FireOutcome, RequestSettings, UiEvent, attrs,
};
use std::sync::{Arc, Mutex};

mod common;

#[tokio::test]
async fn handlers_fire_in_registration_order() {
    let (_transport, bus) = common::bare_bus();
    let journal = Arc::new(Mutex::new(Vec::new()));
    bus.register("a", RecordingExtension::with_journal("a", journal.clone()))
        .unwrap();
    bus.register("b", RecordingExtension::with_journal("b", journal.clone()))
        .unwrap();
    bus.register("c", RecordingExtension::with_journal("c", journal.clone()))
        .unwrap();

    bus.fire_load().await.unwrap();

    let order: Vec<String> = journal.lock().unwrap().iter().map(|(l, _)| l.clone()).collect();
    assert_eq!(order, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn before_veto_short_circuits_subsequent_handlers() {
    let (transport, bus) = common::bare_bus();
    let journal = Arc::new(Mutex::new(Vec::new()));
    bus.register(
        "vetoer",
        RecordingExtension::with_journal("vetoer", journal.clone()).veto_on(EventKind::Before),
    )
    .unwrap();
    bus.register("tail", RecordingExtension::with_journal("tail", journal.clone()))
        .unwrap();

    let outcome = bus.request(RequestSettings::new("/page")).await.unwrap();
    assert!(outcome.was_vetoed());
    assert!(transport.requests().is_empty());

    // The tail extension saw prepare but never before.
    let tail_events: Vec<EventKind> = journal
        .lock()
        .unwrap()
        .iter()
        .filter(|(l, _)| l == "tail")
        .map(|(_, e)| *e)
        .collect();
    assert_eq!(tail_events, vec![EventKind::Prepare]);
}

#[tokio::test]
async fn success_vetoes_are_tracked_but_do_not_stop_enumeration() {
    let (_transport, bus) = common::bare_bus();
    let journal = Arc::new(Mutex::new(Vec::new()));
    bus.register(
        "vetoer",
        RecordingExtension::with_journal("vetoer", journal.clone()).veto_on(EventKind::Success),
    )
    .unwrap();
    bus.register("tail", RecordingExtension::with_journal("tail", journal.clone()))
        .unwrap();

    bus.request(RequestSettings::new("/page")).await.unwrap();

    let tail_events: Vec<EventKind> = journal
        .lock()
        .unwrap()
        .iter()
        .filter(|(l, _)| l == "tail")
        .map(|(_, e)| *e)
        .collect();
    assert!(tail_events.contains(&EventKind::Success));
}

#[tokio::test]
async fn off_list_excludes_exactly_the_named_extensions_for_the_whole_lifecycle() {
    let (_transport, bus) = common::bare_bus();
    let journal = Arc::new(Mutex::new(Vec::new()));
    bus.register("alpha", RecordingExtension::with_journal("alpha", journal.clone()))
        .unwrap();
    bus.register("beta", RecordingExtension::with_journal("beta", journal.clone()))
        .unwrap();

    let element = Element::new("a")
        .with_attr("href", "/page")
        .with_attr(attrs::OFF, "beta");
    bus.request_from(element, UiEvent::new()).await.unwrap();

    let journal = journal.lock().unwrap();
    assert!(journal.iter().all(|(label, _)| label != "beta"));
    let alpha_events: Vec<EventKind> = journal
        .iter()
        .filter(|(l, _)| l == "alpha")
        .map(|(_, e)| *e)
        .collect();
    assert_eq!(
        alpha_events,
        vec![
            EventKind::Prepare,
            EventKind::Before,
            EventKind::Start,
            EventKind::Success,
            EventKind::Complete
        ]
    );
}

#[tokio::test]
async fn off_list_can_suppress_a_whole_event() {
    let (_transport, bus) = common::bare_bus();
    let ext = RecordingExtension::new("watcher");
    let journal = ext.journal();
    bus.register("watcher", ext).unwrap();

    let mut settings = RequestSettings::new("/page");
    settings.off.insert("start");
    bus.request(settings).await.unwrap();

    let events: Vec<EventKind> = journal.lock().unwrap().iter().map(|(_, e)| *e).collect();
    assert!(!events.contains(&EventKind::Start));
    assert!(events.contains(&EventKind::Success));
}

#[tokio::test]
async fn extensions_keep_private_state_isolated() {
    struct Counter {
        count: Mutex<u32>,
        step: u32,
    }

    impl Extension for Counter {
        async fn on_load(&self, _cx: &FireCx<'_>) -> Result<FireOutcome, BoxError> {
            *self.count.lock().unwrap() += self.step;
            Ok(FireOutcome::Continue)
        }
    }

    let (_transport, bus) = common::bare_bus();
    bus.register(
        "ones",
        Counter {
            count: Mutex::new(0),
            step: 1,
        },
    )
    .unwrap();
    bus.register(
        "tens",
        Counter {
            count: Mutex::new(0),
            step: 10,
        },
    )
    .unwrap();

    bus.fire_load().await.unwrap();
    bus.fire_load().await.unwrap();

    assert_eq!(*bus.lookup::<Counter>("ones").unwrap().count.lock().unwrap(), 2);
    assert_eq!(*bus.lookup::<Counter>("tens").unwrap().count.lock().unwrap(), 20);
}

#[tokio::test]
async fn required_lookup_failure_names_both_extensions() {
    struct Dependent;

    impl Extension for Dependent {
        async fn on_init(&self, cx: &FireCx<'_>) -> Result<FireOutcome, BoxError> {
            cx.require::<RecordingExtension>("missing-friend")?;
            Ok(FireOutcome::Continue)
        }
    }

    let (_transport, bus) = common::bare_bus();
    bus.register("dependent", Dependent).unwrap();
    let err = bus.init().await.unwrap_err();
    let message = format!("{err}: {}", std::error::Error::source(&err).unwrap());
    assert!(message.contains("dependent") && message.contains("missing-friend"));
}
