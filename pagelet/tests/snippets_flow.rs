//! End-to-end snippet flow: patching, rebinding, form re-init, history
//! handoff.

use pagelet::ext::{SnippetsExt, ids};
use pagelet::testing::RecordingExtension;
use pagelet::attrs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

mod common;

#[tokio::test]
async fn successful_response_patches_snippets() {
    let host = common::host();
    host.document.insert("content", "div", "old");
    host.bus.init().await.unwrap();

    host.transport
        .push_json(r#"{"snippets": {"content": "<p>new</p>"}}"#);
    host.bus.request_url("/page").await.unwrap();

    assert_eq!(
        host.document.node_html("content").as_deref(),
        Some("<p>new</p>")
    );
}

#[tokio::test]
async fn patch_queues_fire_around_each_snippet_and_complete_once() {
    let host = common::host();
    host.document.insert("a", "div", "");
    host.document.insert("b", "div", "");
    host.bus.init().await.unwrap();

    let snippets = host.bus.lookup::<SnippetsExt>(ids::SNIPPETS).unwrap();
    let before = Arc::new(AtomicUsize::new(0));
    let complete = Arc::new(AtomicUsize::new(0));
    {
        let before = before.clone();
        snippets.engine().on_before(move |_| {
            before.fetch_add(1, Ordering::SeqCst);
        });
        let complete = complete.clone();
        snippets.engine().on_complete(move || {
            complete.fetch_add(1, Ordering::SeqCst);
        });
    }

    host.transport
        .push_json(r#"{"snippets": {"a": "1", "b": "2"}}"#);
    host.bus.request_url("/page").await.unwrap();

    assert_eq!(before.load(Ordering::SeqCst), 2);
    assert_eq!(complete.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn triggers_rebind_after_init_and_after_every_success() {
    let host = common::host();
    host.bus.init().await.unwrap();
    assert_eq!(host.document.installs().len(), 1);

    host.bus.request_url("/page").await.unwrap();
    assert_eq!(host.document.installs().len(), 2);
}

#[tokio::test]
async fn forms_runtime_reinitializes_patched_snippets() {
    let host = common::host();
    host.document.insert("content", "div", "");
    host.bus.init().await.unwrap();

    host.transport
        .push_json(r#"{"snippets": {"content": "<form></form>"}}"#);
    host.bus.request_url("/page").await.unwrap();

    assert_eq!(host.runtime.inits(), vec!["content".to_string()]);
}

#[tokio::test]
async fn title_is_stashed_for_the_history_layer_when_present() {
    let host = common::host();
    host.document.insert("page-title", "title", "Old");
    host.bus
        .register(ids::HISTORY, RecordingExtension::new("history"))
        .unwrap();
    host.bus.init().await.unwrap();

    host.transport
        .push_json(r#"{"snippets": {"page-title": "New"}}"#);
    host.bus.request_url("/page").await.unwrap();

    assert_eq!(
        host.document
            .attr_of("page-title", attrs::PENDING_TITLE)
            .as_deref(),
        Some("New")
    );
    assert_ne!(host.document.title(), "New");
}

#[tokio::test]
async fn excluding_history_applies_the_title_directly() {
    let host = common::host();
    host.document.insert("page-title", "title", "Old");
    host.bus
        .register(ids::HISTORY, RecordingExtension::new("history"))
        .unwrap();
    host.bus.init().await.unwrap();

    host.transport
        .push_json(r#"{"snippets": {"page-title": "New"}}"#);
    let mut settings = pagelet::RequestSettings::new("/page");
    settings.off.insert(ids::HISTORY);
    host.bus.request(settings).await.unwrap();

    assert_eq!(host.document.title(), "New");
}
