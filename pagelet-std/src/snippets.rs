//! The snippet patch engine.
//!
//! Consumes a response payload's snippet map and applies ordered DOM
//! patches with before/after/complete notification queues, batching the
//! completion notification until all patched elements' pending effects
//! settle.

use pagelet_core::{Document, attrs};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock, Mutex};

// Scripts must re-execute even when the markup is textually identical.
static SCRIPT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*script").expect("static pattern"));

/// An ordered list of observers, fired in registration order.
///
/// The list is snapshotted before firing, so a callback adding another
/// callback affects the next fire only.
pub struct CallbackList<T: ?Sized> {
    callbacks: Mutex<Vec<Arc<dyn Fn(&T) + Send + Sync>>>,
}

impl<T: ?Sized> CallbackList<T> {
    /// An empty list.
    pub fn new() -> Self {
        Self {
            callbacks: Mutex::new(Vec::new()),
        }
    }

    /// Append an observer.
    pub fn add(&self, callback: impl Fn(&T) + Send + Sync + 'static) {
        self.callbacks.lock().unwrap().push(Arc::new(callback));
    }

    /// Invoke every observer, in registration order.
    pub fn fire(&self, arg: &T) {
        let snapshot: Vec<_> = self.callbacks.lock().unwrap().clone();
        for callback in snapshot {
            callback(arg);
        }
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.callbacks.lock().unwrap().len()
    }

    /// Whether no observer is registered.
    pub fn is_empty(&self) -> bool {
        self.callbacks.lock().unwrap().is_empty()
    }
}

impl<T: ?Sized> Default for CallbackList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies snippet maps to the document.
///
/// Shared by the snippets extension and anyone replaying history entries;
/// other extensions hook the patch queues through
/// [`on_before`](SnippetEngine::on_before) /
/// [`on_after`](SnippetEngine::on_after) /
/// [`on_complete`](SnippetEngine::on_complete).
pub struct SnippetEngine {
    document: Arc<dyn Document>,
    before: CallbackList<str>,
    after: CallbackList<str>,
    complete: CallbackList<()>,
}

impl SnippetEngine {
    /// An engine patching the given document.
    pub fn new(document: Arc<dyn Document>) -> Self {
        Self {
            document,
            before: CallbackList::new(),
            after: CallbackList::new(),
            complete: CallbackList::new(),
        }
    }

    /// Observe nodes about to be patched.
    pub fn on_before(&self, callback: impl Fn(&str) + Send + Sync + 'static) {
        self.before.add(callback);
    }

    /// Observe freshly patched nodes.
    pub fn on_after(&self, callback: impl Fn(&str) + Send + Sync + 'static) {
        self.after.add(callback);
    }

    /// Observe completion of a whole snippet map, after pending effects
    /// settled. Fired exactly once per [`update`](SnippetEngine::update).
    pub fn on_complete(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.complete.add(move |_| callback());
    }

    /// Apply a snippet map.
    ///
    /// `replay` marks a history replay: append/prepend markers are ignored
    /// and content is always replaced. `record_history` hands title changes
    /// to the history layer instead of applying them directly.
    pub async fn update(
        &self,
        snippets: &BTreeMap<String, String>,
        replay: bool,
        record_history: bool,
    ) {
        let mut touched = Vec::new();
        for (id, markup) in snippets {
            let selector = format!("#{}", escape_selector(id));
            let Some(node) = self.document.select(&selector) else {
                tracing::debug!(snippet = %id, "no element for snippet");
                continue;
            };
            touched.push(node.clone());

            if self
                .document
                .tag_of(&node)
                .is_some_and(|tag| tag.eq_ignore_ascii_case("title"))
            {
                // History replay owns title changes when recording is on.
                if record_history {
                    self.document.set_attr(&node, attrs::PENDING_TITLE, markup);
                } else {
                    self.document.set_title(markup);
                }
                continue;
            }

            self.before.fire(&node);
            self.apply(&node, markup, replay);
            self.after.fire(&node);
        }
        self.document.settle(&touched).await;
        self.complete.fire(&());
    }

    fn apply(&self, node: &str, markup: &str, replay: bool) {
        if !replay && self.document.attr(node, attrs::APPEND).is_some() {
            self.document.append_html(node, markup);
        } else if !replay && self.document.attr(node, attrs::PREPEND).is_some() {
            self.document.prepend_html(node, markup);
        } else {
            let current = self.document.inner_html(node);
            if current.as_deref() != Some(markup) || SCRIPT_TAG.is_match(markup) {
                self.document.set_inner_html(node, markup);
            }
        }
    }
}

/// Escape CSS-special characters in an element id for selector use.
pub fn escape_selector(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for ch in id.chars() {
        if matches!(
            ch,
            '!' | '"'
                | '#'
                | '$'
                | '%'
                | '&'
                | '\''
                | '('
                | ')'
                | '*'
                | '+'
                | ','
                | '.'
                | '/'
                | ':'
                | ';'
                | '<'
                | '='
                | '>'
                | '?'
                | '@'
                | '['
                | '\\'
                | ']'
                | '^'
                | '`'
                | '{'
                | '|'
                | '}'
                | '~'
        ) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDocument;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn snippet_map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn escapes_css_special_characters() {
        assert_eq!(escape_selector("snippet--box"), "snippet--box");
        assert_eq!(escape_selector("a.b:c"), "a\\.b\\:c");
        assert_eq!(escape_selector("x[1]"), "x\\[1\\]");
    }

    #[tokio::test]
    async fn replaces_content_and_fires_queues_once() {
        let document = Arc::new(FakeDocument::new());
        document.insert("box", "div", "old");
        let engine = SnippetEngine::new(document.clone());

        let before = Arc::new(AtomicUsize::new(0));
        let after = Arc::new(AtomicUsize::new(0));
        let complete = Arc::new(AtomicUsize::new(0));
        {
            let before = before.clone();
            engine.on_before(move |_| {
                before.fetch_add(1, Ordering::SeqCst);
            });
            let after = after.clone();
            engine.on_after(move |_| {
                after.fetch_add(1, Ordering::SeqCst);
            });
            let complete = complete.clone();
            engine.on_complete(move || {
                complete.fetch_add(1, Ordering::SeqCst);
            });
        }

        engine
            .update(&snippet_map(&[("box", "<p>hi</p>")]), false, false)
            .await;

        assert_eq!(document.node_html("box").as_deref(), Some("<p>hi</p>"));
        assert_eq!(before.load(Ordering::SeqCst), 1);
        assert_eq!(after.load(Ordering::SeqCst), 1);
        assert_eq!(complete.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unchanged_markup_skips_the_write_but_fires_queues() {
        let document = Arc::new(FakeDocument::new());
        document.insert("box", "div", "<p>hi</p>");
        let engine = SnippetEngine::new(document.clone());

        let after = Arc::new(AtomicUsize::new(0));
        {
            let after = after.clone();
            engine.on_after(move |_| {
                after.fetch_add(1, Ordering::SeqCst);
            });
        }

        engine
            .update(&snippet_map(&[("box", "<p>hi</p>")]), false, false)
            .await;

        assert!(document.writes().is_empty());
        assert_eq!(after.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn identical_markup_with_script_rewrites() {
        let document = Arc::new(FakeDocument::new());
        document.insert("box", "div", "<script>go()</script>");
        let engine = SnippetEngine::new(document.clone());

        engine
            .update(
                &snippet_map(&[("box", "<script>go()</script>")]),
                false,
                false,
            )
            .await;

        assert_eq!(document.writes().len(), 1);
    }

    #[tokio::test]
    async fn append_and_prepend_markers_only_on_fresh_responses() {
        let document = Arc::new(FakeDocument::new());
        document.insert("log", "div", "b");
        document.set_attr("log", attrs::APPEND, "");
        let engine = SnippetEngine::new(document.clone());

        engine.update(&snippet_map(&[("log", "c")]), false, false).await;
        assert_eq!(document.node_html("log").as_deref(), Some("bc"));

        // History replays replace wholesale.
        engine.update(&snippet_map(&[("log", "a")]), true, false).await;
        assert_eq!(document.node_html("log").as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn title_goes_to_history_stash_when_recording() {
        let document = Arc::new(FakeDocument::new());
        document.insert("title", "title", "Old");
        let engine = SnippetEngine::new(document.clone());

        engine
            .update(&snippet_map(&[("title", "New")]), false, true)
            .await;
        assert_eq!(
            document.attr_of("title", attrs::PENDING_TITLE).as_deref(),
            Some("New")
        );
        assert_ne!(document.title(), "New");

        engine
            .update(&snippet_map(&[("title", "Direct")]), false, false)
            .await;
        assert_eq!(document.title(), "Direct");
    }
}
