//! Testing utilities for the pipeline.
//!
//! This module provides fakes for every host collaborator plus a recording
//! extension:
//!
//! - [`StaticTransport`]: replies from a canned queue, records requests
//! - [`GatedTransport`]: stays in flight until the test releases it
//! - [`FakeDocument`]: an in-memory node store with patch recording
//! - [`FakeNavigator`]: a settable location and a visit log
//! - [`ScriptedFormRuntime`]: accepts or rejects validation on demand
//! - [`RecordingExtension`]: journals fired events, with scriptable outcomes

use pagelet_core::{
    BindSelectors, BoxError, Document, EventKind, Extension, FireCx, FireOutcome, FormInfo,
    FormRuntime, KeyCallback, KeyStroke, Navigator, RequestHandle, RequestSettings,
    ResponsePayload, Transport, TransportError, TransportReply, TransportRequest,
};
use futures::channel::oneshot;
use futures::future::BoxFuture;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Transports
// ============================================================================

/// A transport answering from a canned reply queue.
///
/// An exhausted queue answers `200` with an empty JSON object. Requests are
/// recorded for inspection.
#[derive(Default)]
pub struct StaticTransport {
    replies: Mutex<VecDeque<Result<TransportReply, TransportError>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl StaticTransport {
    /// A transport with an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON reply.
    pub fn push_json(&self, body: &str) {
        self.replies.lock().unwrap().push_back(Ok(TransportReply {
            status: 200,
            body: body.to_owned(),
        }));
    }

    /// Queue a failure.
    pub fn push_error(&self, error: TransportError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Every request sent so far.
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for StaticTransport {
    fn send(
        &self,
        request: TransportRequest,
    ) -> BoxFuture<'static, Result<TransportReply, TransportError>> {
        self.requests.lock().unwrap().push(request);
        let reply = self.replies.lock().unwrap().pop_front().unwrap_or(Ok(TransportReply {
            status: 200,
            body: "{}".to_owned(),
        }));
        Box::pin(async move { reply })
    }
}

/// A transport that keeps exchanges in flight until the test releases them.
///
/// Lets tests hold a request open while issuing another — the shape the
/// `unique` and `abort` extensions exist for.
#[derive(Default)]
pub struct GatedTransport {
    pending: Mutex<VecDeque<oneshot::Sender<Result<TransportReply, TransportError>>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl GatedTransport {
    /// A transport with nothing in flight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of unreleased exchanges.
    pub fn in_flight(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Release the oldest exchange with a JSON reply. Returns `false` when
    /// nothing was in flight or the exchange was canceled meanwhile.
    pub fn release_json(&self, body: &str) -> bool {
        let Some(sender) = self.pending.lock().unwrap().pop_front() else {
            return false;
        };
        sender
            .send(Ok(TransportReply {
                status: 200,
                body: body.to_owned(),
            }))
            .is_ok()
    }

    /// Every request sent so far.
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for GatedTransport {
    fn send(
        &self,
        request: TransportRequest,
    ) -> BoxFuture<'static, Result<TransportReply, TransportError>> {
        self.requests.lock().unwrap().push(request);
        let (sender, receiver) = oneshot::channel();
        self.pending.lock().unwrap().push_back(sender);
        Box::pin(async move {
            match receiver.await {
                Ok(reply) => reply,
                Err(_) => Err(TransportError::Io("transport dropped".to_owned())),
            }
        })
    }
}

// ============================================================================
// Document
// ============================================================================

#[derive(Clone)]
struct FakeNode {
    tag: String,
    html: String,
    attrs: BTreeMap<String, String>,
}

#[derive(Default)]
struct DocState {
    nodes: BTreeMap<String, FakeNode>,
    title: String,
    installs: Vec<BindSelectors>,
    key_callbacks: Vec<KeyCallback>,
    writes: Vec<(String, String)>,
}

/// An in-memory document addressing nodes by element id.
///
/// `select` understands `#id` selectors (with CSS escapes); content writes
/// are recorded so tests can assert the no-op optimization.
#[derive(Default)]
pub struct FakeDocument {
    state: Mutex<DocState>,
}

impl FakeDocument {
    /// An empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node.
    pub fn insert(&self, id: &str, tag: &str, html: &str) {
        self.state.lock().unwrap().nodes.insert(
            id.to_owned(),
            FakeNode {
                tag: tag.to_owned(),
                html: html.to_owned(),
                attrs: BTreeMap::new(),
            },
        );
    }

    /// Current markup of a node.
    pub fn node_html(&self, id: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .nodes
            .get(id)
            .map(|n| n.html.clone())
    }

    /// Current attribute value of a node.
    pub fn attr_of(&self, id: &str, name: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .nodes
            .get(id)
            .and_then(|n| n.attrs.get(name).cloned())
    }

    /// The document title.
    pub fn title(&self) -> String {
        self.state.lock().unwrap().title.clone()
    }

    /// Selector sets installed so far.
    pub fn installs(&self) -> Vec<BindSelectors> {
        self.state.lock().unwrap().installs.clone()
    }

    /// Content writes performed so far, as `(node, markup)` pairs.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().writes.clone()
    }

    /// Deliver a keyboard event to every bound callback.
    pub fn press(&self, stroke: &KeyStroke) {
        let callbacks: Vec<KeyCallback> = self.state.lock().unwrap().key_callbacks.clone();
        for callback in callbacks {
            callback(stroke);
        }
    }

    fn unescape(selector: &str) -> String {
        let mut out = String::with_capacity(selector.len());
        let mut chars = selector.chars();
        while let Some(ch) = chars.next() {
            if ch == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else {
                out.push(ch);
            }
        }
        out
    }
}

impl Document for FakeDocument {
    fn select(&self, selector: &str) -> Option<String> {
        let id = Self::unescape(selector.strip_prefix('#')?);
        self.state
            .lock()
            .unwrap()
            .nodes
            .contains_key(&id)
            .then_some(id)
    }

    fn tag_of(&self, node: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .nodes
            .get(node)
            .map(|n| n.tag.clone())
    }

    fn inner_html(&self, node: &str) -> Option<String> {
        self.node_html(node)
    }

    fn set_inner_html(&self, node: &str, markup: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(entry) = state.nodes.get_mut(node) {
            entry.html = markup.to_owned();
        }
        state.writes.push((node.to_owned(), markup.to_owned()));
    }

    fn append_html(&self, node: &str, markup: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(entry) = state.nodes.get_mut(node) {
            entry.html.push_str(markup);
        }
        state.writes.push((node.to_owned(), markup.to_owned()));
    }

    fn prepend_html(&self, node: &str, markup: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(entry) = state.nodes.get_mut(node) {
            entry.html.insert_str(0, markup);
        }
        state.writes.push((node.to_owned(), markup.to_owned()));
    }

    fn attr(&self, node: &str, name: &str) -> Option<String> {
        self.attr_of(node, name)
    }

    fn set_attr(&self, node: &str, name: &str, value: &str) {
        if let Some(entry) = self.state.lock().unwrap().nodes.get_mut(node) {
            entry.attrs.insert(name.to_owned(), value.to_owned());
        }
    }

    fn set_title(&self, text: &str) {
        self.state.lock().unwrap().title = text.to_owned();
    }

    fn settle(&self, _nodes: &[String]) -> BoxFuture<'static, ()> {
        Box::pin(futures::future::ready(()))
    }

    fn install_triggers(&self, selectors: &BindSelectors) {
        self.state.lock().unwrap().installs.push(selectors.clone());
    }

    fn bind_keydown(&self, callback: KeyCallback) {
        self.state.lock().unwrap().key_callbacks.push(callback);
    }
}

// ============================================================================
// Navigator
// ============================================================================

/// A navigator with a settable location and a visit log.
pub struct FakeNavigator {
    location: Mutex<String>,
    visits: Mutex<Vec<String>>,
}

impl FakeNavigator {
    /// A navigator currently at the given URL.
    pub fn at(location: &str) -> Self {
        Self {
            location: Mutex::new(location.to_owned()),
            visits: Mutex::new(Vec::new()),
        }
    }

    /// Hard navigations performed so far.
    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }
}

impl Navigator for FakeNavigator {
    fn location(&self) -> String {
        self.location.lock().unwrap().clone()
    }

    fn assign(&self, url: &str) {
        self.visits.lock().unwrap().push(url.to_owned());
        *self.location.lock().unwrap() = url.to_owned();
    }
}

// ============================================================================
// Form runtime
// ============================================================================

/// A form runtime scripted to accept or reject validation.
pub struct ScriptedFormRuntime {
    accept: AtomicBool,
    validated: Mutex<Vec<Option<String>>>,
    inits: Mutex<Vec<String>>,
}

impl ScriptedFormRuntime {
    /// A runtime accepting every form.
    pub fn accepting() -> Self {
        Self {
            accept: AtomicBool::new(true),
            validated: Mutex::new(Vec::new()),
            inits: Mutex::new(Vec::new()),
        }
    }

    /// A runtime rejecting every form.
    pub fn rejecting() -> Self {
        let runtime = Self::accepting();
        runtime.accept.store(false, Ordering::SeqCst);
        runtime
    }

    /// Flip the verdict.
    pub fn set_accept(&self, accept: bool) {
        self.accept.store(accept, Ordering::SeqCst);
    }

    /// Number of validations performed.
    pub fn validated(&self) -> usize {
        self.validated.lock().unwrap().len()
    }

    /// Nodes whose forms were re-initialized.
    pub fn inits(&self) -> Vec<String> {
        self.inits.lock().unwrap().clone()
    }
}

impl FormRuntime for ScriptedFormRuntime {
    fn validate(&self, _form: &FormInfo, submitted_by: Option<&str>) -> bool {
        self.validated
            .lock()
            .unwrap()
            .push(submitted_by.map(str::to_owned));
        self.accept.load(Ordering::SeqCst)
    }

    fn init_forms_within(&self, node: &str) {
        self.inits.lock().unwrap().push(node.to_owned());
    }
}

// ============================================================================
// Recording extension
// ============================================================================

/// An extension that journals every event fired at it.
///
/// Outcomes are scriptable per event: [`veto_on`](RecordingExtension::veto_on)
/// makes a handler veto, [`fail_on`](RecordingExtension::fail_on) makes it
/// error. Several instances can share one journal to assert cross-extension
/// ordering.
pub struct RecordingExtension {
    label: String,
    journal: Arc<Mutex<Vec<(String, EventKind)>>>,
    vetoes: HashSet<EventKind>,
    failures: HashSet<EventKind>,
}

impl RecordingExtension {
    /// A recorder with a private journal.
    pub fn new(label: &str) -> Self {
        Self::with_journal(label, Arc::new(Mutex::new(Vec::new())))
    }

    /// A recorder appending to a shared journal.
    pub fn with_journal(label: &str, journal: Arc<Mutex<Vec<(String, EventKind)>>>) -> Self {
        Self {
            label: label.to_owned(),
            journal,
            vetoes: HashSet::new(),
            failures: HashSet::new(),
        }
    }

    /// Veto whenever the given event fires.
    pub fn veto_on(mut self, event: EventKind) -> Self {
        self.vetoes.insert(event);
        self
    }

    /// Fail whenever the given event fires.
    pub fn fail_on(mut self, event: EventKind) -> Self {
        self.failures.insert(event);
        self
    }

    /// The recorder's label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The shared journal.
    pub fn journal(&self) -> Arc<Mutex<Vec<(String, EventKind)>>> {
        self.journal.clone()
    }

    /// Events recorded under this recorder's label, in order.
    pub fn events(&self) -> Vec<EventKind> {
        self.journal
            .lock()
            .unwrap()
            .iter()
            .filter(|(label, _)| *label == self.label)
            .map(|(_, event)| *event)
            .collect()
    }

    fn record(&self, event: EventKind) -> Result<FireOutcome, BoxError> {
        self.journal
            .lock()
            .unwrap()
            .push((self.label.clone(), event));
        if self.failures.contains(&event) {
            return Err(format!("{} failed on {event}", self.label).into());
        }
        if self.vetoes.contains(&event) {
            return Ok(FireOutcome::Veto);
        }
        Ok(FireOutcome::Continue)
    }
}

impl Extension for RecordingExtension {
    async fn on_init(&self, _cx: &FireCx<'_>) -> Result<FireOutcome, BoxError> {
        self.record(EventKind::Init)
    }

    async fn on_load(&self, _cx: &FireCx<'_>) -> Result<FireOutcome, BoxError> {
        self.record(EventKind::Load)
    }

    async fn on_prepare(
        &self,
        _settings: &mut RequestSettings,
        _cx: &FireCx<'_>,
    ) -> Result<FireOutcome, BoxError> {
        self.record(EventKind::Prepare)
    }

    async fn on_before(
        &self,
        _settings: &mut RequestSettings,
        _cx: &FireCx<'_>,
    ) -> Result<FireOutcome, BoxError> {
        self.record(EventKind::Before)
    }

    async fn on_start(
        &self,
        _handle: &RequestHandle,
        _settings: &RequestSettings,
        _cx: &FireCx<'_>,
    ) -> Result<FireOutcome, BoxError> {
        self.record(EventKind::Start)
    }

    async fn on_success(
        &self,
        _payload: &ResponsePayload,
        _handle: &RequestHandle,
        _settings: &RequestSettings,
        _cx: &FireCx<'_>,
    ) -> Result<FireOutcome, BoxError> {
        self.record(EventKind::Success)
    }

    async fn on_error(
        &self,
        _error: &TransportError,
        _handle: &RequestHandle,
        _settings: &RequestSettings,
        _cx: &FireCx<'_>,
    ) -> Result<FireOutcome, BoxError> {
        self.record(EventKind::Error)
    }

    async fn on_complete(
        &self,
        _handle: &RequestHandle,
        _settings: &RequestSettings,
        _cx: &FireCx<'_>,
    ) -> Result<FireOutcome, BoxError> {
        self.record(EventKind::Complete)
    }
}
