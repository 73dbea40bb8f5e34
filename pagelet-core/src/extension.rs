//! Extensions: the unit of pluggable behavior.
//!
//! An extension is a named bundle of per-event handlers plus private state,
//! registered on the bus under a unique id. Handlers run sequentially in
//! registration order; each receives a [`FireCx`] carrying the extension's
//! own id and lookup into the extension manager, so independently authored
//! extensions can observe each other without direct coupling or load-order
//! dependencies.
//!
//! # Static vs Dynamic Dispatch
//!
//! [`Extension`] uses native `async fn`-style methods for zero-cost static
//! dispatch. The bus stores extensions behind [`DynExtension`], the
//! object-safe mirror; a blanket impl converts automatically.

use crate::error::{BoxError, BusError, TransportError};
use crate::outcome::FireOutcome;
use crate::payload::ResponsePayload;
use crate::request::RequestSettings;
use crate::transport::RequestHandle;
use futures::future::BoxFuture;
use std::any::Any;
use std::future::Future;
use std::sync::Arc;

/// The extension-manager surface handlers reach through [`FireCx`].
pub trait Manager: Send + Sync {
    /// Look up a registered extension's state by id.
    fn extension(&self, id: &str) -> Option<Arc<dyn Any + Send + Sync>>;

    /// Re-fire the `load` event (delegated trigger rebinding).
    fn rebind(&self) -> BoxFuture<'_, Result<(), BusError>>;
}

/// Capabilities handed to every handler invocation: the extension's own
/// registered id plus lookup into the extension manager.
pub struct FireCx<'a> {
    id: &'a str,
    manager: &'a dyn Manager,
}

impl<'a> FireCx<'a> {
    /// Build a context for one handler invocation.
    pub fn new(id: &'a str, manager: &'a dyn Manager) -> Self {
        Self { id, manager }
    }

    /// The id this extension was registered under.
    pub fn id(&self) -> &str {
        self.id
    }

    /// Look up another extension by id.
    pub fn lookup<T: Extension>(&self, id: &str) -> Option<Arc<T>> {
        self.manager.extension(id)?.downcast::<T>().ok()
    }

    /// Look up a hard dependency; failure names both extensions.
    pub fn require<T: Extension>(&self, id: &str) -> Result<Arc<T>, BusError> {
        self.lookup(id).ok_or_else(|| BusError::MissingDependency {
            dependent: self.id.to_owned(),
            missing: id.to_owned(),
        })
    }

    /// Whether an extension with the given id is registered, whatever its
    /// concrete type.
    pub fn has(&self, id: &str) -> bool {
        self.manager.extension(id).is_some()
    }

    /// Re-fire the `load` event.
    pub fn rebind(&self) -> BoxFuture<'_, Result<(), BusError>> {
        self.manager.rebind()
    }
}

/// A named bundle of lifecycle handlers plus private state.
///
/// Every method defaults to "no opinion"; implementors override only the
/// events they care about. Handlers that return an error abort the whole
/// fire for that invocation — extensions are trusted, developer-installed
/// code.
#[allow(unused_variables)]
pub trait Extension: Send + Sync + 'static {
    /// One-time pipeline initialization.
    fn on_init(
        &self,
        cx: &FireCx<'_>,
    ) -> impl Future<Output = Result<FireOutcome, BoxError>> + Send {
        async { Ok(FireOutcome::Continue) }
    }

    /// Delegated request triggers are being (re)bound.
    fn on_load(
        &self,
        cx: &FireCx<'_>,
    ) -> impl Future<Output = Result<FireOutcome, BoxError>> + Send {
        async { Ok(FireOutcome::Continue) }
    }

    /// Request settings are being assembled; gating.
    fn on_prepare(
        &self,
        settings: &mut RequestSettings,
        cx: &FireCx<'_>,
    ) -> impl Future<Output = Result<FireOutcome, BoxError>> + Send {
        async { Ok(FireOutcome::Continue) }
    }

    /// Last gate before the transport engages; a veto aborts the send.
    fn on_before(
        &self,
        settings: &mut RequestSettings,
        cx: &FireCx<'_>,
    ) -> impl Future<Output = Result<FireOutcome, BoxError>> + Send {
        async { Ok(FireOutcome::Continue) }
    }

    /// The request was issued; `start` always precedes settlement events.
    fn on_start(
        &self,
        handle: &RequestHandle,
        settings: &RequestSettings,
        cx: &FireCx<'_>,
    ) -> impl Future<Output = Result<FireOutcome, BoxError>> + Send {
        async { Ok(FireOutcome::Continue) }
    }

    /// A response payload arrived and parsed.
    fn on_success(
        &self,
        payload: &ResponsePayload,
        handle: &RequestHandle,
        settings: &RequestSettings,
        cx: &FireCx<'_>,
    ) -> impl Future<Output = Result<FireOutcome, BoxError>> + Send {
        async { Ok(FireOutcome::Continue) }
    }

    /// The transport failed.
    fn on_error(
        &self,
        error: &TransportError,
        handle: &RequestHandle,
        settings: &RequestSettings,
        cx: &FireCx<'_>,
    ) -> impl Future<Output = Result<FireOutcome, BoxError>> + Send {
        async { Ok(FireOutcome::Continue) }
    }

    /// The exchange settled, whatever the outcome.
    fn on_complete(
        &self,
        handle: &RequestHandle,
        settings: &RequestSettings,
        cx: &FireCx<'_>,
    ) -> impl Future<Output = Result<FireOutcome, BoxError>> + Send {
        async { Ok(FireOutcome::Continue) }
    }
}

/// Object-safe version of [`Extension`] for storage in the registry.
///
/// Use [`Extension`] to implement behavior; this trait exists for dynamic
/// dispatch and is implemented automatically.
pub trait DynExtension: Send + Sync + 'static {
    /// Dynamic-dispatch `init`.
    fn init_dyn<'a>(&'a self, cx: &'a FireCx<'a>) -> BoxFuture<'a, Result<FireOutcome, BoxError>>;

    /// Dynamic-dispatch `load`.
    fn load_dyn<'a>(&'a self, cx: &'a FireCx<'a>) -> BoxFuture<'a, Result<FireOutcome, BoxError>>;

    /// Dynamic-dispatch `prepare`.
    fn prepare_dyn<'a>(
        &'a self,
        settings: &'a mut RequestSettings,
        cx: &'a FireCx<'a>,
    ) -> BoxFuture<'a, Result<FireOutcome, BoxError>>;

    /// Dynamic-dispatch `before`.
    fn before_dyn<'a>(
        &'a self,
        settings: &'a mut RequestSettings,
        cx: &'a FireCx<'a>,
    ) -> BoxFuture<'a, Result<FireOutcome, BoxError>>;

    /// Dynamic-dispatch `start`.
    fn start_dyn<'a>(
        &'a self,
        handle: &'a RequestHandle,
        settings: &'a RequestSettings,
        cx: &'a FireCx<'a>,
    ) -> BoxFuture<'a, Result<FireOutcome, BoxError>>;

    /// Dynamic-dispatch `success`.
    fn success_dyn<'a>(
        &'a self,
        payload: &'a ResponsePayload,
        handle: &'a RequestHandle,
        settings: &'a RequestSettings,
        cx: &'a FireCx<'a>,
    ) -> BoxFuture<'a, Result<FireOutcome, BoxError>>;

    /// Dynamic-dispatch `error`.
    fn error_dyn<'a>(
        &'a self,
        error: &'a TransportError,
        handle: &'a RequestHandle,
        settings: &'a RequestSettings,
        cx: &'a FireCx<'a>,
    ) -> BoxFuture<'a, Result<FireOutcome, BoxError>>;

    /// Dynamic-dispatch `complete`.
    fn complete_dyn<'a>(
        &'a self,
        handle: &'a RequestHandle,
        settings: &'a RequestSettings,
        cx: &'a FireCx<'a>,
    ) -> BoxFuture<'a, Result<FireOutcome, BoxError>>;
}

// Blanket implementation: any Extension is a DynExtension automatically.
impl<T: Extension> DynExtension for T {
    fn init_dyn<'a>(&'a self, cx: &'a FireCx<'a>) -> BoxFuture<'a, Result<FireOutcome, BoxError>> {
        Box::pin(self.on_init(cx))
    }

    fn load_dyn<'a>(&'a self, cx: &'a FireCx<'a>) -> BoxFuture<'a, Result<FireOutcome, BoxError>> {
        Box::pin(self.on_load(cx))
    }

    fn prepare_dyn<'a>(
        &'a self,
        settings: &'a mut RequestSettings,
        cx: &'a FireCx<'a>,
    ) -> BoxFuture<'a, Result<FireOutcome, BoxError>> {
        Box::pin(self.on_prepare(settings, cx))
    }

    fn before_dyn<'a>(
        &'a self,
        settings: &'a mut RequestSettings,
        cx: &'a FireCx<'a>,
    ) -> BoxFuture<'a, Result<FireOutcome, BoxError>> {
        Box::pin(self.on_before(settings, cx))
    }

    fn start_dyn<'a>(
        &'a self,
        handle: &'a RequestHandle,
        settings: &'a RequestSettings,
        cx: &'a FireCx<'a>,
    ) -> BoxFuture<'a, Result<FireOutcome, BoxError>> {
        Box::pin(self.on_start(handle, settings, cx))
    }

    fn success_dyn<'a>(
        &'a self,
        payload: &'a ResponsePayload,
        handle: &'a RequestHandle,
        settings: &'a RequestSettings,
        cx: &'a FireCx<'a>,
    ) -> BoxFuture<'a, Result<FireOutcome, BoxError>> {
        Box::pin(self.on_success(payload, handle, settings, cx))
    }

    fn error_dyn<'a>(
        &'a self,
        error: &'a TransportError,
        handle: &'a RequestHandle,
        settings: &'a RequestSettings,
        cx: &'a FireCx<'a>,
    ) -> BoxFuture<'a, Result<FireOutcome, BoxError>> {
        Box::pin(self.on_error(error, handle, settings, cx))
    }

    fn complete_dyn<'a>(
        &'a self,
        handle: &'a RequestHandle,
        settings: &'a RequestSettings,
        cx: &'a FireCx<'a>,
    ) -> BoxFuture<'a, Result<FireOutcome, BoxError>> {
        Box::pin(self.on_complete(handle, settings, cx))
    }
}
