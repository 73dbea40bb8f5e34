//! The bus: event registry, extension manager and dispatcher.
//!
//! One process-scoped instance owns the ordered extension entries and fires
//! lifecycle events across them. Firing iterates a snapshot of the entry
//! list, so handlers may register or remove extensions mid-fire — the
//! change takes effect on the next fire, never retroactively.

use pagelet_core::{
    BusError, DynExtension, EventKind, Extension, FireCx, Manager, Navigator, RequestHandle,
    RequestSettings, ResponsePayload, Transport, TransportError,
};
use futures::future::BoxFuture;
use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

struct Entry {
    id: String,
    ext: Arc<dyn DynExtension>,
    state: Arc<dyn Any + Send + Sync>,
}

/// The process-scoped pipeline instance.
///
/// Holds the extension registry and the transport; [`init`](Bus::init) may
/// be called at most once. Prefer [`Bus::builder`] to get the bundled
/// extensions registered in their canonical order.
pub struct Bus {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) navigator: Option<Arc<dyn Navigator>>,
    entries: RwLock<Vec<Entry>>,
    initialized: AtomicBool,
    anon_seq: AtomicUsize,
}

impl Bus {
    /// An empty bus with no extensions registered.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            navigator: None,
            entries: RwLock::new(Vec::new()),
            initialized: AtomicBool::new(false),
            anon_seq: AtomicUsize::new(1),
        }
    }

    /// Attach a navigator, used for location fallbacks when deriving
    /// request URLs and by extensions that navigate.
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Start a builder that seeds the bundled extensions.
    pub fn builder(transport: Arc<dyn Transport>) -> crate::BusBuilder {
        crate::BusBuilder::new(transport)
    }

    /// Register an extension under a unique id.
    ///
    /// Fails with [`BusError::DuplicateExtension`] before any mutation when
    /// the id is taken.
    pub fn register<X: Extension>(&self, id: impl Into<String>, ext: X) -> Result<(), BusError> {
        let id = id.into();
        let ext = Arc::new(ext);
        let mut entries = self.entries.write().unwrap();
        if entries.iter().any(|e| e.id == id) {
            return Err(BusError::DuplicateExtension { id });
        }
        tracing::debug!(extension = %id, "registering extension");
        let hooks: Arc<dyn DynExtension> = ext.clone();
        let state: Arc<dyn Any + Send + Sync> = ext;
        entries.push(Entry {
            id,
            ext: hooks,
            state,
        });
        Ok(())
    }

    /// Register an extension under a generated id guaranteed not to collide
    /// with any registered id. Returns the id.
    pub fn register_anonymous<X: Extension>(&self, ext: X) -> String {
        let ext = Arc::new(ext);
        let mut entries = self.entries.write().unwrap();
        let id = loop {
            let candidate = format!("anon{}", self.anon_seq.fetch_add(1, Ordering::Relaxed));
            if !entries.iter().any(|e| e.id == candidate) {
                break candidate;
            }
        };
        let hooks: Arc<dyn DynExtension> = ext.clone();
        let state: Arc<dyn Any + Send + Sync> = ext;
        entries.push(Entry {
            id: id.clone(),
            ext: hooks,
            state,
        });
        id
    }

    /// Remove an extension and its state. Idempotent.
    pub fn unregister(&self, id: &str) {
        self.entries.write().unwrap().retain(|e| e.id != id);
    }

    /// Look up a registered extension by id and concrete type.
    pub fn lookup<T: Extension>(&self, id: &str) -> Option<Arc<T>> {
        Manager::extension(self, id)?.downcast::<T>().ok()
    }

    /// Whether an extension with the given id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.read().unwrap().iter().any(|e| e.id == id)
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> Vec<String> {
        self.entries
            .read()
            .unwrap()
            .iter()
            .map(|e| e.id.clone())
            .collect()
    }

    /// One-time pipeline initialization: fires `init`, then `load`.
    ///
    /// A second call fails with [`BusError::AlreadyInitialized`].
    pub async fn init(&self) -> Result<(), BusError> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Err(BusError::AlreadyInitialized);
        }
        tracing::info!("initializing pipeline");
        self.fire_init().await?;
        self.fire_load().await?;
        Ok(())
    }

    /// Initialize with a replacement for the default binder extension
    /// (registered under the `init` id).
    pub async fn init_with<X: Extension>(&self, binder: X) -> Result<(), BusError> {
        if self.initialized.load(Ordering::SeqCst) {
            return Err(BusError::AlreadyInitialized);
        }
        self.unregister(crate::ext::ids::INIT);
        self.register(crate::ext::ids::INIT, binder)?;
        self.init().await
    }

    /// Manual rebind entry point: fires `load`.
    pub async fn load(&self) -> Result<(), BusError> {
        self.fire_load().await.map(|_| ())
    }

    fn snapshot(&self) -> Vec<(String, Arc<dyn DynExtension>)> {
        self.entries
            .read()
            .unwrap()
            .iter()
            .map(|e| (e.id.clone(), e.ext.clone()))
            .collect()
    }

    fn wrap(id: &str, event: EventKind, source: pagelet_core::BoxError) -> BusError {
        BusError::Extension {
            id: id.to_owned(),
            event,
            source,
        }
    }

    /// Fire `init` across all extensions.
    pub async fn fire_init(&self) -> Result<bool, BusError> {
        let mut all_continue = true;
        for (id, ext) in self.snapshot() {
            let cx = FireCx::new(&id, self);
            tracing::trace!(extension = %id, "firing init");
            let outcome = ext
                .init_dyn(&cx)
                .await
                .map_err(|e| Self::wrap(&id, EventKind::Init, e))?;
            all_continue &= !outcome.is_veto();
        }
        Ok(all_continue)
    }

    /// Fire `load` across all extensions.
    pub async fn fire_load(&self) -> Result<bool, BusError> {
        let mut all_continue = true;
        for (id, ext) in self.snapshot() {
            let cx = FireCx::new(&id, self);
            tracing::trace!(extension = %id, "firing load");
            let outcome = ext
                .load_dyn(&cx)
                .await
                .map_err(|e| Self::wrap(&id, EventKind::Load, e))?;
            all_continue &= !outcome.is_veto();
        }
        Ok(all_continue)
    }

    /// Fire `prepare` (gating): the first veto stops enumeration and the
    /// fire resolves `false`.
    pub async fn fire_prepare(&self, settings: &mut RequestSettings) -> Result<bool, BusError> {
        if settings.off.contains(EventKind::Prepare.name()) {
            tracing::debug!("prepare suppressed by off-list");
            return Ok(true);
        }
        for (id, ext) in self.snapshot() {
            if settings.off.contains(&id) {
                tracing::trace!(extension = %id, "excluded from prepare");
                continue;
            }
            let cx = FireCx::new(&id, self);
            let outcome = ext
                .prepare_dyn(settings, &cx)
                .await
                .map_err(|e| Self::wrap(&id, EventKind::Prepare, e))?;
            if outcome.is_veto() {
                tracing::debug!(extension = %id, "prepare vetoed");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Fire `before` (gating): a veto here aborts the transport send.
    pub async fn fire_before(&self, settings: &mut RequestSettings) -> Result<bool, BusError> {
        if settings.off.contains(EventKind::Before.name()) {
            tracing::debug!("before suppressed by off-list");
            return Ok(true);
        }
        for (id, ext) in self.snapshot() {
            if settings.off.contains(&id) {
                tracing::trace!(extension = %id, "excluded from before");
                continue;
            }
            let cx = FireCx::new(&id, self);
            let outcome = ext
                .before_dyn(settings, &cx)
                .await
                .map_err(|e| Self::wrap(&id, EventKind::Before, e))?;
            if outcome.is_veto() {
                tracing::debug!(extension = %id, "before vetoed");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Fire `start` across all non-excluded extensions.
    pub async fn fire_start(
        &self,
        handle: &RequestHandle,
        settings: &RequestSettings,
    ) -> Result<bool, BusError> {
        if settings.off.contains(EventKind::Start.name()) {
            return Ok(true);
        }
        let mut all_continue = true;
        for (id, ext) in self.snapshot() {
            if settings.off.contains(&id) {
                continue;
            }
            let cx = FireCx::new(&id, self);
            let outcome = ext
                .start_dyn(handle, settings, &cx)
                .await
                .map_err(|e| Self::wrap(&id, EventKind::Start, e))?;
            all_continue &= !outcome.is_veto();
        }
        Ok(all_continue)
    }

    /// Fire `success` across all non-excluded extensions. Vetoes are
    /// tracked in the result but do not stop enumeration.
    pub async fn fire_success(
        &self,
        payload: &ResponsePayload,
        handle: &RequestHandle,
        settings: &RequestSettings,
    ) -> Result<bool, BusError> {
        if settings.off.contains(EventKind::Success.name()) {
            return Ok(true);
        }
        let mut all_continue = true;
        for (id, ext) in self.snapshot() {
            if settings.off.contains(&id) {
                continue;
            }
            let cx = FireCx::new(&id, self);
            tracing::trace!(extension = %id, "firing success");
            let outcome = ext
                .success_dyn(payload, handle, settings, &cx)
                .await
                .map_err(|e| Self::wrap(&id, EventKind::Success, e))?;
            if outcome.is_veto() {
                tracing::debug!(extension = %id, "success handler vetoed");
                all_continue = false;
            }
        }
        Ok(all_continue)
    }

    /// Fire `error` across all non-excluded extensions.
    pub async fn fire_error(
        &self,
        error: &TransportError,
        handle: &RequestHandle,
        settings: &RequestSettings,
    ) -> Result<bool, BusError> {
        if settings.off.contains(EventKind::Error.name()) {
            return Ok(true);
        }
        let mut all_continue = true;
        for (id, ext) in self.snapshot() {
            if settings.off.contains(&id) {
                continue;
            }
            let cx = FireCx::new(&id, self);
            let outcome = ext
                .error_dyn(error, handle, settings, &cx)
                .await
                .map_err(|e| Self::wrap(&id, EventKind::Error, e))?;
            all_continue &= !outcome.is_veto();
        }
        Ok(all_continue)
    }

    /// Fire `complete` across all non-excluded extensions.
    pub async fn fire_complete(
        &self,
        handle: &RequestHandle,
        settings: &RequestSettings,
    ) -> Result<bool, BusError> {
        if settings.off.contains(EventKind::Complete.name()) {
            return Ok(true);
        }
        let mut all_continue = true;
        for (id, ext) in self.snapshot() {
            if settings.off.contains(&id) {
                continue;
            }
            let cx = FireCx::new(&id, self);
            let outcome = ext
                .complete_dyn(handle, settings, &cx)
                .await
                .map_err(|e| Self::wrap(&id, EventKind::Complete, e))?;
            all_continue &= !outcome.is_veto();
        }
        Ok(all_continue)
    }
}

impl Manager for Bus {
    fn extension(&self, id: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        self.entries
            .read()
            .unwrap()
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.state.clone())
    }

    fn rebind(&self) -> BoxFuture<'_, Result<(), BusError>> {
        Box::pin(async move { self.fire_load().await.map(|_| ()) })
    }
}
