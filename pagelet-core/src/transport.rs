//! The transport boundary: requests in flight and their cancelable handles.

use crate::error::TransportError;
use crate::request::{Method, RequestBody, RequestSettings};
use futures::future::{AbortHandle, Abortable, BoxFuture};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// What the transport needs to perform one exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// Target URL.
    pub url: String,
    /// HTTP method.
    pub method: Method,
    /// Request body.
    pub body: RequestBody,
    /// Pass-through timeout, if the caller set one.
    pub timeout: Option<std::time::Duration>,
}

impl TransportRequest {
    /// Extract the transport-relevant subset of a request descriptor.
    pub fn from_settings(settings: &RequestSettings) -> Self {
        Self {
            url: settings.url.clone(),
            method: settings.method.clone(),
            body: settings.body.clone(),
            timeout: settings.timeout,
        }
    }
}

/// A settled successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportReply {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

/// The HTTP transport collaborator.
///
/// Implementations resolve with `Ok` only for success statuses; HTTP-level
/// failures come back as [`TransportError::Status`] so the pipeline can
/// route them through the `error` event.
pub trait Transport: Send + Sync {
    /// Perform one exchange.
    fn send(&self, request: TransportRequest) -> BoxFuture<'static, Result<TransportReply, TransportError>>;
}

/// Terminal status of a request handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleStatus {
    /// The exchange has not settled yet.
    Pending,
    /// The exchange succeeded.
    Done,
    /// The exchange failed.
    Failed,
    /// The exchange was canceled before settling.
    Canceled,
}

const PENDING: u8 = 0;
const DONE: u8 = 1;
const FAILED: u8 = 2;
const CANCELED: u8 = 3;

/// Cancelable token for one request in flight.
///
/// The pipeline constructs it only by wrapping a transport future; cloning
/// shares the underlying request. Extensions receive the handle at `start`,
/// before the response can possibly arrive, and may cancel it. Canceling
/// suppresses `success`/`error` notifications; `complete` still fires
/// exactly once for bookkeeping.
#[derive(Debug, Clone)]
pub struct RequestHandle {
    abort: AbortHandle,
    status: Arc<AtomicU8>,
}

impl RequestHandle {
    /// Current status.
    pub fn status(&self) -> HandleStatus {
        match self.status.load(Ordering::Acquire) {
            DONE => HandleStatus::Done,
            FAILED => HandleStatus::Failed,
            CANCELED => HandleStatus::Canceled,
            _ => HandleStatus::Pending,
        }
    }

    /// Whether the handle reached the canceled terminal status.
    pub fn is_canceled(&self) -> bool {
        self.status() == HandleStatus::Canceled
    }

    /// Whether the exchange settled, whatever the outcome.
    pub fn is_settled(&self) -> bool {
        self.status() != HandleStatus::Pending
    }

    /// Cancel the in-flight request. A no-op once settled.
    pub fn cancel(&self) {
        if self
            .status
            .compare_exchange(PENDING, CANCELED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.abort.abort();
        }
    }

    /// Whether two handles refer to the same exchange.
    pub fn same(&self, other: &RequestHandle) -> bool {
        Arc::ptr_eq(&self.status, &other.status)
    }

    /// Record a terminal status. Used by the handle binder; only the first
    /// transition away from pending wins.
    pub fn mark(&self, status: HandleStatus) {
        let raw = match status {
            HandleStatus::Pending => return,
            HandleStatus::Done => DONE,
            HandleStatus::Failed => FAILED,
            HandleStatus::Canceled => CANCELED,
        };
        let _ = self
            .status
            .compare_exchange(PENDING, raw, Ordering::AcqRel, Ordering::Acquire);
    }
}

/// An issued exchange: the cancelable handle plus the abortable future.
pub struct InFlight {
    handle: RequestHandle,
    future: Abortable<BoxFuture<'static, Result<TransportReply, TransportError>>>,
}

impl InFlight {
    /// Issue a request on the given transport.
    pub fn issue(transport: &dyn Transport, request: TransportRequest) -> Self {
        let (abort, registration) = AbortHandle::new_pair();
        let future = Abortable::new(transport.send(request), registration);
        Self {
            handle: RequestHandle {
                abort,
                status: Arc::new(AtomicU8::new(PENDING)),
            },
            future,
        }
    }

    /// A handle sharing this exchange.
    pub fn handle(&self) -> RequestHandle {
        self.handle.clone()
    }

    /// Await settlement. `None` means the exchange was canceled.
    pub async fn settle(self) -> Option<Result<TransportReply, TransportError>> {
        self.future.await.ok()
    }
}

/// How one orchestrated request ended.
#[derive(Debug)]
pub enum RequestOutcome {
    /// The prepare/before pipeline rejected the request; the transport was
    /// never engaged.
    Vetoed,
    /// The exchange ran; inspect the handle for its terminal status.
    Finished(RequestHandle),
}

impl RequestOutcome {
    /// The handle, when the transport engaged.
    pub fn handle(&self) -> Option<&RequestHandle> {
        match self {
            RequestOutcome::Vetoed => None,
            RequestOutcome::Finished(handle) => Some(handle),
        }
    }

    /// Whether the request was vetoed before the transport engaged.
    pub fn was_vetoed(&self) -> bool {
        matches!(self, RequestOutcome::Vetoed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future;

    struct NullTransport;

    impl Transport for NullTransport {
        fn send(
            &self,
            _request: TransportRequest,
        ) -> BoxFuture<'static, Result<TransportReply, TransportError>> {
            Box::pin(future::pending())
        }
    }

    fn request() -> TransportRequest {
        TransportRequest {
            url: "/page".into(),
            method: Method::Get,
            body: RequestBody::Empty,
            timeout: None,
        }
    }

    #[tokio::test]
    async fn cancel_aborts_the_future() {
        let in_flight = InFlight::issue(&NullTransport, request());
        let handle = in_flight.handle();
        assert_eq!(handle.status(), HandleStatus::Pending);

        handle.cancel();
        assert!(handle.is_canceled());
        assert_eq!(in_flight.settle().await, None);
    }

    #[tokio::test]
    async fn cancel_after_settlement_is_a_no_op() {
        let in_flight = InFlight::issue(&NullTransport, request());
        let handle = in_flight.handle();
        handle.mark(HandleStatus::Done);
        handle.cancel();
        assert_eq!(handle.status(), HandleStatus::Done);
    }

    #[test]
    fn clones_share_the_exchange() {
        let in_flight = InFlight::issue(&NullTransport, request());
        let a = in_flight.handle();
        let b = in_flight.handle();
        assert!(a.same(&b));
        a.cancel();
        assert!(b.is_canceled());
    }
}
