//! Request orchestration: from trigger (or raw settings) to settled
//! exchange.
//!
//! The orchestrator derives request parameters from the triggering DOM
//! action, runs the `prepare` → `before` pipeline, issues the transport
//! request and binds the lifecycle events to the in-flight exchange.

use crate::bus::Bus;
use pagelet_core::{
    ActionOrigin, Element, ExclusionSet, HandleStatus, InFlight, Method, RequestOutcome,
    RequestSettings, ResponsePayload, TransportError, TransportRequest, UiEvent, attrs,
};

impl Bus {
    /// Execute a request for a bare URL.
    pub async fn request_url(
        &self,
        url: impl Into<String>,
    ) -> Result<RequestOutcome, pagelet_core::BusError> {
        self.request(RequestSettings::new(url)).await
    }

    /// Execute a request triggered by a DOM action.
    ///
    /// Derives the origin sub-record: classifies the element, resolves the
    /// owning form, defaults the URL to the form action (falling back to
    /// the current location) or the link href, defaults the method to the
    /// form's, and parses the element's `data-ajax-off` attribute into the
    /// per-request exclusion list.
    pub async fn request_from(
        &self,
        element: Element,
        event: UiEvent,
    ) -> Result<RequestOutcome, pagelet_core::BusError> {
        self.request(self.derive_settings(element, event)).await
    }

    /// Execute a request described by a full settings record.
    pub async fn request(
        &self,
        mut settings: RequestSettings,
    ) -> Result<RequestOutcome, pagelet_core::BusError> {
        let prepared = self.fire_prepare(&mut settings).await?;
        if !prepared {
            tracing::debug!(url = %settings.url, "prepare pipeline vetoed; request proceeds");
        }
        if let Some(hook) = settings.prepare.take() {
            hook(&mut settings);
        }

        if !self.fire_before(&mut settings).await? {
            return Ok(RequestOutcome::Vetoed);
        }
        if let Some(hook) = settings.before_send.take() {
            if !hook(&settings) {
                tracing::debug!(url = %settings.url, "before_send hook aborted the request");
                return Ok(RequestOutcome::Vetoed);
            }
        }

        let in_flight = InFlight::issue(
            self.transport.as_ref(),
            TransportRequest::from_settings(&settings),
        );
        self.attach(in_flight, &mut settings).await
    }

    /// Bind lifecycle events to an in-flight exchange (the handle binder).
    ///
    /// `start` fires synchronously before the transport future is first
    /// polled, so it always precedes `success`/`error`/`complete` — this
    /// lets extensions capture the handle for cancellation before the
    /// response can possibly arrive. A handle already in the canceled
    /// terminal status is returned unchanged and nothing fires.
    pub async fn attach(
        &self,
        in_flight: InFlight,
        settings: &mut RequestSettings,
    ) -> Result<RequestOutcome, pagelet_core::BusError> {
        let handle = in_flight.handle();
        if handle.is_canceled() {
            return Ok(RequestOutcome::Finished(handle));
        }

        let start_hook = settings.start.take();
        self.fire_start(&handle, settings).await?;
        if let Some(hook) = start_hook {
            hook(&handle, settings);
        }

        match in_flight.settle().await {
            Some(Ok(reply)) => match ResponsePayload::parse(&reply.body) {
                Ok(payload) => {
                    handle.mark(HandleStatus::Done);
                    self.fire_success(&payload, &handle, settings).await?;
                }
                Err(e) => {
                    handle.mark(HandleStatus::Failed);
                    let error = TransportError::Payload(e.to_string());
                    tracing::warn!(url = %settings.url, %error, "response payload rejected");
                    self.fire_error(&error, &handle, settings).await?;
                }
            },
            Some(Err(error)) => {
                handle.mark(HandleStatus::Failed);
                tracing::warn!(url = %settings.url, %error, "transport failure");
                self.fire_error(&error, &handle, settings).await?;
            }
            // Canceled mid-flight: success/error are suppressed, complete
            // still fires exactly once.
            None => {}
        }
        self.fire_complete(&handle, settings).await?;
        Ok(RequestOutcome::Finished(handle))
    }

    fn derive_settings(&self, element: Element, event: UiEvent) -> RequestSettings {
        let off = element
            .attr(attrs::OFF)
            .map(ExclusionSet::parse_attr)
            .unwrap_or_default();
        let origin = ActionOrigin::derive(element, event);

        let url = match &origin.form {
            Some(form) => form
                .action
                .clone()
                .or_else(|| self.navigator.as_ref().map(|n| n.location()))
                .unwrap_or_default(),
            None => origin.element.attr("href").unwrap_or_default().to_owned(),
        };
        let method = origin
            .form
            .as_ref()
            .and_then(|form| form.method.as_deref())
            .map(Method::parse)
            .unwrap_or_default();

        RequestSettings {
            url,
            method,
            off,
            origin: Some(origin),
            ..RequestSettings::default()
        }
    }
}
