//! The validation extension: decides whether a triggered request fires at
//! all.

use pagelet_core::{
    ActionOrigin, BoxError, ElementKind, Extension, FireCx, FireOutcome, FormRuntime, Navigator,
    RequestSettings, ValidateOverrides, ValidationRules, attrs,
};
use std::sync::{Arc, Mutex};
use url::Url;

/// Vetoes requests that should stay native: open-in-new-view intent,
/// rejected form validation, same-page anchors and non-http schemes.
///
/// Unless the element opts out via `data-ajax-pass`, a request that *does*
/// go through the AJAX path gets the native event's default action and
/// propagation stopped, so only one submission happens.
pub struct ValidationExt {
    navigator: Option<Arc<dyn Navigator>>,
    runtime: Option<Arc<dyn FormRuntime>>,
    defaults: ValidationRules,
    // "submission already handled" guard: a modifier-clicked submit control
    // vetoes and arms this; the enclosing form's own submit consumes it.
    submission_handled: Mutex<bool>,
}

impl ValidationExt {
    /// A validation extension with default rules and no collaborators.
    pub fn new() -> Self {
        Self {
            navigator: None,
            runtime: None,
            defaults: ValidationRules::default(),
            submission_handled: Mutex::new(false),
        }
    }

    /// Attach a navigator for same-page anchor detection.
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Attach a third-party form validation runtime.
    pub fn with_runtime(mut self, runtime: Arc<dyn FormRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Override the default rule set.
    pub fn with_defaults(mut self, defaults: ValidationRules) -> Self {
        self.defaults = defaults;
        self
    }

    fn effective_rules(&self, settings: &RequestSettings, origin: &ActionOrigin) -> ValidationRules {
        let overrides = settings.validate.or_else(|| parse_validate_attr(origin));
        self.defaults.apply(overrides.unwrap_or_default())
    }

    fn check_keys(&self, origin: &ActionOrigin) -> FireOutcome {
        let modified = origin.event.modified();
        if origin.form.is_some() {
            if modified && origin.kind == ElementKind::SubmitControl {
                *self.submission_handled.lock().unwrap() = true;
                return FireOutcome::Veto;
            }
            if origin.kind == ElementKind::Form
                && std::mem::take(&mut *self.submission_handled.lock().unwrap())
            {
                return FireOutcome::Veto;
            }
            FireOutcome::Continue
        } else if modified {
            FireOutcome::Veto
        } else {
            FireOutcome::Continue
        }
    }

    fn check_form(&self, origin: &ActionOrigin) -> FireOutcome {
        let (Some(form), Some(runtime)) = (origin.form.as_ref(), self.runtime.as_ref()) else {
            return FireOutcome::Continue;
        };
        let submitted_by = matches!(
            origin.kind,
            ElementKind::SubmitControl | ElementKind::ImageControl
        )
        .then(|| origin.element.attr("name"))
        .flatten();
        if !runtime.validate(form, submitted_by) {
            origin.event.stop_propagation();
            origin.event.prevent_default();
            return FireOutcome::Veto;
        }
        FireOutcome::Continue
    }

    /// Whether the target URL must stay native: fragment-only jumps,
    /// same-page anchors and non-http schemes.
    fn check_url(&self, target: &str) -> FireOutcome {
        let target = target.trim();
        if target.is_empty() {
            return FireOutcome::Continue;
        }
        if target.starts_with('#') {
            return FireOutcome::Veto;
        }
        let current = self
            .navigator
            .as_ref()
            .and_then(|n| Url::parse(&n.location()).ok());
        let resolved = match &current {
            Some(base) => base.join(target).ok(),
            None => Url::parse(target).ok(),
        };
        let Some(url) = resolved else {
            return FireOutcome::Continue;
        };
        if url.scheme() != "http" && url.scheme() != "https" {
            return FireOutcome::Veto;
        }
        if let Some(base) = &current {
            if url.fragment().is_some() && url.path() == base.path() && url.query() == base.query()
            {
                return FireOutcome::Veto;
            }
        }
        FireOutcome::Continue
    }
}

impl Default for ValidationExt {
    fn default() -> Self {
        Self::new()
    }
}

impl Extension for ValidationExt {
    async fn on_before(
        &self,
        settings: &mut RequestSettings,
        _cx: &FireCx<'_>,
    ) -> Result<FireOutcome, BoxError> {
        let Some(origin) = settings.origin.as_ref() else {
            return Ok(FireOutcome::Continue);
        };
        let rules = self.effective_rules(settings, origin);
        let pass = origin
            .element
            .attr(attrs::PASS)
            .map(|value| value != "false")
            .unwrap_or(false);

        if rules.keys && self.check_keys(origin).is_veto() {
            // The request is vetoed in favor of the native action, which
            // therefore must not be suppressed.
            return Ok(FireOutcome::Veto);
        }
        if rules.form && self.check_form(origin).is_veto() {
            return Ok(FireOutcome::Veto);
        }
        if rules.url {
            let target = if origin.form.is_some() {
                settings.url.as_str()
            } else {
                origin.element.attr("href").unwrap_or("")
            };
            if self.check_url(target).is_veto() {
                return Ok(FireOutcome::Veto);
            }
        }

        if !pass {
            origin.event.stop_propagation();
            origin.event.prevent_default();
        }
        Ok(FireOutcome::Continue)
    }
}

fn parse_validate_attr(origin: &ActionOrigin) -> Option<ValidateOverrides> {
    let raw = origin.element.attr(attrs::VALIDATE)?.trim();
    if raw == "false" {
        return Some(ValidateOverrides::none());
    }
    serde_json::from_str(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeNavigator, ScriptedFormRuntime};
    use pagelet_core::{Element, FormInfo, Modifiers, UiEvent};

    fn origin_settings(element: Element, event: UiEvent) -> RequestSettings {
        let origin = ActionOrigin::derive(element, event);
        let url = origin
            .element
            .attr("href")
            .unwrap_or_default()
            .to_owned();
        RequestSettings {
            url,
            origin: Some(origin),
            ..RequestSettings::default()
        }
    }

    struct NoManager;

    impl pagelet_core::Manager for NoManager {
        fn extension(&self, _id: &str) -> Option<Arc<dyn std::any::Any + Send + Sync>> {
            None
        }

        fn rebind(&self) -> futures::future::BoxFuture<'_, Result<(), pagelet_core::BusError>> {
            Box::pin(async { Ok(()) })
        }
    }

    async fn run(ext: &ValidationExt, settings: &mut RequestSettings) -> FireOutcome {
        let manager = NoManager;
        let cx = FireCx::new(crate::ext::ids::VALIDATION, &manager);
        ext.on_before(settings, &cx).await.unwrap()
    }

    #[tokio::test]
    async fn modifier_click_vetoes_without_suppressing_native_action() {
        let ext = ValidationExt::new();
        let element = Element::new("a").with_attr("href", "/page");
        let event = UiEvent::new().with_modifiers(Modifiers::CTRL);
        let mut settings = origin_settings(element, event.clone());
        assert_eq!(run(&ext, &mut settings).await, FireOutcome::Veto);
        assert!(!event.default_prevented());
    }

    #[tokio::test]
    async fn plain_click_continues_and_suppresses_native_action() {
        let ext = ValidationExt::new();
        let element = Element::new("a").with_attr("href", "/page");
        let event = UiEvent::new();
        let mut settings = origin_settings(element, event.clone());
        assert_eq!(run(&ext, &mut settings).await, FireOutcome::Continue);
        assert!(event.default_prevented());
        assert!(event.propagation_stopped());
    }

    #[tokio::test]
    async fn pass_attribute_keeps_the_native_action() {
        let ext = ValidationExt::new();
        let element = Element::new("a")
            .with_attr("href", "/page")
            .with_attr(attrs::PASS, "");
        let event = UiEvent::new();
        let mut settings = origin_settings(element, event.clone());
        assert_eq!(run(&ext, &mut settings).await, FireOutcome::Continue);
        assert!(!event.default_prevented());
    }

    #[tokio::test]
    async fn validate_attribute_disables_checks() {
        let ext = ValidationExt::new();
        let element = Element::new("a")
            .with_attr("href", "/page")
            .with_attr(attrs::VALIDATE, "false");
        let event = UiEvent::new().with_modifiers(Modifiers::META);
        let mut settings = origin_settings(element, event);
        assert_eq!(run(&ext, &mut settings).await, FireOutcome::Continue);

        let element = Element::new("a")
            .with_attr("href", "/page")
            .with_attr(attrs::VALIDATE, r#"{"keys": false}"#);
        let event = UiEvent::new().with_modifiers(Modifiers::META);
        let mut settings = origin_settings(element, event);
        assert_eq!(run(&ext, &mut settings).await, FireOutcome::Continue);
    }

    #[tokio::test]
    async fn anchor_only_and_foreign_schemes_stay_native() {
        let ext = ValidationExt::new()
            .with_navigator(Arc::new(FakeNavigator::at("http://app.test/list?p=1")));

        for href in ["#section", "mailto:someone@app.test", "http://app.test/list?p=1#x"] {
            let element = Element::new("a").with_attr("href", href);
            let mut settings = origin_settings(element, UiEvent::new());
            assert_eq!(run(&ext, &mut settings).await, FireOutcome::Veto, "{href}");
        }

        let element = Element::new("a").with_attr("href", "/other");
        let mut settings = origin_settings(element, UiEvent::new());
        assert_eq!(run(&ext, &mut settings).await, FireOutcome::Continue);
    }

    #[tokio::test]
    async fn rejected_form_validation_vetoes_and_suppresses() {
        let runtime = Arc::new(ScriptedFormRuntime::rejecting());
        let ext = ValidationExt::new().with_runtime(runtime.clone());
        let form = FormInfo::new().with_action("/save").with_method("post");
        let element = Element::new("form").with_form(form);
        let event = UiEvent::new();
        let mut settings = origin_settings(element, event.clone());
        settings.url = "/save".into();
        assert_eq!(run(&ext, &mut settings).await, FireOutcome::Veto);
        assert!(event.default_prevented());
        assert_eq!(runtime.validated(), 1);
    }

    #[tokio::test]
    async fn submit_control_guard_consumes_one_form_submission() {
        let ext = ValidationExt::new();
        let form = FormInfo::new().with_action("/save");

        // Modifier-click on the submit control: veto, arm the guard.
        let submit = Element::new("input")
            .with_attr("type", "submit")
            .with_form(form.clone());
        let mut settings =
            origin_settings(submit, UiEvent::new().with_modifiers(Modifiers::CTRL));
        settings.url = "/save".into();
        assert_eq!(run(&ext, &mut settings).await, FireOutcome::Veto);

        // The form's own submit right after: consumed, vetoed once.
        let form_el = Element::new("form").with_form(form.clone());
        let mut settings = origin_settings(form_el.clone(), UiEvent::new());
        settings.url = "/save".into();
        assert_eq!(run(&ext, &mut settings).await, FireOutcome::Veto);

        // Next plain submission goes through.
        let mut settings = origin_settings(form_el, UiEvent::new());
        settings.url = "/save".into();
        assert_eq!(run(&ext, &mut settings).await, FireOutcome::Continue);
    }
}
