//! The forms extension: builds the outgoing payload for form submissions.

use crate::ext::ids;
use crate::ext::snippets::SnippetsExt;
use pagelet_core::{
    ActionOrigin, BoxError, ElementKind, Extension, FieldValue, FireCx, FireOutcome, FormRuntime,
    Part, PartValue, RequestBody, RequestSettings,
};
use std::sync::Arc;

/// Builds form bodies and re-initializes third-party validation on patched
/// snippets.
///
/// Submit and image controls inject their name/value (or click-coordinate
/// pair); POST forms become multipart when multipart upload is available,
/// with empty file fields pruned; everything else serializes to a single
/// urlencoded body.
pub struct FormsExt {
    runtime: Option<Arc<dyn FormRuntime>>,
    multipart: bool,
}

impl FormsExt {
    /// A forms extension with multipart upload available.
    pub fn new() -> Self {
        Self {
            runtime: None,
            multipart: true,
        }
    }

    /// Attach a third-party validation runtime to re-initialize on patched
    /// snippets containing forms.
    pub fn with_runtime(mut self, runtime: Arc<dyn FormRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Disable multipart upload; POST forms serialize as urlencoded.
    pub fn without_multipart(mut self) -> Self {
        self.multipart = false;
        self
    }
}

impl Default for FormsExt {
    fn default() -> Self {
        Self::new()
    }
}

impl Extension for FormsExt {
    async fn on_init(&self, cx: &FireCx<'_>) -> Result<FireOutcome, BoxError> {
        let Some(runtime) = self.runtime.clone() else {
            return Ok(FireOutcome::Continue);
        };
        let Some(snippets) = cx.lookup::<SnippetsExt>(ids::SNIPPETS) else {
            return Ok(FireOutcome::Continue);
        };
        snippets
            .engine()
            .on_after(move |node| runtime.init_forms_within(node));
        Ok(FireOutcome::Continue)
    }

    async fn on_prepare(
        &self,
        settings: &mut RequestSettings,
        _cx: &FireCx<'_>,
    ) -> Result<FireOutcome, BoxError> {
        let Some(origin) = settings.origin.as_ref() else {
            return Ok(FireOutcome::Continue);
        };
        let Some(form) = origin.form.as_ref() else {
            return Ok(FireOutcome::Continue);
        };
        let body = build_body(origin, form, settings.body.clone(), self.multipart)?;
        settings.body = body;
        Ok(FireOutcome::Continue)
    }
}

/// The control that initiated the submission contributes its own pair(s).
fn control_pairs(origin: &ActionOrigin) -> Vec<(String, String)> {
    let Some(name) = origin.element.attr("name") else {
        return Vec::new();
    };
    match origin.kind {
        ElementKind::SubmitControl => vec![(
            name.to_owned(),
            origin.element.attr("value").unwrap_or("").to_owned(),
        )],
        ElementKind::ImageControl => {
            let (x, y) = origin.event.offset.unwrap_or((0, 0));
            let (x, y) = (x.max(0), y.max(0));
            if name.contains('[') {
                // Inside a container: both coordinates under the one name.
                vec![
                    (format!("{name}[]"), x.to_string()),
                    (format!("{name}[]"), y.to_string()),
                ]
            } else {
                vec![
                    (format!("{name}.x"), x.to_string()),
                    (format!("{name}.y"), y.to_string()),
                ]
            }
        }
        _ => Vec::new(),
    }
}

fn existing_pairs(existing: RequestBody) -> Result<Vec<(String, String)>, BoxError> {
    match existing {
        RequestBody::Empty => Ok(Vec::new()),
        RequestBody::Pairs(pairs) => Ok(pairs),
        RequestBody::Encoded(encoded) => Ok(serde_urlencoded::from_str(&encoded)?),
        RequestBody::Multipart(parts) => Ok(parts
            .into_iter()
            .filter_map(|part| match part.value {
                PartValue::Text(value) => Some((part.name, value)),
                PartValue::File(_) => None,
            })
            .collect()),
    }
}

fn build_body(
    origin: &ActionOrigin,
    form: &pagelet_core::FormInfo,
    existing: RequestBody,
    multipart_available: bool,
) -> Result<RequestBody, BoxError> {
    let control = control_pairs(origin);
    let extra = existing_pairs(existing)?;

    if form.is_post() && multipart_available {
        let mut parts = Vec::new();
        for field in &form.fields {
            match &field.value {
                FieldValue::Text(value) => parts.push(Part {
                    name: field.name.clone(),
                    value: PartValue::Text(value.clone()),
                }),
                // Untouched file inputs are pruned; some engines stall on
                // empty file parts.
                FieldValue::File(file) if file.is_empty() => {}
                FieldValue::File(file) => parts.push(Part {
                    name: field.name.clone(),
                    value: PartValue::File(file.clone()),
                }),
            }
        }
        for (name, value) in control.into_iter().chain(extra) {
            parts.push(Part {
                name,
                value: PartValue::Text(value),
            });
        }
        return Ok(RequestBody::Multipart(parts));
    }

    let mut pairs: Vec<(String, String)> = form
        .fields
        .iter()
        .filter_map(|field| match &field.value {
            FieldValue::Text(value) => Some((field.name.clone(), value.clone())),
            FieldValue::File(_) => None,
        })
        .collect();
    pairs.extend(control);
    pairs.extend(extra);
    Ok(RequestBody::Encoded(serde_urlencoded::to_string(&pairs)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagelet_core::{Element, FilePart, FormInfo, UiEvent};

    fn origin_for(element: Element, event: UiEvent) -> ActionOrigin {
        ActionOrigin::derive(element, event)
    }

    fn body_for(origin: &ActionOrigin, existing: RequestBody, multipart: bool) -> RequestBody {
        let form = origin.form.as_ref().unwrap();
        build_body(origin, form, existing, multipart).unwrap()
    }

    #[test]
    fn get_form_serializes_urlencoded() {
        let form = FormInfo::new()
            .with_method("get")
            .with_field("q", "a b")
            .with_field("page", "2");
        let origin = origin_for(Element::new("form").with_form(form), UiEvent::new());
        let body = body_for(&origin, RequestBody::Empty, true);
        assert_eq!(body, RequestBody::Encoded("q=a+b&page=2".into()));
    }

    #[test]
    fn submit_control_injects_its_pair() {
        let form = FormInfo::new().with_field("q", "x");
        let submit = Element::new("input")
            .with_attr("type", "submit")
            .with_attr("name", "save")
            .with_attr("value", "Save")
            .with_form(form);
        let origin = origin_for(submit, UiEvent::new());
        let body = body_for(&origin, RequestBody::Empty, true);
        assert_eq!(body, RequestBody::Encoded("q=x&save=Save".into()));
    }

    #[test]
    fn image_control_injects_clamped_coordinates() {
        let form = FormInfo::new();
        let image = Element::new("input")
            .with_attr("type", "image")
            .with_attr("name", "map")
            .with_form(form);
        let origin = origin_for(image, UiEvent::new().with_offset(12, -3));
        let body = body_for(&origin, RequestBody::Empty, true);
        assert_eq!(body, RequestBody::Encoded("map.x=12&map.y=0".into()));
    }

    #[test]
    fn bracketed_image_name_keeps_the_container() {
        let image = Element::new("input")
            .with_attr("type", "image")
            .with_attr("name", "pos[coords]")
            .with_form(FormInfo::new());
        let origin = origin_for(image, UiEvent::new().with_offset(4, 5));
        let body = body_for(&origin, RequestBody::Empty, true);
        assert_eq!(
            body,
            RequestBody::Encoded("pos%5Bcoords%5D%5B%5D=4&pos%5Bcoords%5D%5B%5D=5".into())
        );
    }

    #[test]
    fn post_form_with_multipart_prunes_empty_files() {
        let form = FormInfo::new()
            .with_method("post")
            .with_field("title", "hello")
            .with_file("upload", FilePart::default())
            .with_file(
                "avatar",
                FilePart {
                    filename: "me.png".into(),
                    content_type: Some("image/png".into()),
                    bytes: vec![1, 2, 3],
                },
            );
        let origin = origin_for(Element::new("form").with_form(form), UiEvent::new());
        let body = body_for(&origin, RequestBody::Empty, true);
        let RequestBody::Multipart(parts) = body else {
            panic!("expected multipart");
        };
        let names: Vec<&str> = parts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["title", "avatar"]);
    }

    #[test]
    fn post_form_without_multipart_falls_back_to_urlencoded() {
        let form = FormInfo::new().with_method("post").with_field("a", "1");
        let origin = origin_for(Element::new("form").with_form(form), UiEvent::new());
        let body = body_for(&origin, RequestBody::Pairs(vec![("b".into(), "2".into())]), false);
        assert_eq!(body, RequestBody::Encoded("a=1&b=2".into()));
    }

    #[test]
    fn caller_data_merges_into_multipart() {
        let form = FormInfo::new().with_method("post").with_field("a", "1");
        let origin = origin_for(Element::new("form").with_form(form), UiEvent::new());
        let body = body_for(&origin, RequestBody::Encoded("extra=yes".into()), true);
        let RequestBody::Multipart(parts) = body else {
            panic!("expected multipart");
        };
        assert!(parts
            .iter()
            .any(|p| p.name == "extra" && p.value == PartValue::Text("yes".into())));
    }
}
