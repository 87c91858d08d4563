use serde_json::{Value, json};

use crate::control::ControlStatus;
use crate::session::FormSession;
use crate::spec::field::{FieldFamily, FieldKind};
use crate::spec::form::FormLayout;
use crate::value::{FormValue, NativeValueKind};

/// Everything a field renderer needs to draw one field.
#[derive(Debug, Clone)]
pub struct RenderField {
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    pub family: FieldFamily,
    pub native_value: NativeValueKind,
    pub placeholder: String,
    pub help_text: Option<String>,
    pub grid_class: Option<String>,
    pub style_class: Option<String>,
    pub required: bool,
    pub disabled: bool,
    pub status: ControlStatus,
    pub value: FormValue,
    pub show_error: bool,
    pub error_message: String,
}

/// Renderer-facing snapshot of a form session.
#[derive(Debug, Clone)]
pub struct RenderPayload {
    pub form_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub layout: FormLayout,
    pub submit_label: String,
    pub cancel_label: String,
    pub reset_label: Option<String>,
    pub submitted: bool,
    pub submitting: bool,
    pub form_error: Option<String>,
    pub fields: Vec<RenderField>,
}

/// Builds the payload for the visible fields of a session.
pub fn build_render_payload(session: &FormSession) -> RenderPayload {
    let config = session.config();
    let fields = session
        .visible_fields()
        .filter_map(|field| {
            let control = session.control(&field.key)?;
            Some(RenderField {
                key: field.key.clone(),
                label: field.label.clone(),
                kind: field.kind.clone(),
                family: field.kind.family(),
                native_value: field.kind.native_value_kind(),
                placeholder: field.placeholder_text().to_string(),
                help_text: field.help_text.clone(),
                grid_class: field.grid_class.clone(),
                style_class: field.style_class.clone(),
                required: field.is_required(),
                disabled: control.disabled(),
                status: control.status(),
                value: control.value().clone(),
                show_error: session.should_show_error(&field.key),
                error_message: session.error_message(&field.key).unwrap_or_default(),
            })
        })
        .collect();

    RenderPayload {
        form_id: config.id.clone(),
        title: config.title.clone(),
        description: config.description.clone(),
        layout: config.layout,
        submit_label: config.submit_label().to_string(),
        cancel_label: config.cancel_label().to_string(),
        reset_label: config
            .show_reset
            .then(|| config.reset_label().to_string()),
        submitted: session.submitted(),
        submitting: session.submitting(),
        form_error: Some(session.form_error().to_string()).filter(|error| !error.is_empty()),
        fields,
    }
}

/// JSON document of a payload for renderers living outside the process.
pub fn render_json(payload: &RenderPayload) -> Value {
    let fields: Vec<Value> = payload
        .fields
        .iter()
        .map(|field| {
            let mut kind = serde_json::to_value(&field.kind).unwrap_or(Value::Null);
            if let Some(map) = kind.as_object_mut() {
                map.remove("type");
            }
            let error = field.show_error.then(|| field.error_message.clone());
            json!({
                "key": field.key,
                "label": field.label,
                "type": field.kind.type_name(),
                "family": field.family,
                "native_value": field.native_value,
                "options": kind,
                "placeholder": field.placeholder,
                "help_text": field.help_text,
                "grid_class": field.grid_class,
                "style_class": field.style_class,
                "required": field.required,
                "disabled": field.disabled,
                "status": field.status,
                "value": field.value,
                "show_error": field.show_error,
                "error": error,
            })
        })
        .collect();

    json!({
        "form_id": payload.form_id,
        "title": payload.title,
        "description": payload.description,
        "layout": payload.layout,
        "submit_label": payload.submit_label,
        "cancel_label": payload.cancel_label,
        "reset_label": payload.reset_label,
        "submitted": payload.submitted,
        "submitting": payload.submitting,
        "form_error": payload.form_error,
        "fields": fields,
    })
}
