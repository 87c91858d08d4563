use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::field::FieldConfig;

/// How the renderer arranges the fields of a form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FormLayout {
    Horizontal,
    #[default]
    Vertical,
    Grid,
}

/// Top-level form definition. Field order is display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormConfig {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
    #[serde(default)]
    pub layout: FormLayout,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_label: Option<String>,
    #[serde(default)]
    pub show_reset: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_label: Option<String>,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            id: "default".into(),
            title: None,
            description: None,
            fields: Vec::new(),
            layout: FormLayout::Vertical,
            submit_label: None,
            cancel_label: None,
            show_reset: false,
            reset_label: None,
        }
    }
}

impl FormConfig {
    pub fn new(id: impl Into<String>, fields: Vec<FieldConfig>) -> Self {
        Self {
            id: id.into(),
            fields,
            ..Self::default()
        }
    }

    pub fn submit_label(&self) -> &str {
        self.submit_label.as_deref().unwrap_or("Submit")
    }

    pub fn cancel_label(&self) -> &str {
        self.cancel_label.as_deref().unwrap_or("Cancel")
    }

    pub fn reset_label(&self) -> &str {
        self.reset_label.as_deref().unwrap_or("Reset")
    }

    pub fn field(&self, key: &str) -> Option<&FieldConfig> {
        self.fields.iter().find(|field| field.key == key)
    }

    pub fn field_mut(&mut self, key: &str) -> Option<&mut FieldConfig> {
        self.fields.iter_mut().find(|field| field.key == key)
    }
}
