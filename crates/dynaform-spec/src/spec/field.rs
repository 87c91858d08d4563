use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::spec::validation::{RuleKind, ValidationRule};
use crate::transform::ValueTransformer;
use crate::value::{FormValue, NativeValueKind, parse_date};

/// Kind-specific attributes, discriminated by the `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    Text(TextOptions),
    Password(TextOptions),
    Textarea(TextOptions),
    Number(NumberOptions),
    Slider(NumberOptions),
    Dropdown(SelectOptions),
    Multiselect(SelectOptions),
    Radio(SelectOptions),
    Date(DateOptions),
    Calendar(DateOptions),
    Checkbox(CheckboxOptions),
    Toggle(CheckboxOptions),
    Rating(RatingOptions),
    Colorpicker(ColorOptions),
    Editor(EditorOptions),
}

/// Option families shared by several field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldFamily {
    Text,
    Numeric,
    Select,
    Date,
    Checkbox,
    Other,
}

impl FieldKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Text(_) => "text",
            FieldKind::Password(_) => "password",
            FieldKind::Textarea(_) => "textarea",
            FieldKind::Number(_) => "number",
            FieldKind::Slider(_) => "slider",
            FieldKind::Dropdown(_) => "dropdown",
            FieldKind::Multiselect(_) => "multiselect",
            FieldKind::Radio(_) => "radio",
            FieldKind::Date(_) => "date",
            FieldKind::Calendar(_) => "calendar",
            FieldKind::Checkbox(_) => "checkbox",
            FieldKind::Toggle(_) => "toggle",
            FieldKind::Rating(_) => "rating",
            FieldKind::Colorpicker(_) => "colorpicker",
            FieldKind::Editor(_) => "editor",
        }
    }

    pub fn family(&self) -> FieldFamily {
        match self {
            FieldKind::Text(_) | FieldKind::Password(_) | FieldKind::Textarea(_) => {
                FieldFamily::Text
            }
            FieldKind::Number(_) | FieldKind::Slider(_) => FieldFamily::Numeric,
            FieldKind::Dropdown(_) | FieldKind::Multiselect(_) | FieldKind::Radio(_) => {
                FieldFamily::Select
            }
            FieldKind::Date(_) | FieldKind::Calendar(_) => FieldFamily::Date,
            FieldKind::Checkbox(_) | FieldKind::Toggle(_) => FieldFamily::Checkbox,
            FieldKind::Rating(_) | FieldKind::Colorpicker(_) | FieldKind::Editor(_) => {
                FieldFamily::Other
            }
        }
    }

    /// The value type a renderer emits for this kind of field.
    pub fn native_value_kind(&self) -> NativeValueKind {
        match self {
            FieldKind::Text(_)
            | FieldKind::Password(_)
            | FieldKind::Textarea(_)
            | FieldKind::Colorpicker(_)
            | FieldKind::Editor(_) => NativeValueKind::Text,
            FieldKind::Number(_) | FieldKind::Rating(_) => NativeValueKind::Number,
            FieldKind::Slider(options) if options.is_range() => NativeValueKind::List,
            FieldKind::Slider(_) => NativeValueKind::Number,
            FieldKind::Dropdown(_) | FieldKind::Radio(_) => NativeValueKind::Any,
            FieldKind::Multiselect(_) => NativeValueKind::List,
            FieldKind::Date(_) | FieldKind::Calendar(_) => NativeValueKind::Date,
            FieldKind::Checkbox(_) | FieldKind::Toggle(_) => NativeValueKind::Bool,
        }
    }

    pub fn as_text(&self) -> Option<&TextOptions> {
        match self {
            FieldKind::Text(options) | FieldKind::Password(options) | FieldKind::Textarea(options) => {
                Some(options)
            }
            _ => None,
        }
    }

    pub fn as_numeric(&self) -> Option<&NumberOptions> {
        match self {
            FieldKind::Number(options) | FieldKind::Slider(options) => Some(options),
            _ => None,
        }
    }

    pub fn as_select(&self) -> Option<&SelectOptions> {
        match self {
            FieldKind::Dropdown(options)
            | FieldKind::Multiselect(options)
            | FieldKind::Radio(options) => Some(options),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateOptions> {
        match self {
            FieldKind::Date(options) | FieldKind::Calendar(options) => Some(options),
            _ => None,
        }
    }

    pub fn as_checkbox(&self) -> Option<&CheckboxOptions> {
        match self {
            FieldKind::Checkbox(options) | FieldKind::Toggle(options) => Some(options),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TextOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cols: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl TextOptions {
    pub fn rows(&self) -> u32 {
        self.rows.unwrap_or(3)
    }

    pub fn cols(&self) -> u32 {
        self.cols.unwrap_or(30)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NumberOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_buttons: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<bool>,
}

impl NumberOptions {
    /// Slider bounds; an unbounded slider spans 0..=100.
    pub fn slider_bounds(&self) -> (f64, f64) {
        (self.min.unwrap_or(0.0), self.max.unwrap_or(100.0))
    }

    pub fn step(&self) -> f64 {
        self.step.unwrap_or(1.0)
    }

    pub fn show_buttons(&self) -> bool {
        self.show_buttons.unwrap_or(false)
    }

    pub fn is_range(&self) -> bool {
        self.range.unwrap_or(false)
    }
}

/// One entry of a selectable field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SelectOption {
    pub label: String,
    #[serde(default)]
    #[schemars(with = "Value")]
    pub value: FormValue,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectOptions {
    #[serde(default)]
    pub options: Vec<SelectOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_value: Option<String>,
}

impl SelectOptions {
    pub fn filterable(&self) -> bool {
        self.filter.unwrap_or(false)
    }

    pub fn option_label(&self) -> &str {
        self.option_label.as_deref().unwrap_or("label")
    }

    pub fn option_value(&self) -> &str {
        self.option_value.as_deref().unwrap_or("value")
    }

    /// Options a user can still pick.
    pub fn enabled_options(&self) -> impl Iterator<Item = &SelectOption> {
        self.options.iter().filter(|option| !option.disabled)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DateOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_time: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_button_bar: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
    /// Kept as written; read through [`DateOptions::min_date`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_date: Option<String>,
}

impl DateOptions {
    pub fn date_format(&self) -> &str {
        self.date_format.as_deref().unwrap_or("mm/dd/yy")
    }

    pub fn shows_time(&self) -> bool {
        self.show_time.unwrap_or(false)
    }

    pub fn time_only(&self) -> bool {
        self.time_only.unwrap_or(false)
    }

    /// Lower bound, or `None` when unset or unparseable.
    pub fn min_date(&self) -> Option<OffsetDateTime> {
        date_bound("minDate", self.min_date.as_deref())
    }

    pub fn max_date(&self) -> Option<OffsetDateTime> {
        date_bound("maxDate", self.max_date.as_deref())
    }
}

fn date_bound(name: &str, raw: Option<&str>) -> Option<OffsetDateTime> {
    let raw = raw?;
    let parsed = parse_date(raw);
    if parsed.is_none() {
        tracing::warn!(bound = name, value = raw, "ignoring unparseable date bound");
    }
    parsed
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CheckboxOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<bool>,
}

impl CheckboxOptions {
    pub fn binary(&self) -> bool {
        self.binary.unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RatingOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stars: Option<u32>,
}

impl RatingOptions {
    pub fn stars(&self) -> u32 {
        self.stars.unwrap_or(5)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorFormat {
    #[default]
    Hex,
    Rgb,
    Hsb,
}

impl ColorFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "hex" => Some(ColorFormat::Hex),
            "rgb" => Some(ColorFormat::Rgb),
            "hsb" => Some(ColorFormat::Hsb),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ColorOptions {
    /// `hex`, `rgb` or `hsb`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl ColorOptions {
    /// Unknown formats fall back to hex.
    pub fn format(&self) -> ColorFormat {
        let Some(name) = self.format.as_deref() else {
            return ColorFormat::default();
        };
        ColorFormat::from_name(name).unwrap_or_else(|| {
            tracing::warn!(format = name, "unknown color format, using hex");
            ColorFormat::default()
        })
    }
}

/// Rich-text editor toolbar modules are passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EditorOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modules: Option<Value>,
}

/// Definition of a single field inside a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    pub key: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<Value>")]
    pub default_value: Option<FormValue>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<ValidationRule>,
    #[serde(skip)]
    pub transformer: Option<ValueTransformer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

impl FieldConfig {
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind,
            placeholder: None,
            default_value: None,
            disabled: false,
            hidden: false,
            validators: Vec::new(),
            transformer: None,
            grid_class: None,
            style_class: None,
            help_text: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<FormValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_rules(mut self, rules: Vec<ValidationRule>) -> Self {
        self.validators = rules;
        self
    }

    pub fn with_transformer(mut self, transformer: ValueTransformer) -> Self {
        self.transformer = Some(transformer);
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn is_required(&self) -> bool {
        self.validators
            .iter()
            .any(|rule| rule.kind == RuleKind::Required)
    }

    /// Placeholder shown by the renderer, falling back to the per-kind default.
    pub fn placeholder_text(&self) -> &str {
        if let Some(placeholder) = self.placeholder.as_deref() {
            return placeholder;
        }
        match self.kind {
            FieldKind::Dropdown(_) | FieldKind::Radio(_) => "Select an option",
            FieldKind::Multiselect(_) => "Select options",
            _ => "",
        }
    }
}
