use std::collections::BTreeMap;

use futures::future::join_all;
use thiserror::Error;

use crate::control::{ControlStatus, FormControl};
use crate::rules::{compile_all, resolve_error_message};
use crate::spec::field::FieldConfig;
use crate::spec::form::FormConfig;
use crate::transform::{TransformError, apply_in_transform, apply_out_transform};
use crate::value::{FormData, FormValue};

/// Banner shown when a submit is rejected by validation.
pub const FORM_ERROR_MESSAGE: &str = "Please correct the errors before submitting.";

#[derive(Debug, Error)]
pub enum FormError {
    #[error("duplicate field key '{0}'")]
    DuplicateKey(String),
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("field '{key}' expects a {expected} value, got {found}")]
    ValueKindMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("transform failed for field '{key}': {source}")]
    Transform {
        key: String,
        #[source]
        source: TransformError,
    },
}

/// Notifications for the embedding application, drained with [`FormSession::drain_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    Valid(bool),
    Value(FormData),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Output payload with every transformer applied.
    Submitted(FormData),
    /// At least one control failed validation; nothing was produced.
    Invalid,
    /// Asynchronous validation has not settled; nothing was produced.
    Pending,
}

/// State of one active form edit: configuration, one control per field and
/// the submit lifecycle flags.
#[derive(Debug, Default)]
pub struct FormSession {
    config: FormConfig,
    controls: BTreeMap<String, FormControl>,
    initial_values: FormData,
    submitted: bool,
    submitting: bool,
    form_error: String,
    events: Vec<FormEvent>,
}

impl FormSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a session and initialises it in one go.
    pub fn with_config(
        config: FormConfig,
        initial_data: Option<&FormData>,
    ) -> Result<Self, FormError> {
        let mut session = Self::new();
        session.init_form(config, initial_data)?;
        Ok(session)
    }

    /// Replaces the current form with `config`.
    ///
    /// Initial values resolve as `initial_data[key]`, then the field default,
    /// then null, and pass through the field's inward transform. On error the
    /// previous form is kept as it was.
    pub fn init_form(
        &mut self,
        config: FormConfig,
        initial_data: Option<&FormData>,
    ) -> Result<(), FormError> {
        let mut controls = BTreeMap::new();
        let mut initial_values = FormData::new();

        for field in &config.fields {
            if controls.contains_key(&field.key) {
                return Err(FormError::DuplicateKey(field.key.clone()));
            }

            let seed = initial_data
                .and_then(|data| data.get(&field.key))
                .cloned()
                .or_else(|| field.default_value.clone())
                .unwrap_or(FormValue::Null);
            let seed = apply_in_transform(field.transformer.as_ref(), seed).map_err(|source| {
                FormError::Transform {
                    key: field.key.clone(),
                    source,
                }
            })?;

            let validators = compile_all(&field.validators);
            controls.insert(
                field.key.clone(),
                FormControl::new(seed.clone(), field.disabled, validators),
            );
            initial_values.insert(field.key.clone(), seed);
        }

        tracing::debug!(form = %config.id, fields = controls.len(), "form initialised");
        self.config = config;
        self.controls = controls;
        self.initial_values = initial_values;
        self.submitted = false;
        self.submitting = false;
        self.form_error.clear();
        Ok(())
    }

    /// Restores the values captured by the last [`FormSession::init_form`].
    pub fn reset_form(&mut self) {
        for (key, control) in self.controls.iter_mut() {
            let value = self.initial_values.get(key).cloned().unwrap_or_default();
            control.reset(value);
        }
        self.submitted = false;
        self.form_error.clear();
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub fn field(&self, key: &str) -> Option<&FieldConfig> {
        self.config.field(key)
    }

    /// Fields without `hidden`, in declaration order.
    pub fn visible_fields(&self) -> impl Iterator<Item = &FieldConfig> {
        self.config.fields.iter().filter(|field| !field.hidden)
    }

    pub fn control(&self, key: &str) -> Option<&FormControl> {
        self.controls.get(key)
    }

    /// Controls in field declaration order.
    pub fn controls(&self) -> impl Iterator<Item = (&str, &FormControl)> {
        self.config.fields.iter().filter_map(|field| {
            self.controls
                .get(&field.key)
                .map(|control| (field.key.as_str(), control))
        })
    }

    pub fn control_count(&self) -> usize {
        self.controls.len()
    }

    pub fn initial_values(&self) -> &FormData {
        &self.initial_values
    }

    pub fn submitted(&self) -> bool {
        self.submitted
    }

    pub fn submitting(&self) -> bool {
        self.submitting
    }

    pub fn form_error(&self) -> &str {
        &self.form_error
    }

    /// Checks that `value` could be applied to `key` without changing anything.
    pub fn check_value(&self, key: &str, value: &FormValue) -> Result<(), FormError> {
        let field = self
            .config
            .field(key)
            .ok_or_else(|| FormError::UnknownField(key.to_string()))?;
        let expected = field.kind.native_value_kind();
        if field.transformer.is_none() && !expected.accepts(value) {
            return Err(FormError::ValueKindMismatch {
                key: key.to_string(),
                expected: expected.as_str(),
                found: value.kind_name(),
            });
        }
        Ok(())
    }

    /// Raw edit coming from a renderer. The value must be of the field's native kind
    /// unless a transformer defines the control representation.
    pub fn on_field_value_change(&mut self, key: &str, value: FormValue) -> Result<(), FormError> {
        self.check_value(key, &value)?;

        let control = self
            .controls
            .get_mut(key)
            .ok_or_else(|| FormError::UnknownField(key.to_string()))?;
        control.set_value(value);
        control.mark_dirty();
        Ok(())
    }

    pub fn on_field_blur(&mut self, key: &str) -> Result<(), FormError> {
        self.controls
            .get_mut(key)
            .ok_or_else(|| FormError::UnknownField(key.to_string()))?
            .mark_touched();
        Ok(())
    }

    /// Aggregate status: any invalid control wins over pending ones. Disabled
    /// controls are ignored, unless every control is disabled, in which case the
    /// form is `Disabled` (not valid, but still submittable).
    pub fn form_status(&self) -> ControlStatus {
        let statuses = || self.controls.values().map(FormControl::status);
        if statuses().any(|status| status == ControlStatus::Invalid) {
            ControlStatus::Invalid
        } else if statuses().any(|status| status == ControlStatus::Pending) {
            ControlStatus::Pending
        } else if !self.controls.is_empty()
            && statuses().all(|status| status == ControlStatus::Disabled)
        {
            ControlStatus::Disabled
        } else {
            ControlStatus::Valid
        }
    }

    pub fn form_valid(&self) -> bool {
        self.form_status() == ControlStatus::Valid
    }

    /// Message of the first failing rule of a field, empty when it has no errors.
    pub fn error_message(&self, key: &str) -> Option<String> {
        let field = self.config.field(key)?;
        let control = self.controls.get(key)?;
        Some(resolve_error_message(control, &field.validators))
    }

    pub fn should_show_error(&self, key: &str) -> bool {
        self.controls.get(key).is_some_and(|control| {
            control.invalid() && (control.dirty() || control.touched() || self.submitted)
        })
    }

    /// Raw control values, disabled controls included.
    pub fn raw_values(&self) -> FormData {
        self.controls
            .iter()
            .map(|(key, control)| (key.clone(), control.value().clone()))
            .collect()
    }

    fn transform_output_values(&self, values: FormData) -> Result<FormData, FormError> {
        values
            .into_iter()
            .map(|(key, value)| {
                let transformer = self
                    .config
                    .field(&key)
                    .and_then(|field| field.transformer.as_ref());
                match apply_out_transform(transformer, value) {
                    Ok(value) => Ok((key, value)),
                    Err(source) => Err(FormError::Transform { key, source }),
                }
            })
            .collect()
    }

    /// Validates the form and, when every control is valid, builds the output payload.
    pub fn on_submit(&mut self) -> Result<SubmitOutcome, FormError> {
        self.submitted = true;
        let status = self.form_status();
        self.events.push(FormEvent::Valid(status == ControlStatus::Valid));

        match status {
            ControlStatus::Invalid => {
                for control in self.controls.values_mut() {
                    control.mark_dirty();
                    control.mark_touched();
                }
                self.form_error = FORM_ERROR_MESSAGE.to_string();
                tracing::debug!(form = %self.config.id, "submit rejected by validation");
                Ok(SubmitOutcome::Invalid)
            }
            ControlStatus::Pending => {
                tracing::debug!(form = %self.config.id, "submit while validation is pending");
                Ok(SubmitOutcome::Pending)
            }
            ControlStatus::Valid | ControlStatus::Disabled => {
                let output = self.transform_output_values(self.raw_values())?;
                self.submitting = true;
                self.events.push(FormEvent::Value(output.clone()));
                tracing::debug!(form = %self.config.id, fields = output.len(), "form submitted");
                Ok(SubmitOutcome::Submitted(output))
            }
        }
    }

    /// Settles every pending asynchronous validator.
    pub async fn settle(&mut self) -> ControlStatus {
        join_all(self.controls.values_mut().map(|control| control.settle())).await;
        self.form_status()
    }

    pub async fn submit_settled(&mut self) -> Result<SubmitOutcome, FormError> {
        self.settle().await;
        self.on_submit()
    }

    /// Called by the embedder once its own submit handling is over.
    pub fn finish_submit(&mut self) {
        self.submitting = false;
    }

    pub fn cancel(&mut self) {
        tracing::info!(form = %self.config.id, "form cancelled");
        self.events.push(FormEvent::Cancelled);
    }

    pub fn drain_events(&mut self) -> Vec<FormEvent> {
        std::mem::take(&mut self.events)
    }
}
