use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;

use crate::rules::Validator;
use crate::spec::validation::ErrorKey;
use crate::value::FormValue;

/// Validity state of a control or of a whole form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlStatus {
    Valid,
    Invalid,
    /// Asynchronous validators have not settled yet.
    Pending,
    /// Disabled controls are never validated.
    Disabled,
}

/// One failed validator on a control.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlError {
    pub key: ErrorKey,
    pub detail: Value,
}

impl ControlError {
    pub fn new(key: ErrorKey, detail: Value) -> Self {
        Self { key, detail }
    }
}

/// Errors carried by a control, in validator declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationErrors(Vec<ControlError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn first(&self) -> Option<&ControlError> {
        self.0.first()
    }

    pub fn get(&self, key: ErrorKey) -> Option<&ControlError> {
        self.0.iter().find(|error| error.key == key)
    }

    pub fn contains(&self, key: ErrorKey) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = ErrorKey> + '_ {
        self.0.iter().map(|error| error.key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ControlError> {
        self.0.iter()
    }
}

/// Live binding of a single field: current value, validators and interaction state.
#[derive(Debug, Clone)]
pub struct FormControl {
    value: FormValue,
    disabled: bool,
    validators: Vec<Validator>,
    errors: ValidationErrors,
    status: ControlStatus,
    dirty: bool,
    touched: bool,
}

impl FormControl {
    pub fn new(value: FormValue, disabled: bool, validators: Vec<Validator>) -> Self {
        let mut control = Self {
            value,
            disabled,
            validators,
            errors: ValidationErrors::default(),
            status: ControlStatus::Valid,
            dirty: false,
            touched: false,
        };
        control.update_validity();
        control
    }

    pub fn value(&self) -> &FormValue {
        &self.value
    }

    pub fn set_value(&mut self, value: FormValue) {
        self.value = value;
        self.update_validity();
    }

    /// Replaces the value and returns the control to its pristine, untouched state.
    pub fn reset(&mut self, value: FormValue) {
        self.value = value;
        self.dirty = false;
        self.touched = false;
        self.update_validity();
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        self.update_validity();
    }

    pub fn status(&self) -> ControlStatus {
        self.status
    }

    pub fn valid(&self) -> bool {
        self.status == ControlStatus::Valid
    }

    pub fn invalid(&self) -> bool {
        self.status == ControlStatus::Invalid
    }

    pub fn pending(&self) -> bool {
        self.status == ControlStatus::Pending
    }

    pub fn disabled(&self) -> bool {
        self.disabled
    }

    pub fn dirty(&self) -> bool {
        self.dirty
    }

    pub fn touched(&self) -> bool {
        self.touched
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn mark_touched(&mut self) {
        self.touched = true;
    }

    /// Errors of the failing validators. Synchronous failures come first, in
    /// rule order, followed by asynchronous failures in rule order. Empty while
    /// the control is valid, pending or disabled.
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn has_async_validators(&self) -> bool {
        self.validators.iter().any(Validator::is_async)
    }

    fn update_validity(&mut self) {
        if self.disabled {
            self.errors = ValidationErrors::default();
            self.status = ControlStatus::Disabled;
            return;
        }

        let errors: Vec<ControlError> = self
            .validators
            .iter()
            .filter(|validator| !validator.is_async())
            .filter_map(|validator| validator.validate(&self.value))
            .collect();
        self.status = if !errors.is_empty() {
            ControlStatus::Invalid
        } else if self.has_async_validators() {
            ControlStatus::Pending
        } else {
            ControlStatus::Valid
        };
        self.errors = ValidationErrors(errors);
    }

    /// Runs the outstanding asynchronous validators and returns the settled status.
    pub async fn settle(&mut self) -> ControlStatus {
        if self.status != ControlStatus::Pending {
            return self.status;
        }

        let value = self.value.clone();
        let results = join_all(
            self.validators
                .iter()
                .filter(|validator| validator.is_async())
                .map(|validator| validator.validate_async(value.clone())),
        )
        .await;
        self.errors.0.extend(results.into_iter().flatten());
        self.status = if self.errors.is_empty() {
            ControlStatus::Valid
        } else {
            ControlStatus::Invalid
        };
        self.status
    }
}
