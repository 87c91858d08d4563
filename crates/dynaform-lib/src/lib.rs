use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use dynaform_spec::{
    ControlStatus, CustomPredicate, FieldConfig, FormConfig, FormData, FormEvent, FormSession,
    FormValue, NativeValueKind, RuleKind, SubmitOutcome, ValueTransformer, build_render_payload,
    common, form_data_from_json, form_data_to_json, parse_date, render_json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub use dynaform_spec::FormError;

#[derive(Debug, Error)]
pub enum FormLibError {
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Form(#[from] FormError),
    #[error("invalid patch: {0}")]
    InvalidPatch(String),
    #[error("unknown transformer '{0}' (expected scale:<factor>, date-iso, date-epoch or fixed:<decimals>)")]
    UnknownTransformer(String),
    #[error("field '{field}' uses custom predicate '{name}' which is not bound")]
    UnknownPredicate { field: String, name: String },
    #[error("transformer bound to unknown field '{0}'")]
    UnboundField(String),
    #[error("form is invalid: {}", describe_errors(.0))]
    Invalid(BTreeMap<String, String>),
}

fn describe_errors(errors: &BTreeMap<String, String>) -> String {
    errors
        .iter()
        .map(|(key, message)| format!("{key}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Textual names of the reference transformers, as accepted on the command line.
#[derive(Clone, Debug, PartialEq)]
pub enum TransformerSpec {
    Scale(f64),
    DateIso,
    DateEpoch,
    Fixed(usize),
}

impl TransformerSpec {
    pub fn build(&self) -> ValueTransformer {
        match self {
            TransformerSpec::Scale(factor) => common::number_scale(*factor),
            TransformerSpec::DateIso => common::date_string(),
            TransformerSpec::DateEpoch => common::date_timestamp(),
            TransformerSpec::Fixed(decimals) => common::number_format(*decimals),
        }
    }
}

impl FromStr for TransformerSpec {
    type Err = FormLibError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let unknown = || FormLibError::UnknownTransformer(raw.to_string());
        let (name, argument) = match raw.trim().split_once(':') {
            Some((name, argument)) => (name, Some(argument.trim())),
            None => (raw.trim(), None),
        };
        match (name, argument) {
            ("scale", Some(factor)) => factor
                .parse::<f64>()
                .ok()
                .filter(|factor| factor.is_finite() && *factor != 0.0)
                .map(TransformerSpec::Scale)
                .ok_or_else(unknown),
            ("fixed", Some(decimals)) => decimals
                .parse::<usize>()
                .ok()
                .filter(|decimals| *decimals <= common::MAX_FIXED_DECIMALS)
                .map(TransformerSpec::Fixed)
                .ok_or_else(unknown),
            ("date-iso", None) => Ok(TransformerSpec::DateIso),
            ("date-epoch", None) => Ok(TransformerSpec::DateEpoch),
            _ => Err(unknown()),
        }
    }
}

impl fmt::Display for TransformerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformerSpec::Scale(factor) => write!(f, "scale:{factor}"),
            TransformerSpec::DateIso => f.write_str("date-iso"),
            TransformerSpec::DateEpoch => f.write_str("date-epoch"),
            TransformerSpec::Fixed(decimals) => write!(f, "fixed:{decimals}"),
        }
    }
}

/// Function-valued pieces of a form that cannot travel inside its JSON.
#[derive(Clone, Debug, Default)]
pub struct RuntimeBindings {
    transformers: BTreeMap<String, ValueTransformer>,
    predicates: BTreeMap<String, CustomPredicate>,
    strict: bool,
}

impl RuntimeBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transformer(
        mut self,
        field: impl Into<String>,
        transformer: ValueTransformer,
    ) -> Self {
        self.transformers.insert(field.into(), transformer);
        self
    }

    pub fn with_predicate(mut self, name: impl Into<String>, predicate: CustomPredicate) -> Self {
        self.predicates.insert(name.into(), predicate);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty() && self.predicates.is_empty()
    }

    /// Makes [`RuntimeBindings::bind`] fail on custom rules whose predicate is
    /// not bound, instead of leaving them for the rule compiler to skip.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Attaches transformers by field key and resolves custom rules whose
    /// predicate is named by the rule's `value`.
    pub fn bind(&self, config: &mut FormConfig) -> Result<(), FormLibError> {
        for (key, transformer) in &self.transformers {
            let field = config
                .field_mut(key)
                .ok_or_else(|| FormLibError::UnboundField(key.clone()))?;
            field.transformer = Some(transformer.clone());
        }

        for field in &mut config.fields {
            for rule in &mut field.validators {
                if rule.kind != RuleKind::Custom || rule.validator.is_some() {
                    continue;
                }
                let name = rule.value.as_ref().and_then(Value::as_str).unwrap_or_default();
                match self.predicates.get(name) {
                    Some(predicate) => rule.validator = Some(predicate.clone()),
                    None if self.strict => {
                        return Err(FormLibError::UnknownPredicate {
                            field: field.key.clone(),
                            name: name.to_string(),
                        });
                    }
                    None => {
                        tracing::warn!(
                            field = %field.key,
                            predicate = name,
                            "custom predicate is not bound"
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct FormRunConfig {
    pub config_json: String,
    pub initial_data_json: Option<String>,
    pub bindings: RuntimeBindings,
}

impl FormRunConfig {
    pub fn new(config_json: impl Into<String>) -> Self {
        Self {
            config_json: config_json.into(),
            initial_data_json: None,
            bindings: RuntimeBindings::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FormRunResult {
    pub output: FormData,
    pub output_json: String,
}

/// Status plus JSON body returned by the driver after a patch or a submit.
#[derive(Clone, Debug)]
pub struct DriverResponse {
    pub status: String,
    pub response_json: String,
}

#[derive(Serialize)]
struct ResponseBody<'a> {
    status: &'a str,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    errors: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    form_error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<Value>,
}

/// Drives one form session through JSON strings.
pub struct FormDriver {
    session: FormSession,
}

impl FormDriver {
    pub fn new(config: FormRunConfig) -> Result<Self, FormLibError> {
        let mut form: FormConfig = serde_json::from_str(&config.config_json)?;
        config.bindings.bind(&mut form)?;

        let initial = match config.initial_data_json.as_deref() {
            Some(raw) => {
                let parsed: Value = serde_json::from_str(raw)?;
                let mut data = form_data_from_json(parsed);
                for (key, value) in data.iter_mut() {
                    if let Some(field) = form.field(key) {
                        *value = coerce_native(field, std::mem::take(value))?;
                    }
                }
                Some(data)
            }
            None => None,
        };

        let session = FormSession::with_config(form, initial.as_ref())?;
        tracing::debug!(form = %session.config().id, "driver ready");
        Ok(Self { session })
    }

    pub fn session(&self) -> &FormSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut FormSession {
        &mut self.session
    }

    pub fn render_json(&self) -> Result<String, FormLibError> {
        let payload = build_render_payload(&self.session);
        Ok(serde_json::to_string(&render_json(&payload))?)
    }

    /// Applies a `field key -> value` object as renderer edits, in key order.
    /// Every entry is checked first, so a rejected patch leaves the session untouched.
    pub fn apply_patch_json(&mut self, patch_json: &str) -> Result<DriverResponse, FormLibError> {
        let patch: Value = serde_json::from_str(patch_json)?;
        let Value::Object(entries) = patch else {
            return Err(FormLibError::InvalidPatch(
                "patch_json must be a JSON object map of field key -> value".into(),
            ));
        };

        let edits = entries
            .into_iter()
            .map(|(key, raw)| {
                let field = self
                    .session
                    .field(&key)
                    .ok_or_else(|| FormError::UnknownField(key.clone()))?;
                let value = coerce_native(field, FormValue::from(raw))?;
                self.session.check_value(&key, &value)?;
                Ok::<_, FormLibError>((key, value))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (key, value) in edits {
            self.session.on_field_value_change(&key, value)?;
            self.session.on_field_blur(&key)?;
        }

        let status = status_label(self.session.form_status());
        self.respond(status, None)
    }

    pub fn submit_json(&mut self) -> Result<DriverResponse, FormLibError> {
        let outcome = self.session.on_submit()?;
        self.respond_to(outcome)
    }

    /// Settles asynchronous validators before submitting.
    pub async fn submit_settled_json(&mut self) -> Result<DriverResponse, FormLibError> {
        let outcome = self.session.submit_settled().await?;
        self.respond_to(outcome)
    }

    pub fn reset(&mut self) {
        self.session.reset_form();
    }

    pub fn cancel(&mut self) {
        self.session.cancel();
    }

    pub fn drain_events(&mut self) -> Vec<FormEvent> {
        self.session.drain_events()
    }

    /// Messages of every invalid control, keyed by field.
    pub fn field_errors(&self) -> BTreeMap<String, String> {
        field_errors(&self.session)
    }

    fn respond_to(&self, outcome: SubmitOutcome) -> Result<DriverResponse, FormLibError> {
        match outcome {
            SubmitOutcome::Submitted(output) => {
                self.respond("submitted", Some(form_data_to_json(&output)))
            }
            SubmitOutcome::Invalid => self.respond("invalid", None),
            SubmitOutcome::Pending => self.respond("pending", None),
        }
    }

    fn respond(&self, status: &str, output: Option<Value>) -> Result<DriverResponse, FormLibError> {
        let form_error = Some(self.session.form_error()).filter(|error| !error.is_empty());
        let body = ResponseBody {
            status,
            errors: self.field_errors(),
            form_error,
            output,
        };
        Ok(DriverResponse {
            status: status.to_string(),
            response_json: serde_json::to_string(&body)?,
        })
    }
}

pub struct FormRunner;

impl FormRunner {
    /// Applies an optional patch and submits, waiting for async validators.
    pub fn run(
        config: FormRunConfig,
        patch_json: Option<&str>,
    ) -> Result<FormRunResult, FormLibError> {
        let mut driver = FormDriver::new(config)?;
        if let Some(patch) = patch_json {
            driver.apply_patch_json(patch)?;
        }

        match futures::executor::block_on(driver.session.submit_settled())? {
            SubmitOutcome::Submitted(output) => {
                let output_json = serde_json::to_string(&form_data_to_json(&output))?;
                Ok(FormRunResult { output, output_json })
            }
            SubmitOutcome::Invalid | SubmitOutcome::Pending => {
                Err(FormLibError::Invalid(driver.field_errors()))
            }
        }
    }
}

fn status_label(status: ControlStatus) -> &'static str {
    match status {
        ControlStatus::Invalid => "invalid",
        ControlStatus::Pending => "pending",
        ControlStatus::Disabled => "disabled",
        ControlStatus::Valid => "valid",
    }
}

fn field_errors(session: &FormSession) -> BTreeMap<String, String> {
    session
        .controls()
        .filter(|(_, control)| control.invalid())
        .filter_map(|(key, _)| {
            session
                .error_message(key)
                .map(|message| (key.to_string(), message))
        })
        .collect()
}

// JSON carries dates as strings; date fields without a transformer want real dates.
fn coerce_native(field: &FieldConfig, value: FormValue) -> Result<FormValue, FormLibError> {
    if field.transformer.is_some() || field.kind.native_value_kind() != NativeValueKind::Date {
        return Ok(value);
    }
    match value {
        FormValue::Text(text) if text.is_empty() => Ok(FormValue::Null),
        FormValue::Text(text) => parse_date(&text).map(FormValue::Date).ok_or_else(|| {
            FormLibError::InvalidPatch(format!("field '{}' expects a date, got '{text}'", field.key))
        }),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_transformer_specs() {
        assert_eq!("scale:100".parse::<TransformerSpec>().unwrap(), TransformerSpec::Scale(100.0));
        assert_eq!("fixed:2".parse::<TransformerSpec>().unwrap(), TransformerSpec::Fixed(2));
        assert_eq!("date-iso".parse::<TransformerSpec>().unwrap(), TransformerSpec::DateIso);
        assert_eq!(
            " date-epoch ".parse::<TransformerSpec>().unwrap(),
            TransformerSpec::DateEpoch
        );
        assert!("scale:0".parse::<TransformerSpec>().is_err());
        assert!("scale".parse::<TransformerSpec>().is_err());
        assert!("fixed:-1".parse::<TransformerSpec>().is_err());
        assert_eq!("fixed:100".parse::<TransformerSpec>().unwrap(), TransformerSpec::Fixed(100));
        assert!("fixed:101".parse::<TransformerSpec>().is_err());
        assert!("fixed:1000000000".parse::<TransformerSpec>().is_err());
        assert!("date-iso:1".parse::<TransformerSpec>().is_err());
        assert!("rot13".parse::<TransformerSpec>().is_err());
    }

    #[test]
    fn transformer_spec_display_round_trips() {
        for raw in ["scale:0.5", "fixed:3", "date-iso", "date-epoch"] {
            let spec: TransformerSpec = raw.parse().unwrap();
            assert_eq!(spec.to_string(), raw);
        }
    }
}
