use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Value, json};
use thiserror::Error;

use crate::control::{ControlError, FormControl};
use crate::spec::validation::{
    CustomPredicate, ErrorKey, PredicateResult, RuleKind, ValidationRule,
};
use crate::value::FormValue;

/// Message returned when a control error has no matching rule.
pub const FALLBACK_ERROR_MESSAGE: &str = "Invalid value";

// Local part and domain labels, without the length lookaheads (checked separately).
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-zA-Z0-9!#$%&'*+/=?^_`{|}~-]+)*@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email regex compiles")
});

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule '{kind}' requires a value")]
    MissingValue { kind: &'static str },
    #[error("rule '{kind}' has an invalid value: {reason}")]
    InvalidValue { kind: &'static str, reason: String },
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("custom rule has no validator attached")]
    MissingPredicate,
}

/// Executable form of a [`ValidationRule`].
#[derive(Debug, Clone)]
pub enum Validator {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Min(f64),
    Max(f64),
    Email,
    Pattern { source: String, regex: Regex },
    Custom {
        predicate: CustomPredicate,
        message: String,
    },
}

impl Validator {
    pub fn error_key(&self) -> ErrorKey {
        match self {
            Validator::Required => ErrorKey::Required,
            Validator::MinLength(_) => ErrorKey::MinLength,
            Validator::MaxLength(_) => ErrorKey::MaxLength,
            Validator::Min(_) => ErrorKey::Min,
            Validator::Max(_) => ErrorKey::Max,
            Validator::Email => ErrorKey::Email,
            Validator::Pattern { .. } => ErrorKey::Pattern,
            Validator::Custom { .. } => ErrorKey::Custom,
        }
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Validator::Custom { predicate, .. } if predicate.is_async())
    }

    /// Runs a synchronous check. Asynchronous validators always pass here;
    /// use [`Validator::validate_async`] for them.
    pub fn validate(&self, value: &FormValue) -> Option<ControlError> {
        match self {
            Validator::Required => value
                .is_empty_input()
                .then(|| ControlError::new(ErrorKey::Required, Value::Bool(true))),
            Validator::MinLength(required) => {
                let actual = non_empty(value)?.input_len()?;
                (actual < *required).then(|| {
                    ControlError::new(
                        ErrorKey::MinLength,
                        json!({ "requiredLength": required, "actualLength": actual }),
                    )
                })
            }
            Validator::MaxLength(required) => {
                let actual = non_empty(value)?.input_len()?;
                (actual > *required).then(|| {
                    ControlError::new(
                        ErrorKey::MaxLength,
                        json!({ "requiredLength": required, "actualLength": actual }),
                    )
                })
            }
            Validator::Min(min) => {
                let actual = numeric_input(value)?;
                (actual < *min).then(|| {
                    ControlError::new(ErrorKey::Min, json!({ "min": min, "actual": actual }))
                })
            }
            Validator::Max(max) => {
                let actual = numeric_input(value)?;
                (actual > *max).then(|| {
                    ControlError::new(ErrorKey::Max, json!({ "max": max, "actual": actual }))
                })
            }
            Validator::Email => {
                let text = non_empty(value)?.to_string();
                (!is_email(&text)).then(|| ControlError::new(ErrorKey::Email, Value::Bool(true)))
            }
            Validator::Pattern { source, regex } => {
                let text = non_empty(value)?.to_string();
                (!regex.is_match(&text)).then(|| {
                    ControlError::new(
                        ErrorKey::Pattern,
                        json!({ "requiredPattern": source, "actualValue": text }),
                    )
                })
            }
            Validator::Custom { predicate, message } => match predicate {
                CustomPredicate::Sync(check) => custom_outcome(check(value), message),
                CustomPredicate::Async(_) => None,
            },
        }
    }

    /// Runs an asynchronous check; synchronous validators delegate to [`Validator::validate`].
    pub async fn validate_async(&self, value: FormValue) -> Option<ControlError> {
        match self {
            Validator::Custom {
                predicate: CustomPredicate::Async(check),
                message,
            } => custom_outcome(check(value).await, message),
            other => other.validate(&value),
        }
    }
}

fn non_empty(value: &FormValue) -> Option<&FormValue> {
    (!value.is_empty_input()).then_some(value)
}

fn numeric_input(value: &FormValue) -> Option<f64> {
    let number = match non_empty(value)? {
        FormValue::Number(number) => *number,
        FormValue::Text(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (!number.is_nan()).then_some(number)
}

fn is_email(text: &str) -> bool {
    let Some((local, _)) = text.split_once('@') else {
        return false;
    };
    text.len() <= 254 && !local.is_empty() && local.len() <= 64 && EMAIL_RE.is_match(text)
}

// A predicate that errors counts as a failed validation, not a fatal one.
fn custom_outcome(result: PredicateResult, message: &str) -> Option<ControlError> {
    match result {
        Ok(true) => None,
        Ok(false) => Some(ControlError::new(ErrorKey::Custom, Value::from(message))),
        Err(err) => {
            tracing::warn!(error = %err, "custom validator failed; treating value as invalid");
            Some(ControlError::new(ErrorKey::Custom, Value::from(message)))
        }
    }
}

fn length_parameter(rule: &ValidationRule) -> Result<usize, RuleError> {
    let kind = rule.kind.as_str();
    let value = rule
        .value
        .as_ref()
        .ok_or(RuleError::MissingValue { kind })?;
    numeric_parameter(value)
        .filter(|number| *number >= 0.0 && number.fract() == 0.0)
        .map(|number| number as usize)
        .ok_or_else(|| RuleError::InvalidValue {
            kind,
            reason: format!("expected a non-negative integer, got {value}"),
        })
}

fn bound_parameter(rule: &ValidationRule) -> Result<f64, RuleError> {
    let kind = rule.kind.as_str();
    let value = rule
        .value
        .as_ref()
        .ok_or(RuleError::MissingValue { kind })?;
    numeric_parameter(value)
        .filter(|number| !number.is_nan())
        .ok_or_else(|| RuleError::InvalidValue {
            kind,
            reason: format!("expected a number, got {value}"),
        })
}

fn numeric_parameter(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn anchored(pattern: &str) -> String {
    let mut anchored = String::with_capacity(pattern.len() + 2);
    if !pattern.starts_with('^') {
        anchored.push('^');
    }
    anchored.push_str(pattern);
    if !pattern.ends_with('$') {
        anchored.push('$');
    }
    anchored
}

/// Translates a declarative rule into an executable validator.
pub fn compile(rule: &ValidationRule) -> Result<Validator, RuleError> {
    match rule.kind {
        RuleKind::Required => Ok(Validator::Required),
        RuleKind::MinLength => Ok(Validator::MinLength(length_parameter(rule)?)),
        RuleKind::MaxLength => Ok(Validator::MaxLength(length_parameter(rule)?)),
        RuleKind::Min => Ok(Validator::Min(bound_parameter(rule)?)),
        RuleKind::Max => Ok(Validator::Max(bound_parameter(rule)?)),
        RuleKind::Email => Ok(Validator::Email),
        RuleKind::Pattern => {
            let source = match &rule.value {
                Some(Value::String(source)) => anchored(source),
                Some(other) => {
                    return Err(RuleError::InvalidValue {
                        kind: rule.kind.as_str(),
                        reason: format!("expected a pattern string, got {other}"),
                    });
                }
                None => {
                    return Err(RuleError::MissingValue {
                        kind: rule.kind.as_str(),
                    });
                }
            };
            let regex = Regex::new(&source)?;
            Ok(Validator::Pattern { source, regex })
        }
        RuleKind::Custom => {
            let predicate = rule.validator.clone().ok_or(RuleError::MissingPredicate)?;
            Ok(Validator::Custom {
                predicate,
                message: rule.message.clone(),
            })
        }
    }
}

/// Compiles every rule in order, skipping (and logging) rules that do not compile.
pub fn compile_all(rules: &[ValidationRule]) -> Vec<Validator> {
    rules
        .iter()
        .filter_map(|rule| match compile(rule) {
            Ok(validator) => Some(validator),
            Err(err) => {
                tracing::warn!(rule = rule.kind.as_str(), error = %err, "skipping validation rule");
                None
            }
        })
        .collect()
}

/// Picks the message of the rule behind the control's first error.
///
/// The first error is the one produced by the earliest failing rule in
/// declaration order (see [`FormControl::errors`]). Returns an empty string
/// for a control without errors.
pub fn resolve_error_message(control: &FormControl, rules: &[ValidationRule]) -> String {
    let Some(first) = control.errors().first() else {
        return String::new();
    };
    rules
        .iter()
        .find(|rule| rule.kind.error_key() == first.key)
        .map(|rule| rule.message.clone())
        .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string())
}
