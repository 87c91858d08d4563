use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::value::FormValue;

/// Declarative rule types a field can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum RuleKind {
    Required,
    MinLength,
    MaxLength,
    Min,
    Max,
    Email,
    Pattern,
    Custom,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Required => "required",
            RuleKind::MinLength => "minLength",
            RuleKind::MaxLength => "maxLength",
            RuleKind::Min => "min",
            RuleKind::Max => "max",
            RuleKind::Email => "email",
            RuleKind::Pattern => "pattern",
            RuleKind::Custom => "custom",
        }
    }

    /// Error key a control reports when a validator compiled from this rule fails.
    pub fn error_key(&self) -> ErrorKey {
        match self {
            RuleKind::Required => ErrorKey::Required,
            RuleKind::MinLength => ErrorKey::MinLength,
            RuleKind::MaxLength => ErrorKey::MaxLength,
            RuleKind::Min => ErrorKey::Min,
            RuleKind::Max => ErrorKey::Max,
            RuleKind::Email => ErrorKey::Email,
            RuleKind::Pattern => ErrorKey::Pattern,
            RuleKind::Custom => ErrorKey::Custom,
        }
    }
}

/// Key of an error entry carried by a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKey {
    #[serde(rename = "required")]
    Required,
    #[serde(rename = "minlength")]
    MinLength,
    #[serde(rename = "maxlength")]
    MaxLength,
    #[serde(rename = "min")]
    Min,
    #[serde(rename = "max")]
    Max,
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "pattern")]
    Pattern,
    #[serde(rename = "custom")]
    Custom,
}

impl ErrorKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKey::Required => "required",
            ErrorKey::MinLength => "minlength",
            ErrorKey::MaxLength => "maxlength",
            ErrorKey::Min => "min",
            ErrorKey::Max => "max",
            ErrorKey::Email => "email",
            ErrorKey::Pattern => "pattern",
            ErrorKey::Custom => "custom",
        }
    }
}

impl fmt::Display for ErrorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure raised from inside a custom predicate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct PredicateError(pub String);

pub type PredicateResult = Result<bool, PredicateError>;

type SyncPredicateFn = dyn Fn(&FormValue) -> PredicateResult + Send + Sync;
type AsyncPredicateFn = dyn Fn(FormValue) -> BoxFuture<'static, PredicateResult> + Send + Sync;

/// Predicate backing a `custom` rule. Never serialized; attached at runtime.
#[derive(Clone)]
pub enum CustomPredicate {
    Sync(Arc<SyncPredicateFn>),
    Async(Arc<AsyncPredicateFn>),
}

impl CustomPredicate {
    /// Wraps an infallible synchronous predicate.
    pub fn from_fn<F>(predicate: F) -> Self
    where
        F: Fn(&FormValue) -> bool + Send + Sync + 'static,
    {
        CustomPredicate::Sync(Arc::new(move |value| Ok(predicate(value))))
    }

    pub fn fallible<F>(predicate: F) -> Self
    where
        F: Fn(&FormValue) -> PredicateResult + Send + Sync + 'static,
    {
        CustomPredicate::Sync(Arc::new(predicate))
    }

    /// Wraps a predicate that resolves later, e.g. a uniqueness lookup.
    pub fn from_future<F, Fut>(predicate: F) -> Self
    where
        F: Fn(FormValue) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PredicateResult> + Send + 'static,
    {
        CustomPredicate::Async(Arc::new(move |value| predicate(value).boxed()))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, CustomPredicate::Async(_))
    }
}

impl fmt::Debug for CustomPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CustomPredicate::Sync(_) => f.write_str("CustomPredicate::Sync(..)"),
            CustomPredicate::Async(_) => f.write_str("CustomPredicate::Async(..)"),
        }
    }
}

impl PartialEq for CustomPredicate {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CustomPredicate::Sync(a), CustomPredicate::Sync(b)) => Arc::ptr_eq(a, b),
            (CustomPredicate::Async(a), CustomPredicate::Async(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// A declarative constraint attached to a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationRule {
    #[serde(rename = "type")]
    pub kind: RuleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    pub message: String,
    #[serde(skip)]
    pub validator: Option<CustomPredicate>,
}

impl ValidationRule {
    fn with_value(kind: RuleKind, value: Option<Value>, message: impl Into<String>) -> Self {
        Self {
            kind,
            value,
            message: message.into(),
            validator: None,
        }
    }

    pub fn required(message: impl Into<String>) -> Self {
        Self::with_value(RuleKind::Required, None, message)
    }

    pub fn min_length(length: usize, message: impl Into<String>) -> Self {
        Self::with_value(RuleKind::MinLength, Some(Value::from(length)), message)
    }

    pub fn max_length(length: usize, message: impl Into<String>) -> Self {
        Self::with_value(RuleKind::MaxLength, Some(Value::from(length)), message)
    }

    pub fn min(bound: f64, message: impl Into<String>) -> Self {
        Self::with_value(RuleKind::Min, Some(Value::from(bound)), message)
    }

    pub fn max(bound: f64, message: impl Into<String>) -> Self {
        Self::with_value(RuleKind::Max, Some(Value::from(bound)), message)
    }

    pub fn email(message: impl Into<String>) -> Self {
        Self::with_value(RuleKind::Email, None, message)
    }

    pub fn pattern(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_value(
            RuleKind::Pattern,
            Some(Value::String(source.into())),
            message,
        )
    }

    pub fn custom(predicate: CustomPredicate, message: impl Into<String>) -> Self {
        Self {
            validator: Some(predicate),
            ..Self::with_value(RuleKind::Custom, None, message)
        }
    }
}
