//! Two-sided value mapping between what the application holds and what a
//! control holds.
//!
//! The inward function runs once when a control is seeded; the outward
//! function runs once per field when the submit payload is built. Empty values
//! never reach either function.

pub mod common;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::value::FormValue;

/// Failure raised by a transform function.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("expected a {expected} value, got {found}")]
    UnexpectedValue {
        expected: &'static str,
        found: &'static str,
    },
    #[error("{0}")]
    Failed(String),
}

impl TransformError {
    pub fn unexpected(expected: &'static str, found: &FormValue) -> Self {
        TransformError::UnexpectedValue {
            expected,
            found: found.kind_name(),
        }
    }
}

pub type TransformFn = Arc<dyn Fn(FormValue) -> Result<FormValue, TransformError> + Send + Sync>;

/// Pair of pure functions mapping external values in and control values out.
///
/// Either side may be missing; applying a missing side logs a warning and
/// leaves the value untouched.
#[derive(Clone, Default)]
pub struct ValueTransformer {
    name: Option<String>,
    inward: Option<TransformFn>,
    outward: Option<TransformFn>,
}

impl ValueTransformer {
    pub fn new<I, O>(inward: I, outward: O) -> Self
    where
        I: Fn(FormValue) -> Result<FormValue, TransformError> + Send + Sync + 'static,
        O: Fn(FormValue) -> Result<FormValue, TransformError> + Send + Sync + 'static,
    {
        Self {
            name: None,
            inward: Some(Arc::new(inward)),
            outward: Some(Arc::new(outward)),
        }
    }

    pub fn with_inward<I>(mut self, inward: I) -> Self
    where
        I: Fn(FormValue) -> Result<FormValue, TransformError> + Send + Sync + 'static,
    {
        self.inward = Some(Arc::new(inward));
        self
    }

    pub fn with_outward<O>(mut self, outward: O) -> Self
    where
        O: Fn(FormValue) -> Result<FormValue, TransformError> + Send + Sync + 'static,
    {
        self.outward = Some(Arc::new(outward));
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Debug for ValueTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueTransformer")
            .field("name", &self.name)
            .field("inward", &self.inward.is_some())
            .field("outward", &self.outward.is_some())
            .finish()
    }
}

impl PartialEq for ValueTransformer {
    fn eq(&self, other: &Self) -> bool {
        fn same(a: &Option<TransformFn>, b: &Option<TransformFn>) -> bool {
            match (a, b) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            }
        }
        self.name == other.name
            && same(&self.inward, &other.inward)
            && same(&self.outward, &other.outward)
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    In,
    Out,
}

impl Direction {
    fn label(self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

/// Maps an external value to the value a control holds.
pub fn apply_in_transform(
    transformer: Option<&ValueTransformer>,
    value: FormValue,
) -> Result<FormValue, TransformError> {
    apply(transformer, value, Direction::In)
}

/// Maps a raw control value back to the external value.
pub fn apply_out_transform(
    transformer: Option<&ValueTransformer>,
    value: FormValue,
) -> Result<FormValue, TransformError> {
    apply(transformer, value, Direction::Out)
}

fn apply(
    transformer: Option<&ValueTransformer>,
    value: FormValue,
    direction: Direction,
) -> Result<FormValue, TransformError> {
    let Some(transformer) = transformer else {
        return Ok(value);
    };
    if value.is_null() {
        return Ok(value);
    }

    let function = match direction {
        Direction::In => transformer.inward.as_ref(),
        Direction::Out => transformer.outward.as_ref(),
    };
    let Some(function) = function else {
        tracing::warn!(
            transformer = transformer.name().unwrap_or("<anonymous>"),
            direction = direction.label(),
            "invalid transformer: missing \"{}\" function",
            direction.label()
        );
        return Ok(value);
    };

    function(value).inspect_err(|err| {
        tracing::error!(
            transformer = transformer.name().unwrap_or("<anonymous>"),
            direction = direction.label(),
            error = %err,
            "error applying transformer"
        );
    })
}
