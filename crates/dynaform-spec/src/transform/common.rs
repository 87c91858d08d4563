//! Reference transformers for common conversions.

use time::OffsetDateTime;

use crate::transform::{TransformError, ValueTransformer};
use crate::value::{FormValue, parse_date, to_iso_string};

fn expect_number(value: &FormValue) -> Result<f64, TransformError> {
    value
        .as_f64()
        .ok_or_else(|| TransformError::unexpected("number", value))
}

fn date_from_input(value: &FormValue) -> Result<Option<OffsetDateTime>, TransformError> {
    match value {
        FormValue::Date(date) => Ok(Some(*date)),
        FormValue::Text(text) => Ok(parse_date(text)),
        other => Err(TransformError::unexpected("date", other)),
    }
}

fn epoch_millis(date: OffsetDateTime) -> f64 {
    date.unix_timestamp_nanos().div_euclid(1_000_000) as f64
}

/// Divides by `factor` on the way in and multiplies on the way out.
pub fn number_scale(factor: f64) -> ValueTransformer {
    ValueTransformer::new(
        move |value| {
            let number = expect_number(&value)?;
            if factor == 0.0 {
                return Err(TransformError::Failed(
                    "scale factor must not be zero".into(),
                ));
            }
            Ok(FormValue::Number(number / factor))
        },
        move |value| Ok(FormValue::Number(expect_number(&value)? * factor)),
    )
    .named(format!("number_scale({factor})"))
}

/// Dates become ISO strings inside the control. Unparseable input maps to null.
pub fn date_string() -> ValueTransformer {
    ValueTransformer::new(
        |value| {
            Ok(date_from_input(&value)?
                .map(|date| FormValue::Text(to_iso_string(date)))
                .unwrap_or(FormValue::Null))
        },
        |value| match value {
            FormValue::Text(text) => Ok(parse_date(&text)
                .map(FormValue::Date)
                .unwrap_or(FormValue::Null)),
            FormValue::Date(date) => Ok(FormValue::Date(date)),
            other => Err(TransformError::unexpected("text", &other)),
        },
    )
    .named("date_string")
}

/// Dates become epoch milliseconds inside the control.
pub fn date_timestamp() -> ValueTransformer {
    ValueTransformer::new(
        |value| {
            Ok(date_from_input(&value)?
                .map(|date| FormValue::Number(epoch_millis(date)))
                .unwrap_or(FormValue::Null))
        },
        |value| {
            let millis = expect_number(&value)?;
            if !millis.is_finite() {
                return Ok(FormValue::Null);
            }
            Ok((millis.trunc() as i128)
                .checked_mul(1_000_000)
                .and_then(|nanos| OffsetDateTime::from_unix_timestamp_nanos(nanos).ok())
                .map(FormValue::Date)
                .unwrap_or(FormValue::Null))
        },
    )
    .named("date_timestamp")
}

/// Largest precision accepted by [`number_format`].
pub const MAX_FIXED_DECIMALS: usize = 100;

/// Numbers become fixed-decimal strings inside the control. Precision is
/// clamped to [`MAX_FIXED_DECIMALS`].
pub fn number_format(decimals: usize) -> ValueTransformer {
    if decimals > MAX_FIXED_DECIMALS {
        tracing::warn!(decimals, max = MAX_FIXED_DECIMALS, "clamping number_format precision");
    }
    let decimals = decimals.min(MAX_FIXED_DECIMALS);
    ValueTransformer::new(
        move |value| {
            let number = expect_number(&value)?;
            Ok(FormValue::Text(format!("{number:.decimals$}")))
        },
        |value| match value {
            FormValue::Text(text) => Ok(text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|number| number.is_finite())
                .map(FormValue::Number)
                .unwrap_or(FormValue::Null)),
            FormValue::Number(number) => Ok(FormValue::Number(number)),
            other => Err(TransformError::unexpected("text", &other)),
        },
    )
    .named(format!("number_format({decimals})"))
}
