use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Values keyed by field key, used for initial data and submit output.
pub type FormData = BTreeMap<String, FormValue>;

/// A field value, either as the application sees it or as a control holds it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FormValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(OffsetDateTime),
    List(Vec<FormValue>),
    Map(BTreeMap<String, FormValue>),
}

impl FormValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FormValue::Null)
    }

    /// Emptiness as the `required` rule sees it: null, empty text or an empty list.
    pub fn is_empty_input(&self) -> bool {
        match self {
            FormValue::Null => true,
            FormValue::Text(text) => text.is_empty(),
            FormValue::List(items) => items.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FormValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FormValue::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FormValue::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<OffsetDateTime> {
        match self {
            FormValue::Date(date) => Some(*date),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FormValue]> {
        match self {
            FormValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Length used by the length rules; only text and lists have one.
    pub fn input_len(&self) -> Option<usize> {
        match self {
            FormValue::Text(text) => Some(text.chars().count()),
            FormValue::List(items) => Some(items.len()),
            _ => None,
        }
    }

    /// Short label of the variant, used in error messages and logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FormValue::Null => "null",
            FormValue::Bool(_) => "bool",
            FormValue::Number(_) => "number",
            FormValue::Text(_) => "text",
            FormValue::Date(_) => "date",
            FormValue::List(_) => "list",
            FormValue::Map(_) => "map",
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FormValue::Null => Value::Null,
            FormValue::Bool(flag) => Value::Bool(*flag),
            FormValue::Number(number) => number_to_json(*number),
            FormValue::Text(text) => Value::String(text.clone()),
            FormValue::Date(date) => Value::String(to_iso_string(*date)),
            FormValue::List(items) => Value::Array(items.iter().map(FormValue::to_json).collect()),
            FormValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }
}

fn number_to_json(number: f64) -> Value {
    if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
        return Value::from(number as i64);
    }
    serde_json::Number::from_f64(number)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

impl From<Value> for FormValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FormValue::Null,
            Value::Bool(flag) => FormValue::Bool(flag),
            Value::Number(number) => number
                .as_f64()
                .map(FormValue::Number)
                .unwrap_or(FormValue::Null),
            Value::String(text) => FormValue::Text(text),
            Value::Array(items) => FormValue::List(items.into_iter().map(FormValue::from).collect()),
            Value::Object(entries) => FormValue::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, FormValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for FormValue {
    fn from(value: bool) -> Self {
        FormValue::Bool(value)
    }
}

impl From<f64> for FormValue {
    fn from(value: f64) -> Self {
        FormValue::Number(value)
    }
}

impl From<i64> for FormValue {
    fn from(value: i64) -> Self {
        FormValue::Number(value as f64)
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        FormValue::Text(value.to_string())
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        FormValue::Text(value)
    }
}

impl From<OffsetDateTime> for FormValue {
    fn from(value: OffsetDateTime) -> Self {
        FormValue::Date(value)
    }
}

impl fmt::Display for FormValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormValue::Null => Ok(()),
            FormValue::Bool(flag) => write!(f, "{flag}"),
            FormValue::Number(number) => write!(f, "{}", number_to_json(*number)),
            FormValue::Text(text) => f.write_str(text),
            FormValue::Date(date) => f.write_str(&to_iso_string(*date)),
            FormValue::List(items) => {
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            FormValue::Map(_) => f.write_str("[object]"),
        }
    }
}

impl Serialize for FormValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FormValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(FormValue::from)
    }
}

/// Converts a JSON object into form data. Non-object input yields an empty map.
pub fn form_data_from_json(value: Value) -> FormData {
    match value {
        Value::Object(entries) => entries
            .into_iter()
            .map(|(key, value)| (key, FormValue::from(value)))
            .collect(),
        _ => FormData::new(),
    }
}

pub fn form_data_to_json(data: &FormData) -> Value {
    Value::Object(
        data.iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect(),
    )
}

// `[year]` carries a leading `-` before year 0, so negative years read back.
const ISO_MILLIS: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
);
const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Formats a timestamp as `YYYY-MM-DDTHH:MM:SS.mmmZ` in UTC.
pub fn to_iso_string(date: OffsetDateTime) -> String {
    let utc = date.to_offset(UtcOffset::UTC);
    // Every OffsetDateTime has a four digit year, which the description always fits.
    utc.format(ISO_MILLIS).unwrap_or_else(|err| {
        tracing::warn!(%err, "failed to format date");
        utc.to_string()
    })
}

/// Parses an RFC 3339 timestamp, the signed shape written by [`to_iso_string`]
/// or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_date(text: &str) -> Option<OffsetDateTime> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Some(parsed);
    }
    if let Ok(parsed) = PrimitiveDateTime::parse(trimmed, ISO_MILLIS) {
        return Some(parsed.assume_utc());
    }
    if let Ok(parsed) = Date::parse(trimmed, ISO_DATE) {
        return Some(parsed.midnight().assume_utc());
    }

    // Unpadded month and day, e.g. 2024-2-9.
    let mut parts = trimmed.splitn(3, '-');
    let year = parts.next()?.parse::<i32>().ok()?;
    let month = parts.next()?.parse::<u8>().ok()?;
    let day = parts.next()?.parse::<u8>().ok()?;
    let month = Month::try_from(month).ok()?;
    Date::from_calendar_date(year, month, day)
        .ok()
        .map(|date| date.midnight().assume_utc())
}

/// Native value type a renderer emits for a field kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NativeValueKind {
    Text,
    Number,
    Bool,
    Date,
    List,
    /// Option values of single-select fields can be of any shape.
    Any,
}

impl NativeValueKind {
    pub fn accepts(&self, value: &FormValue) -> bool {
        match (self, value) {
            (_, FormValue::Null) | (NativeValueKind::Any, _) => true,
            (NativeValueKind::Text, FormValue::Text(_))
            | (NativeValueKind::Number, FormValue::Number(_))
            | (NativeValueKind::Bool, FormValue::Bool(_))
            | (NativeValueKind::Date, FormValue::Date(_))
            | (NativeValueKind::List, FormValue::List(_)) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NativeValueKind::Text => "text",
            NativeValueKind::Number => "number",
            NativeValueKind::Bool => "bool",
            NativeValueKind::Date => "date",
            NativeValueKind::List => "list",
            NativeValueKind::Any => "any",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_input_follows_required_semantics() {
        assert!(FormValue::Null.is_empty_input());
        assert!(FormValue::from("").is_empty_input());
        assert!(FormValue::List(vec![]).is_empty_input());
        assert!(!FormValue::from(" ").is_empty_input());
        assert!(!FormValue::Bool(false).is_empty_input());
        assert!(!FormValue::Number(0.0).is_empty_input());
    }

    #[test]
    fn integral_numbers_serialize_without_fraction() {
        assert_eq!(FormValue::Number(50.0).to_json(), json!(50));
        assert_eq!(FormValue::Number(0.5).to_json(), json!(0.5));
    }

    #[test]
    fn parses_bare_dates_at_midnight_utc() {
        let parsed = parse_date("2024-02-29").expect("valid date");
        assert_eq!(to_iso_string(parsed), "2024-02-29T00:00:00.000Z");
        assert!(parse_date("2023-02-29").is_none());
        assert!(parse_date("not a date").is_none());
        assert_eq!(
            parse_date("2024-2-9").map(to_iso_string).as_deref(),
            Some("2024-02-09T00:00:00.000Z")
        );
    }

    #[test]
    fn negative_years_keep_a_readable_shape() {
        let date = Date::from_calendar_date(-50, Month::March, 1)
            .expect("valid date")
            .midnight()
            .assume_utc();
        let iso = to_iso_string(date);
        assert_eq!(iso, "-0050-03-01T00:00:00.000Z");
        assert_eq!(parse_date(&iso), Some(date));
        assert_eq!(parse_date("-0050-03-01"), Some(date));
    }
}
