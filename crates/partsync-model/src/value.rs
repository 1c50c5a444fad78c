//! Property values and the data types recovered for them.
//!
//! Viewer payloads carry untyped JSON values. Everything here converts
//! without failing: a value that does not fit the requested type is passed
//! through in its natural form instead.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};

/// Canonical data type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    String,
    Number,
    Integer,
    Boolean,
    Date,
}

impl DataType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Number => "number",
            DataType::Integer => "integer",
            DataType::Boolean => "boolean",
            DataType::Date => "date",
        }
    }

    /// Edit affordance used for values of this type.
    #[must_use]
    pub fn input_type(self) -> InputType {
        match self {
            DataType::Date => InputType::Date,
            DataType::Boolean => InputType::Checkbox,
            DataType::Integer | DataType::Number => InputType::Number,
            DataType::String => InputType::Text,
        }
    }

    /// Infers a data type from the shape of a raw value.
    #[must_use]
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::Number(_) => DataType::Number,
            Value::Bool(_) => DataType::Boolean,
            Value::String(text) if parse_date(text).is_some() => DataType::Date,
            _ => DataType::String,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = ();

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.trim().to_ascii_lowercase().as_str() {
            "string" | "text" => Ok(DataType::String),
            "number" | "double" | "float" | "real" => Ok(DataType::Number),
            "integer" | "int" => Ok(DataType::Integer),
            "boolean" | "bool" => Ok(DataType::Boolean),
            "date" | "datetime" => Ok(DataType::Date),
            _ => Err(()),
        }
    }
}

/// Edit affordance tag derived from a [`DataType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Date,
    Checkbox,
    Number,
    Text,
}

impl InputType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            InputType::Date => "date",
            InputType::Checkbox => "checkbox",
            InputType::Number => "number",
            InputType::Text => "text",
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed union of the values a property can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Number(f64),
    Integer(i64),
    Boolean(bool),
    Date(OffsetDateTime),
}

impl PropertyValue {
    /// Converts a JSON value without any type hint. `null` has no value.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(flag) => Some(PropertyValue::Boolean(*flag)),
            Value::Number(number) => Some(match number.as_i64() {
                Some(int) => PropertyValue::Integer(int),
                None => PropertyValue::Number(number.as_f64().unwrap_or(f64::NAN)),
            }),
            Value::String(text) => Some(PropertyValue::String(text.clone())),
            other => Some(PropertyValue::String(other.to_string())),
        }
    }

    /// Converts a JSON value towards `data_type`, keeping the natural form
    /// when the value does not fit.
    #[must_use]
    pub fn coerce(value: &Value, data_type: DataType) -> Option<Self> {
        let natural = Self::from_json(value)?;
        let coerced = match (data_type, value) {
            (DataType::Number, Value::Number(number)) => {
                number.as_f64().map(PropertyValue::Number)
            }
            (DataType::Number, Value::String(text)) => {
                text.trim().parse::<f64>().ok().map(PropertyValue::Number)
            }
            (DataType::Integer, Value::Number(number)) => number
                .as_i64()
                .or_else(|| number.as_f64().map(truncate))
                .map(PropertyValue::Integer),
            (DataType::Integer, Value::String(text)) => parse_integer(text),
            (DataType::Boolean, Value::String(text)) => parse_boolean(text),
            (DataType::Date, Value::String(text)) => parse_date(text).map(PropertyValue::Date),
            _ => None,
        };
        Some(coerced.unwrap_or(natural))
    }

    /// Converts a choice-list display string into an edit value.
    ///
    /// Malformed numbers become `NaN` rather than failing.
    #[must_use]
    pub fn from_display(text: &str, data_type: DataType) -> Self {
        match data_type {
            DataType::String => PropertyValue::String(text.to_string()),
            DataType::Number => {
                PropertyValue::Number(text.trim().parse::<f64>().unwrap_or(f64::NAN))
            }
            DataType::Integer => {
                parse_integer(text).unwrap_or(PropertyValue::Number(f64::NAN))
            }
            DataType::Boolean => {
                parse_boolean(text).unwrap_or_else(|| PropertyValue::String(text.to_string()))
            }
            DataType::Date => parse_date(text)
                .map_or_else(|| PropertyValue::String(text.to_string()), PropertyValue::Date),
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(flag) => Some(*flag),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(number) => Some(*number),
            #[allow(clippy::cast_precision_loss)]
            PropertyValue::Integer(int) => Some(*int as f64),
            _ => None,
        }
    }

    /// Equality that treats `Integer` and `Number` holding the same amount as
    /// equal; everything else compares as `==`.
    #[must_use]
    pub fn loosely_eq(&self, other: &PropertyValue) -> bool {
        match (self, other) {
            (
                PropertyValue::Number(_) | PropertyValue::Integer(_),
                PropertyValue::Number(_) | PropertyValue::Integer(_),
            ) => self.as_f64() == other.as_f64(),
            _ => self == other,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(text) => Some(text),
            _ => None,
        }
    }

    /// JSON form sent back to the viewer.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            PropertyValue::String(text) => Value::String(text.clone()),
            PropertyValue::Number(number) => serde_json::Number::from_f64(*number)
                .map_or(Value::Null, Value::Number),
            PropertyValue::Integer(int) => Value::from(*int),
            PropertyValue::Boolean(flag) => Value::Bool(*flag),
            PropertyValue::Date(date) => Value::String(format_date(*date)),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(text) => write!(f, "{text:?}"),
            PropertyValue::Number(number) => write!(f, "{number}"),
            PropertyValue::Integer(int) => write!(f, "{int}"),
            PropertyValue::Boolean(flag) => write!(f, "{flag}"),
            PropertyValue::Date(date) => f.write_str(&format_date(*date)),
        }
    }
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PropertyValue::String(text) => serializer.serialize_str(text),
            PropertyValue::Number(number) => serializer.serialize_f64(*number),
            PropertyValue::Integer(int) => serializer.serialize_i64(*int),
            PropertyValue::Boolean(flag) => serializer.serialize_bool(*flag),
            PropertyValue::Date(date) => serializer.serialize_str(&format_date(*date)),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(text: &str) -> Self {
        PropertyValue::String(text.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(text: String) -> Self {
        PropertyValue::String(text)
    }
}

impl From<f64> for PropertyValue {
    fn from(number: f64) -> Self {
        PropertyValue::Number(number)
    }
}

impl From<i64> for PropertyValue {
    fn from(int: i64) -> Self {
        PropertyValue::Integer(int)
    }
}

impl From<bool> for PropertyValue {
    fn from(flag: bool) -> Self {
        PropertyValue::Boolean(flag)
    }
}

/// Parses RFC 3339 timestamps, `YYYY-MM-DDTHH:MM:SS` and bare `YYYY-MM-DD`
/// dates. Naive forms are taken as UTC.
#[must_use]
pub fn parse_date(text: &str) -> Option<OffsetDateTime> {
    let text = text.trim();
    if let Ok(date) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(date);
    }
    if let Ok(date_time) = PrimitiveDateTime::parse(
        text,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Some(date_time.assume_utc());
    }
    Date::parse(text, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_utc())
}

fn format_date(date: OffsetDateTime) -> String {
    date.format(&Rfc3339)
        .unwrap_or_else(|_| date.date().to_string())
}

/// Accepts the lower, title and upper case spellings of both literals so that
/// choice values and coerced values agree; any other text is not a boolean.
fn parse_boolean(text: &str) -> Option<PropertyValue> {
    match text.trim() {
        "true" | "True" | "TRUE" => Some(PropertyValue::Boolean(true)),
        "false" | "False" | "FALSE" => Some(PropertyValue::Boolean(false)),
        _ => None,
    }
}

fn parse_integer(text: &str) -> Option<PropertyValue> {
    let text = text.trim();
    text.parse::<i64>()
        .ok()
        .or_else(|| text.parse::<f64>().ok().filter(|n| n.is_finite()).map(truncate))
        .map(PropertyValue::Integer)
}

#[allow(clippy::cast_possible_truncation)]
fn truncate(number: f64) -> i64 {
    number.trunc() as i64
}
