use crate::column::neutral_type::NeutralType;
use crate::error::{CdcError, CdcResult};
use chrono::{TimeZone, Utc};
use serde_json::{Number, Value};

/// A typed column value as read from a source row or bound to a statement.
/// Temporal variants hold UTC epoch milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null(NeutralType),
    TinyInt(i8),
    SmallInt(i16),
    Integer(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    Date(i64),
    Timestamp(i64),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null(_))
    }

    /// Wraps an optional value read for `neutral`, keeping the type of a NULL.
    pub fn or_null<T>(value: Option<T>, neutral: NeutralType, wrap: fn(T) -> SqlValue) -> SqlValue {
        value.map(wrap).unwrap_or(SqlValue::Null(neutral))
    }

    pub fn to_json(&self) -> Value {
        match self {
            SqlValue::Null(_) => Value::Null,
            SqlValue::TinyInt(v) => Value::from(*v),
            SqlValue::SmallInt(v) => Value::from(*v),
            SqlValue::Integer(v) => Value::from(*v),
            SqlValue::BigInt(v) | SqlValue::Date(v) | SqlValue::Timestamp(v) => Value::from(*v),
            SqlValue::Float(v) => Number::from_f64(f64::from(*v)).map(Value::Number).unwrap_or(Value::Null),
            SqlValue::Double(v) => Number::from_f64(*v).map(Value::Number).unwrap_or(Value::Null),
            SqlValue::Text(v) => Value::String(v.clone()),
            SqlValue::Bytes(v) => Value::String(base64::encode(v)),
        }
    }

    /// Converts an event image value into a parameter of the given type.
    /// JSON null and a missing value both bind as a typed NULL.
    pub fn from_json(neutral: NeutralType, value: Option<&Value>) -> CdcResult<Self> {
        let value = match value {
            None | Some(Value::Null) => return Ok(SqlValue::Null(neutral)),
            Some(value) => value,
        };

        let converted = match neutral {
            NeutralType::TinyInt => SqlValue::TinyInt(narrow(neutral, json_i64(neutral, value)?)?),
            NeutralType::SmallInt => SqlValue::SmallInt(narrow(neutral, json_i64(neutral, value)?)?),
            NeutralType::Integer => SqlValue::Integer(narrow(neutral, json_i64(neutral, value)?)?),
            NeutralType::BigInt => SqlValue::BigInt(json_i64(neutral, value)?),
            NeutralType::Date => SqlValue::Date(json_i64(neutral, value)?),
            NeutralType::Timestamp => SqlValue::Timestamp(json_i64(neutral, value)?),
            NeutralType::Float => SqlValue::Float(json_f64(neutral, value)? as f32),
            NeutralType::Double => SqlValue::Double(json_f64(neutral, value)?),
            NeutralType::Binary | NeutralType::Blob => {
                let encoded = json_str(neutral, value)?;
                let decoded = base64::decode(encoded).map_err(|e| {
                    CdcError::ConversionError(format!("invalid base64 for {}: {}", neutral, e))
                })?;
                SqlValue::Bytes(decoded)
            }
            NeutralType::Char
            | NeutralType::VarChar
            | NeutralType::NChar
            | NeutralType::NVarChar
            | NeutralType::Clob
            | NeutralType::Unsupported => match value {
                Value::String(s) => SqlValue::Text(s.clone()),
                other => SqlValue::Text(other.to_string()),
            },
        };
        Ok(converted)
    }

    /// SQL literal used in diagnostics only, never executed.
    pub fn literal(&self) -> String {
        match self {
            SqlValue::Null(_) => "NULL".to_string(),
            SqlValue::TinyInt(v) => v.to_string(),
            SqlValue::SmallInt(v) => v.to_string(),
            SqlValue::Integer(v) => v.to_string(),
            SqlValue::BigInt(v) => v.to_string(),
            SqlValue::Float(v) => v.to_string(),
            SqlValue::Double(v) => v.to_string(),
            SqlValue::Text(v) => format!("'{}'", v.replace('\'', "''")),
            SqlValue::Bytes(v) => format!("'{}'", base64::encode(v)),
            SqlValue::Date(ms) => format!("'{}'", format_millis(*ms, "%Y-%m-%dT%H:%M:%S%z")),
            SqlValue::Timestamp(ms) => {
                format!("'{}'", format_millis(*ms, "%Y-%m-%dT%H:%M:%S%.3f%z"))
            }
        }
    }
}

fn format_millis(ms: i64, format: &str) -> String {
    match Utc.timestamp_millis_opt(ms).single() {
        Some(datetime) => datetime.format(format).to_string(),
        None => ms.to_string(),
    }
}

fn json_i64(neutral: NeutralType, value: &Value) -> CdcResult<i64> {
    value
        .as_i64()
        .ok_or_else(|| CdcError::ConversionError(format!("expected {} but got {}", neutral, value)))
}

fn json_f64(neutral: NeutralType, value: &Value) -> CdcResult<f64> {
    value
        .as_f64()
        .ok_or_else(|| CdcError::ConversionError(format!("expected {} but got {}", neutral, value)))
}

fn json_str(neutral: NeutralType, value: &Value) -> CdcResult<&str> {
    value
        .as_str()
        .ok_or_else(|| CdcError::ConversionError(format!("expected {} but got {}", neutral, value)))
}

fn narrow<T: TryFrom<i64>>(neutral: NeutralType, value: i64) -> CdcResult<T> {
    T::try_from(value)
        .map_err(|_| CdcError::ConversionError(format!("{} out of range for {}", value, neutral)))
}
