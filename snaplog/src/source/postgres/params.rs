use crate::column::neutral_type::NeutralType;
use crate::column::value::SqlValue;
use crate::error::{CdcError, CdcResult};
use chrono::{NaiveDateTime, TimeZone, Utc};
use tokio_postgres::types::ToSql;

pub type PostgresParam = Box<dyn ToSql + Sync + Send>;

fn naive_utc(ms: i64) -> CdcResult<NaiveDateTime> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|datetime| datetime.naive_utc())
        .ok_or_else(|| CdcError::ConversionError(format!("{} is not a valid epoch millisecond", ms)))
}

fn typed_null(neutral: NeutralType) -> PostgresParam {
    match neutral {
        NeutralType::TinyInt | NeutralType::SmallInt => Box::new(Option::<i16>::None),
        NeutralType::Integer => Box::new(Option::<i32>::None),
        NeutralType::BigInt => Box::new(Option::<i64>::None),
        NeutralType::Float => Box::new(Option::<f32>::None),
        NeutralType::Double => Box::new(Option::<f64>::None),
        NeutralType::Date | NeutralType::Timestamp => Box::new(Option::<NaiveDateTime>::None),
        NeutralType::Binary | NeutralType::Blob => Box::new(Option::<Vec<u8>>::None),
        NeutralType::Char
        | NeutralType::VarChar
        | NeutralType::NChar
        | NeutralType::NVarChar
        | NeutralType::Clob
        | NeutralType::Unsupported => Box::new(Option::<String>::None),
    }
}

/// Converts a value into a boxed parameter. Tiny integers widen to `int2`
/// and temporal values bind as `timestamp` in UTC.
pub fn to_postgres_param(value: &SqlValue) -> CdcResult<PostgresParam> {
    let param: PostgresParam = match value {
        SqlValue::Null(neutral) => typed_null(*neutral),
        SqlValue::TinyInt(v) => Box::new(i16::from(*v)),
        SqlValue::SmallInt(v) => Box::new(*v),
        SqlValue::Integer(v) => Box::new(*v),
        SqlValue::BigInt(v) => Box::new(*v),
        SqlValue::Float(v) => Box::new(*v),
        SqlValue::Double(v) => Box::new(*v),
        SqlValue::Text(v) => Box::new(v.clone()),
        SqlValue::Bytes(v) => Box::new(v.clone()),
        SqlValue::Date(ms) | SqlValue::Timestamp(ms) => Box::new(naive_utc(*ms)?),
    };
    Ok(param)
}

pub fn to_postgres_params(values: &[SqlValue]) -> CdcResult<Vec<PostgresParam>> {
    values.iter().map(to_postgres_param).collect()
}
