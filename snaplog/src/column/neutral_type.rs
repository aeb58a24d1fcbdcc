use crate::error::{CdcError, CdcResult};
use crate::schema::field::SchemaType;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use strum_macros::{Display, EnumString};

/// Logical name carried by `int64` fields holding a date as epoch milliseconds.
pub const DATE_LOGICAL_NAME: &str = "io.debezium.time.Timestamp";

/// Logical name carried by `int64` fields holding a timestamp as epoch milliseconds.
pub const TIMESTAMP_LOGICAL_NAME: &str = "org.apache.kafka.connect.data.Timestamp";

/// Database independent classification of a column's storage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "UPPERCASE")]
pub enum NeutralType {
    Date,
    Timestamp,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Double,
    Char,
    VarChar,
    NChar,
    NVarChar,
    Binary,
    Blob,
    Clob,
    Unsupported,
}

fn type_modifier_regex() -> &'static Regex {
    static MODIFIER: OnceLock<Regex> = OnceLock::new();
    MODIFIER.get_or_init(|| Regex::new(r"\(\s*\d+\s*(,\s*\d+\s*)?\)").expect("valid regex"))
}

impl NeutralType {
    /// Classifies a catalog data type. `TIMESTAMP(6) WITH TIME ZONE`,
    /// `timestamp without time zone` and `VARCHAR2(30)` are all accepted;
    /// exact numerics are narrowed using precision and scale.
    pub fn from_catalog(data_type: &str, precision: Option<i32>, scale: Option<i32>) -> Self {
        let normalized = type_modifier_regex()
            .replace_all(&data_type.to_lowercase(), "")
            .split_whitespace()
            .collect::<Vec<&str>>()
            .join(" ");

        if normalized.starts_with("timestamp") {
            return NeutralType::Timestamp;
        }

        match normalized.as_str() {
            "date" => NeutralType::Date,
            "smallint" | "int2" => NeutralType::SmallInt,
            "integer" | "int" | "int4" => NeutralType::Integer,
            "bigint" | "int8" => NeutralType::BigInt,
            "number" | "numeric" | "decimal" => Self::from_exact_numeric(precision, scale),
            "real" | "float4" => NeutralType::Float,
            "float" | "double precision" | "float8" | "binary_double" => NeutralType::Double,
            "char" | "character" | "bpchar" => NeutralType::Char,
            "varchar" | "varchar2" | "character varying" => NeutralType::VarChar,
            "nchar" => NeutralType::NChar,
            "nvarchar" | "nvarchar2" => NeutralType::NVarChar,
            "raw" | "binary" | "varbinary" => NeutralType::Binary,
            "blob" | "bytea" => NeutralType::Blob,
            "clob" | "nclob" | "text" => NeutralType::Clob,
            _ => NeutralType::Unsupported,
        }
    }

    /// Integers that do not fit `int8`, and numerics declared without a
    /// precision, travel as text so no digit is lost.
    fn from_exact_numeric(precision: Option<i32>, scale: Option<i32>) -> Self {
        match (precision, scale.unwrap_or(0)) {
            (None, _) => NeutralType::Unsupported,
            (Some(p), 0) if p < 3 => NeutralType::TinyInt,
            (Some(p), 0) if p < 5 => NeutralType::SmallInt,
            (Some(p), 0) if p < 10 => NeutralType::Integer,
            (Some(p), 0) if p < 19 => NeutralType::BigInt,
            (Some(_), 0) => NeutralType::Unsupported,
            _ => NeutralType::Double,
        }
    }

    /// Field type and optional logical name used in the event schema.
    pub fn schema_type(&self) -> (SchemaType, Option<&'static str>) {
        match self {
            NeutralType::Date => (SchemaType::Int64, Some(DATE_LOGICAL_NAME)),
            NeutralType::Timestamp => (SchemaType::Int64, Some(TIMESTAMP_LOGICAL_NAME)),
            NeutralType::TinyInt => (SchemaType::Int8, None),
            NeutralType::SmallInt => (SchemaType::Int16, None),
            NeutralType::Integer => (SchemaType::Int32, None),
            NeutralType::BigInt => (SchemaType::Int64, None),
            NeutralType::Float => (SchemaType::Float32, None),
            NeutralType::Double => (SchemaType::Float64, None),
            NeutralType::Binary | NeutralType::Blob => (SchemaType::Bytes, None),
            NeutralType::Char
            | NeutralType::VarChar
            | NeutralType::NChar
            | NeutralType::NVarChar
            | NeutralType::Clob
            | NeutralType::Unsupported => (SchemaType::String, None),
        }
    }

    /// Inverse of [`NeutralType::schema_type`] as seen by the replication side:
    /// character flavours collapse to `VarChar` and binary flavours to `Binary`.
    pub fn from_schema(schema_type: &SchemaType, name: Option<&str>) -> CdcResult<Self> {
        let neutral = match (schema_type, name) {
            (SchemaType::Int64, Some(DATE_LOGICAL_NAME)) => NeutralType::Date,
            (SchemaType::Int64, Some(TIMESTAMP_LOGICAL_NAME)) => NeutralType::Timestamp,
            (SchemaType::Int8, _) => NeutralType::TinyInt,
            (SchemaType::Int16, _) => NeutralType::SmallInt,
            (SchemaType::Int32, _) => NeutralType::Integer,
            (SchemaType::Int64, _) => NeutralType::BigInt,
            (SchemaType::Float32, _) => NeutralType::Float,
            (SchemaType::Float64, _) => NeutralType::Double,
            (SchemaType::String, _) => NeutralType::VarChar,
            (SchemaType::Bytes, _) => NeutralType::Binary,
            (SchemaType::Struct, _) => {
                return Err(CdcError::SchemaError(
                    "struct field cannot describe a column".into(),
                ))
            }
        };
        Ok(neutral)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, NeutralType::Date | NeutralType::Timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_from_catalog_oracle_names() {
        assert_eq!(NeutralType::from_catalog("DATE", None, None), NeutralType::Date);
        assert_eq!(
            NeutralType::from_catalog("TIMESTAMP(6) WITH TIME ZONE", None, Some(6)),
            NeutralType::Timestamp
        );
        assert_eq!(NeutralType::from_catalog("VARCHAR2", None, None), NeutralType::VarChar);
        assert_eq!(NeutralType::from_catalog("NVARCHAR2", None, None), NeutralType::NVarChar);
        assert_eq!(NeutralType::from_catalog("RAW", None, None), NeutralType::Binary);
        assert_eq!(NeutralType::from_catalog("BLOB", None, None), NeutralType::Blob);
        assert_eq!(NeutralType::from_catalog("CLOB", None, None), NeutralType::Clob);
        assert_eq!(NeutralType::from_catalog("FLOAT", Some(126), None), NeutralType::Double);
    }

    #[test]
    fn test_from_catalog_postgres_names() {
        assert_eq!(
            NeutralType::from_catalog("timestamp without time zone", None, None),
            NeutralType::Timestamp
        );
        assert_eq!(
            NeutralType::from_catalog("character varying", None, None),
            NeutralType::VarChar
        );
        assert_eq!(NeutralType::from_catalog("bytea", None, None), NeutralType::Blob);
        assert_eq!(NeutralType::from_catalog("text", None, None), NeutralType::Clob);
        assert_eq!(NeutralType::from_catalog("real", None, None), NeutralType::Float);
        assert_eq!(NeutralType::from_catalog("uuid", None, None), NeutralType::Unsupported);
    }

    #[test]
    fn test_exact_numeric_narrowing() {
        assert_eq!(NeutralType::from_catalog("NUMBER", Some(2), Some(0)), NeutralType::TinyInt);
        assert_eq!(NeutralType::from_catalog("NUMBER", Some(4), Some(0)), NeutralType::SmallInt);
        assert_eq!(NeutralType::from_catalog("numeric", Some(9), None), NeutralType::Integer);
        assert_eq!(NeutralType::from_catalog("NUMBER", Some(18), Some(0)), NeutralType::BigInt);
        assert_eq!(NeutralType::from_catalog("NUMBER", Some(10), Some(2)), NeutralType::Double);
    }

    #[test]
    fn test_wide_or_unconstrained_numeric_keeps_every_digit() {
        assert_eq!(NeutralType::from_catalog("NUMBER", Some(38), Some(0)), NeutralType::Unsupported);
        assert_eq!(NeutralType::from_catalog("NUMBER", None, None), NeutralType::Unsupported);
        assert_eq!(NeutralType::from_catalog("numeric", None, None), NeutralType::Unsupported);
        assert_eq!(NeutralType::Unsupported.schema_type().0, SchemaType::String);
    }

    #[test]
    fn test_schema_round_trip_collapses_flavours() {
        let (t, name) = NeutralType::Timestamp.schema_type();
        assert_eq!(NeutralType::from_schema(&t, name).unwrap(), NeutralType::Timestamp);

        let (t, name) = NeutralType::Date.schema_type();
        assert_eq!(NeutralType::from_schema(&t, name).unwrap(), NeutralType::Date);

        let (t, name) = NeutralType::NChar.schema_type();
        assert_eq!(NeutralType::from_schema(&t, name).unwrap(), NeutralType::VarChar);

        let (t, name) = NeutralType::Blob.schema_type();
        assert_eq!(NeutralType::from_schema(&t, name).unwrap(), NeutralType::Binary);

        assert!(NeutralType::from_schema(&SchemaType::Struct, None).is_err());
    }

    #[test]
    fn test_display_and_from_str() {
        assert_eq!(NeutralType::VarChar.to_string(), "VARCHAR");
        assert_eq!(NeutralType::from_str("BIGINT").unwrap(), NeutralType::BigInt);
    }
}
