use crate::error::{CdcError, CdcResult};
use crate::schema::field::{SchemaField, SchemaType};

pub const BEFORE: &str = "before";
pub const AFTER: &str = "after";
pub const SOURCE: &str = "source";
pub const OP: &str = "op";
pub const TS_MS: &str = "ts_ms";

pub const SOURCE_SCHEMA_NAME: &str = "snaplog.Source";

pub fn source_schema() -> SchemaField {
    SchemaField::new_struct(
        SOURCE_SCHEMA_NAME,
        Some(SOURCE),
        false,
        vec![
            SchemaField::new(SchemaType::String, false, "owner"),
            SchemaField::new(SchemaType::String, false, "table"),
            SchemaField::new(SchemaType::Int64, false, "ts_ms"),
            SchemaField::new(SchemaType::Int64, false, "version"),
        ],
    )
}

/// `<owner>.<table>.PK`: primary key columns only, used for delete images.
pub fn before_schema(owner: &str, table: &str, pk_fields: Vec<SchemaField>) -> SchemaField {
    SchemaField::new_struct(&format!("{}.{}.PK", owner, table), Some(BEFORE), true, pk_fields)
}

/// `<owner>.<table>.Data`: every column, used for create and update images.
pub fn after_schema(owner: &str, table: &str, all_fields: Vec<SchemaField>) -> SchemaField {
    SchemaField::new_struct(&format!("{}.{}.Data", owner, table), Some(AFTER), true, all_fields)
}

pub fn envelope_schema(owner: &str, table: &str, before: SchemaField, after: SchemaField) -> SchemaField {
    SchemaField::new_struct(
        &format!("{}.{}.Envelope", owner, table),
        None,
        false,
        vec![
            before,
            after,
            source_schema(),
            SchemaField::new(SchemaType::String, false, OP),
            SchemaField::new(SchemaType::Int64, false, TS_MS),
        ],
    )
}

/// Splits a received envelope schema into its key and data structs.
pub fn split_envelope(envelope: &SchemaField) -> CdcResult<(&SchemaField, &SchemaField)> {
    if envelope.r#type != SchemaType::Struct {
        return Err(CdcError::SchemaError("envelope schema is not a struct".into()));
    }
    let before = envelope
        .child(BEFORE)
        .ok_or_else(|| CdcError::SchemaError(format!("envelope has no '{}' field", BEFORE)))?;
    let after = envelope
        .child(AFTER)
        .ok_or_else(|| CdcError::SchemaError(format!("envelope has no '{}' field", AFTER)))?;
    if before.children().is_empty() {
        return Err(CdcError::SchemaError(
            "envelope key schema has no primary key fields".into(),
        ));
    }
    Ok((before, after))
}
