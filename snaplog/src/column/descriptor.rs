use crate::column::neutral_type::NeutralType;
use crate::column::value::SqlValue;
use crate::error::{CdcError, CdcResult};
use crate::event::payload::RowImage;
use crate::schema::field::SchemaField;
use crate::source::connection::{CatalogColumn, SourceRow};
use log::error;
use std::io::Read;

pub const BLOB_CHUNK_SIZE: usize = 16384;
pub const CLOB_CHUNK_SIZE: usize = 8192;

/// Static metadata of one column plus the type driven operations on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    neutral: NeutralType,
    nullable: bool,
    precision: Option<i32>,
    scale: Option<i32>,
    part_of_pk: bool,
}

impl Column {
    pub fn new(name: &str, neutral: NeutralType, nullable: bool, part_of_pk: bool) -> Self {
        Column {
            name: name.to_string(),
            neutral,
            nullable: nullable && !part_of_pk,
            precision: None,
            scale: None,
            part_of_pk,
        }
    }

    pub fn from_catalog(catalog: &CatalogColumn) -> Self {
        let neutral =
            NeutralType::from_catalog(&catalog.data_type, catalog.data_precision, catalog.data_scale);
        Column {
            name: catalog.column_name.clone(),
            neutral,
            nullable: catalog.nullable && !catalog.part_of_pk,
            precision: catalog.data_precision,
            scale: catalog.data_scale,
            part_of_pk: catalog.part_of_pk,
        }
    }

    /// Rebuilds a column from a received schema leaf.
    pub fn from_schema_field(field: &SchemaField, part_of_pk: bool) -> CdcResult<Self> {
        let name = field
            .field
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| CdcError::SchemaError("column field without a label".into()))?;
        let neutral = NeutralType::from_schema(&field.r#type, field.name.as_deref())?;
        Ok(Column::new(name, neutral, field.optional, part_of_pk))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn neutral(&self) -> NeutralType {
        self.neutral
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_part_of_pk(&self) -> bool {
        self.part_of_pk
    }

    pub fn precision(&self) -> Option<i32> {
        self.precision
    }

    pub fn scale(&self) -> Option<i32> {
        self.scale
    }

    pub fn schema_field(&self) -> SchemaField {
        let (schema_type, logical_name) = self.neutral.schema_type();
        SchemaField::new(schema_type, self.nullable, &self.name).with_name(logical_name)
    }

    /// Reads this column from a source row.
    pub fn extract<R: SourceRow + ?Sized>(&self, row: &R) -> CdcResult<SqlValue> {
        let name = self.name.as_str();
        let neutral = self.neutral;
        let value = match neutral {
            NeutralType::Date => SqlValue::or_null(row.get_date_millis(name)?, neutral, SqlValue::Date),
            NeutralType::Timestamp => {
                SqlValue::or_null(row.get_timestamp_millis(name)?, neutral, SqlValue::Timestamp)
            }
            NeutralType::TinyInt => match row.get_i16(name)? {
                Some(v) => SqlValue::TinyInt(i8::try_from(v).map_err(|_| {
                    CdcError::ConversionError(format!("{} out of range for {}.TINYINT", v, name))
                })?),
                None => SqlValue::Null(neutral),
            },
            NeutralType::SmallInt => SqlValue::or_null(row.get_i16(name)?, neutral, SqlValue::SmallInt),
            NeutralType::Integer => SqlValue::or_null(row.get_i32(name)?, neutral, SqlValue::Integer),
            NeutralType::BigInt => SqlValue::or_null(row.get_i64(name)?, neutral, SqlValue::BigInt),
            NeutralType::Float => SqlValue::or_null(row.get_f32(name)?, neutral, SqlValue::Float),
            NeutralType::Double => SqlValue::or_null(row.get_f64(name)?, neutral, SqlValue::Double),
            NeutralType::Char | NeutralType::VarChar | NeutralType::Unsupported => {
                SqlValue::or_null(row.get_string(name)?, neutral, SqlValue::Text)
            }
            NeutralType::NChar | NeutralType::NVarChar => {
                SqlValue::or_null(row.get_nstring(name)?, neutral, SqlValue::Text)
            }
            NeutralType::Binary => SqlValue::or_null(row.get_bytes(name)?, neutral, SqlValue::Bytes),
            NeutralType::Blob => match row.open_blob(name)? {
                Some(reader) => SqlValue::or_null(self.drain(reader, BLOB_CHUNK_SIZE), neutral, SqlValue::Bytes),
                None => SqlValue::Null(neutral),
            },
            NeutralType::Clob => match row.open_clob(name)? {
                Some(reader) => {
                    let text = self
                        .drain(reader, CLOB_CHUNK_SIZE)
                        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
                    SqlValue::or_null(text, neutral, SqlValue::Text)
                }
                None => SqlValue::Null(neutral),
            },
        };
        Ok(value)
    }

    /// Streams a large object chunk by chunk. A read failure keeps what was
    /// read so far; an empty object reads as absent.
    fn drain(&self, mut reader: Box<dyn Read + Send + '_>, chunk_size: usize) -> Option<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut chunk = vec![0u8; chunk_size];
        loop {
            match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(read) => buffer.extend_from_slice(&chunk[..read]),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!(
                        "Unable to read {} column {} after {} bytes: {}",
                        self.neutral,
                        self.name,
                        buffer.len(),
                        e
                    );
                    break;
                }
            }
        }
        if buffer.is_empty() {
            None
        } else {
            Some(buffer)
        }
    }

    /// Takes this column's value out of an event image as a statement parameter.
    pub fn bind(&self, image: &RowImage) -> CdcResult<SqlValue> {
        SqlValue::from_json(self.neutral, image.get(&self.name))
    }

    /// `NAME=literal`, used when reporting a row that could not be found.
    pub fn predicate_literal(&self, value: &SqlValue) -> String {
        format!("{}={}", self.name, value.literal())
    }
}
