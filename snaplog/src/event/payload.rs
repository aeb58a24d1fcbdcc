use crate::error::{CdcError, CdcResult};
use crate::event::operation::Operation;
use crate::event::source::SourceInfo;
use crate::schema::field::SchemaField;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Column name to JSON value, in column order. SQL NULL is `Value::Null`.
pub type RowImage = Map<String, Value>;

/// Change event body. Creates and updates carry only an after image,
/// deletes only a before image holding the primary key.
#[derive(Debug, PartialEq, Deserialize, Serialize, Clone)]
pub struct Payload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    before: Option<RowImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    after: Option<RowImage>,
    source: SourceInfo,
    op: Operation,
    ts_ms: i64,
}

impl Payload {
    pub fn created(after: RowImage, source: SourceInfo) -> Self {
        Payload::build(None, Some(after), source, Operation::Create)
    }

    pub fn updated(after: RowImage, source: SourceInfo) -> Self {
        Payload::build(None, Some(after), source, Operation::Update)
    }

    pub fn deleted(before: RowImage, source: SourceInfo) -> Self {
        Payload::build(Some(before), None, source, Operation::Delete)
    }

    /// Image-bearing constructor for an operation parsed from a change-log row.
    pub fn for_operation(op: Operation, image: RowImage, source: SourceInfo) -> Self {
        match op {
            Operation::Create => Payload::created(image, source),
            Operation::Update => Payload::updated(image, source),
            Operation::Delete => Payload::deleted(image, source),
        }
    }

    fn build(before: Option<RowImage>, after: Option<RowImage>, source: SourceInfo, op: Operation) -> Self {
        Payload {
            before,
            after,
            source,
            op,
            ts_ms: Utc::now().timestamp_millis(),
        }
    }

    pub fn op(&self) -> Operation {
        self.op
    }

    pub fn source(&self) -> &SourceInfo {
        &self.source
    }

    pub fn ts_ms(&self) -> i64 {
        self.ts_ms
    }

    pub fn before(&self) -> Option<&RowImage> {
        self.before.as_ref()
    }

    pub fn after(&self) -> Option<&RowImage> {
        self.after.as_ref()
    }

    /// The image the operation needs, checked on payloads received from the wire.
    pub fn image(&self) -> CdcResult<&RowImage> {
        let image = match self.op {
            Operation::Delete => self.before.as_ref(),
            Operation::Create | Operation::Update => self.after.as_ref(),
        };
        image.ok_or_else(|| {
            CdcError::SchemaError(format!(
                "'{}' payload for {} carries no image",
                self.op,
                self.source.qualified_name()
            ))
        })
    }
}

#[derive(Debug, PartialEq, Deserialize, Serialize, Clone)]
pub struct Envelope {
    pub schema: SchemaField,
    pub payload: Payload,
}

impl Envelope {
    pub fn new(schema: SchemaField, payload: Payload) -> Self {
        Envelope { schema, payload }
    }

    pub fn to_json(&self) -> CdcResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(value: &str) -> CdcResult<Self> {
        Ok(serde_json::from_str(value)?)
    }
}
