use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, Deserialize, Serialize, Clone, Copy)]
pub enum SchemaType {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "bytes")]
    Bytes,
    #[serde(rename = "int8")]
    Int8,
    #[serde(rename = "int16")]
    Int16,
    #[serde(rename = "int32")]
    Int32,
    #[serde(rename = "int64")]
    Int64,
    #[serde(rename = "float32")]
    Float32,
    #[serde(rename = "float64")]
    Float64,
    #[serde(rename = "struct")]
    Struct,
}

/// One node of an event schema tree. Leaves describe a column, struct nodes
/// carry their children in declaration order.
#[derive(Debug, PartialEq, Deserialize, Serialize, Clone)]
pub struct SchemaField {
    pub r#type: SchemaType,
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<SchemaField>>,
}

impl SchemaField {
    pub fn new(r#type: SchemaType, optional: bool, field: &str) -> Self {
        SchemaField {
            r#type,
            optional,
            field: Some(field.to_string()),
            name: None,
            fields: None,
        }
    }

    pub fn new_struct(name: &str, field: Option<&str>, optional: bool, fields: Vec<SchemaField>) -> Self {
        SchemaField {
            r#type: SchemaType::Struct,
            optional,
            field: field.map(str::to_string),
            name: Some(name.to_string()),
            fields: Some(fields),
        }
    }

    pub fn with_name(mut self, name: Option<&str>) -> Self {
        self.name = name.map(str::to_string);
        self
    }

    pub fn label(&self) -> &str {
        self.field.as_deref().unwrap_or_default()
    }

    pub fn children(&self) -> &[SchemaField] {
        self.fields.as_deref().unwrap_or_default()
    }

    pub fn child(&self, label: &str) -> Option<&SchemaField> {
        self.children().iter().find(|f| f.label() == label)
    }
}
