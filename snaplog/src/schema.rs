pub mod envelope;
pub mod field;

pub use field::{SchemaField, SchemaType};
