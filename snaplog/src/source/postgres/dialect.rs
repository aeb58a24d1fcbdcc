use crate::column::descriptor::Column;
use crate::column::neutral_type::NeutralType;
use crate::source::connection::key_alias;
use crate::source::dialect::SourceDialect;

/// Snapshot logs emulated on Postgres: the log of `S.T` is `S."mlog$_T"`,
/// `xmin` stands in for the row version and `ctid` for the row identity.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresSourceDialect;

pub const LOG_TABLE_PREFIX: &str = "mlog$_";

fn cast_for(neutral: NeutralType) -> &'static str {
    match neutral {
        NeutralType::TinyInt | NeutralType::SmallInt => "int2",
        NeutralType::Integer => "int4",
        NeutralType::BigInt => "int8",
        NeutralType::Float => "float4",
        NeutralType::Double => "float8",
        NeutralType::Date | NeutralType::Timestamp => "timestamp",
        NeutralType::Binary | NeutralType::Blob => "bytea",
        NeutralType::Char
        | NeutralType::VarChar
        | NeutralType::NChar
        | NeutralType::NVarChar
        | NeutralType::Clob
        | NeutralType::Unsupported => "text",
    }
}

impl SourceDialect for PostgresSourceDialect {
    fn quote(&self, identifier: &str) -> String {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }

    fn column_expr(&self, column: &Column) -> String {
        let name = self.quote(column.name());
        match column.neutral() {
            NeutralType::Date | NeutralType::Timestamp => {
                format!("(extract(epoch from {}) * 1000)::int8 as {}", name, name)
            }
            neutral => format!("{}::{} as {}", name, cast_for(neutral), name),
        }
    }

    fn key_expr(&self, column: &Column) -> String {
        format!("{}::text as {}", self.quote(column.name()), self.quote(&key_alias(column.name())))
    }

    fn key_predicate(&self, column: &Column, index: usize) -> String {
        let name = self.quote(column.name());
        match column.neutral() {
            // the real column type is unknown, compare the text forms
            NeutralType::Unsupported => format!("{}::text = ${}::text", name, index),
            neutral => format!("{} = ${}::text::{}", name, index, cast_for(neutral)),
        }
    }

    fn limit_clause(&self, rows: usize) -> String {
        format!("limit {}", rows)
    }

    fn row_version_expr(&self) -> String {
        "xmin::text::int8".to_string()
    }

    fn timestamp_expr(&self) -> String {
        "(extract(epoch from clock_timestamp()) * 1000)::int8".to_string()
    }

    fn row_identity_expr(&self) -> String {
        "ctid::text".to_string()
    }

    fn row_identity_predicate(&self, index: usize) -> String {
        format!("ctid = ${}::text::tid", index)
    }

    fn log_sequence_column(&self) -> String {
        self.quote("sequence$$")
    }

    fn log_sequence_expr(&self) -> String {
        format!("{}::int8", self.log_sequence_column())
    }

    fn log_operation_column(&self) -> String {
        self.quote("dmltype$$")
    }
}
