use crate::column::neutral_type::NeutralType;
use crate::dialect::kind::SinkDialect;
use crate::error::{CdcError, CdcResult};
use log::info;
use std::sync::OnceLock;

static INSTALLED: OnceLock<DialectTypeMap> = OnceLock::new();

/// Neutral type to destination column type keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialectTypeMap {
    dialect: SinkDialect,
}

impl DialectTypeMap {
    pub fn for_dialect(dialect: SinkDialect) -> Self {
        DialectTypeMap { dialect }
    }

    pub fn dialect(&self) -> SinkDialect {
        self.dialect
    }

    pub fn sql_type(&self, neutral: NeutralType) -> &'static str {
        match self.dialect {
            SinkDialect::MySql => mysql_type(neutral),
            SinkDialect::Postgres => postgres_type(neutral),
        }
    }

    /// Parameter marker for the 1-based `index`. Postgres markers carry the
    /// column type so a narrower bound value is widened server side.
    pub fn placeholder(&self, index: usize, neutral: NeutralType) -> String {
        match self.dialect {
            SinkDialect::MySql => self.dialect.placeholder(index),
            SinkDialect::Postgres => format!("{}::{}", self.dialect.placeholder(index), postgres_type(neutral)),
        }
    }
}

fn mysql_type(neutral: NeutralType) -> &'static str {
    match neutral {
        NeutralType::TinyInt => "tinyint",
        NeutralType::SmallInt => "smallint",
        NeutralType::Integer => "int",
        NeutralType::BigInt => "bigint",
        NeutralType::Float => "float",
        NeutralType::Double => "double",
        NeutralType::Date => "datetime",
        NeutralType::Timestamp => "datetime(3)",
        NeutralType::Binary | NeutralType::Blob => "varbinary(8002)",
        NeutralType::Char
        | NeutralType::VarChar
        | NeutralType::NChar
        | NeutralType::NVarChar
        | NeutralType::Clob
        | NeutralType::Unsupported => "varchar(4002)",
    }
}

fn postgres_type(neutral: NeutralType) -> &'static str {
    match neutral {
        NeutralType::TinyInt | NeutralType::SmallInt => "smallint",
        NeutralType::Integer => "integer",
        NeutralType::BigInt => "bigint",
        NeutralType::Float => "real",
        NeutralType::Double => "double precision",
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

/// Installs the process wide map. Installing the same dialect again is a
/// no-op, a different one is refused.
pub fn install(dialect: SinkDialect) -> CdcResult<&'static DialectTypeMap> {
    let installed = INSTALLED.get_or_init(|| {
        info!("Installing {} type map", dialect);
        DialectTypeMap::for_dialect(dialect)
    });
    if installed.dialect != dialect {
        return Err(CdcError::DialectError(format!(
            "type map already installed for {}, cannot switch to {}",
            installed.dialect, dialect
        )));
    }
    Ok(installed)
}

pub fn installed() -> CdcResult<&'static DialectTypeMap> {
    INSTALLED
        .get()
        .ok_or_else(|| CdcError::DialectError("no dialect type map installed".into()))
}
