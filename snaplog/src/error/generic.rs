use crate::error::missing_value::MissingValueError;
use rdkafka::error::KafkaError;
use std::error::Error;
use std::fmt::{self, Display};

pub type CdcResult<T> = Result<T, CdcError>;

#[derive(Debug)]
pub enum CdcError {
    MissingValueError(MissingValueError),
    PostgresError(tokio_postgres::Error),
    MySQLError(mysql_async::Error),
    KafkaError(KafkaError),
    SerdeJsonError(serde_json::Error),
    StdIoError(std::io::Error),
    CatalogError(String),
    ConversionError(String),
    UnknownOperationError(String),
    DialectError(String),
    SchemaError(String),
    NotReadyError(String),
    SendError(String),
}

impl Display for CdcError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CdcError::MissingValueError(e) => write!(f, "{}", e),
            CdcError::PostgresError(e) => write!(f, "Postgres error: {}", e),
            CdcError::MySQLError(e) => write!(f, "MySQL error: {}", e),
            CdcError::KafkaError(e) => write!(f, "Kafka error: {}", e),
            CdcError::SerdeJsonError(e) => write!(f, "JSON error: {}", e),
            CdcError::StdIoError(e) => write!(f, "IO error: {}", e),
            CdcError::CatalogError(msg) => write!(f, "Catalog error: {}", msg),
            CdcError::ConversionError(msg) => write!(f, "Conversion error: {}", msg),
            CdcError::UnknownOperationError(op) => write!(f, "Unknown operation code '{}'", op),
            CdcError::DialectError(msg) => write!(f, "Dialect error: {}", msg),
            CdcError::SchemaError(msg) => write!(f, "Schema error: {}", msg),
            CdcError::NotReadyError(table) => {
                write!(f, "Table {} is not ready for replication", table)
            }
            CdcError::SendError(msg) => write!(f, "Send error: {}", msg),
        }
    }
}

impl Error for CdcError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CdcError::MissingValueError(e) => Some(e),
            CdcError::PostgresError(e) => Some(e),
            CdcError::MySQLError(e) => Some(e),
            CdcError::KafkaError(e) => Some(e),
            CdcError::SerdeJsonError(e) => Some(e),
            CdcError::StdIoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CdcError {
    fn from(error: std::io::Error) -> Self {
        CdcError::StdIoError(error)
    }
}

impl From<KafkaError> for CdcError {
    fn from(error: KafkaError) -> Self {
        CdcError::KafkaError(error)
    }
}

impl From<MissingValueError> for CdcError {
    fn from(error: MissingValueError) -> Self {
        CdcError::MissingValueError(error)
    }
}

impl From<tokio_postgres::Error> for CdcError {
    fn from(error: tokio_postgres::Error) -> Self {
        CdcError::PostgresError(error)
    }
}

impl From<mysql_async::Error> for CdcError {
    fn from(error: mysql_async::Error) -> Self {
        CdcError::MySQLError(error)
    }
}

impl From<serde_json::Error> for CdcError {
    fn from(error: serde_json::Error) -> Self {
        CdcError::SerdeJsonError(error)
    }
}
