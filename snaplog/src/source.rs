pub mod connection;
pub mod dialect;
pub mod postgres;

pub use connection::{CatalogColumn, SnapshotLog, SourceConnection, SourceRow};
pub use dialect::SourceDialect;
