pub mod config;
pub mod connection;
pub mod dialect;
pub mod params;
pub mod row;

pub use config::PostgresSourceConfig;
pub use connection::PostgresSourceConnection;
pub use dialect::PostgresSourceDialect;
