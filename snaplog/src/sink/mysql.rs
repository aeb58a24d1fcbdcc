pub mod config;
pub mod connection;

pub use config::MySqlSinkConfig;
pub use connection::MySqlSinkConnection;
