pub mod config;
pub mod connection;

pub use config::PostgresSinkConfig;
pub use connection::PostgresSinkConnection;
