pub mod connection;
pub mod mysql;
pub mod postgres;
pub mod replicator;

pub use connection::{SinkConnection, SinkConnector};
pub use replicator::Replicator;
