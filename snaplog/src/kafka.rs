pub mod config;
pub mod kafka_client;
pub mod message;
