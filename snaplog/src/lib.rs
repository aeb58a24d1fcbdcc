pub mod column;
pub mod config;
pub mod dialect;
pub mod error;
pub mod event;
pub mod kafka;
pub mod schema;
pub mod sender;
pub mod sink;
pub mod source;
pub mod table;
