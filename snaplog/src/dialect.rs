pub mod kind;
pub mod type_map;

pub use kind::SinkDialect;
pub use type_map::{install, installed, DialectTypeMap};
