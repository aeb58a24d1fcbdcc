pub mod operation;
pub mod payload;
pub mod source;

pub use operation::Operation;
pub use payload::{Envelope, Payload, RowImage};
pub use source::SourceInfo;
