pub mod generic;
pub mod missing_value;

pub use generic::{CdcError, CdcResult};
pub use missing_value::MissingValueError;
