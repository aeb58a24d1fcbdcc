use crate::error::{CdcError, CdcResult};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

#[derive(Debug, PartialEq, Eq, Deserialize, Serialize, Clone, Copy, Display)]
pub enum Operation {
    #[serde(rename = "c")]
    #[strum(serialize = "c")]
    Create,
    #[serde(rename = "u")]
    #[strum(serialize = "u")]
    Update,
    #[serde(rename = "d")]
    #[strum(serialize = "d")]
    Delete,
}

impl Operation {
    /// Parses the one letter code carried by change-log rows and payloads.
    /// Anything else is a fatal error for the current cycle.
    pub fn from_code(code: &str) -> CdcResult<Self> {
        match code.trim() {
            "c" => Ok(Operation::Create),
            "u" => Ok(Operation::Update),
            "d" => Ok(Operation::Delete),
            other => Err(CdcError::UnknownOperationError(other.to_string())),
        }
    }
}
