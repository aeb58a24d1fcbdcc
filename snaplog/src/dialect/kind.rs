use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SinkDialect {
    #[strum(to_string = "postgres", serialize = "postgresql")]
    Postgres,
    #[strum(to_string = "mysql")]
    MySql,
}

impl SinkDialect {
    /// Parameter marker for the 1-based `index`.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            SinkDialect::Postgres => format!("${}", index),
            SinkDialect::MySql => "?".to_string(),
        }
    }
}
