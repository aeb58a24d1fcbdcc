use serde::{Deserialize, Serialize};

/// Identity of the captured table plus commit metadata of the change.
/// `version` is the source's monotonic row-version marker.
#[derive(Debug, PartialEq, Eq, Deserialize, Serialize, Clone)]
pub struct SourceInfo {
    pub owner: String,
    pub table: String,
    pub ts_ms: i64,
    pub version: i64,
}

impl SourceInfo {
    pub fn new(owner: &str, table: &str) -> Self {
        SourceInfo {
            owner: owner.to_string(),
            table: table.to_string(),
            ts_ms: 0,
            version: 0,
        }
    }

    pub fn with_commit(mut self, ts_ms: i64, version: i64) -> Self {
        self.ts_ms = ts_ms;
        self.version = version;
        self
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.owner, self.table)
    }
}
