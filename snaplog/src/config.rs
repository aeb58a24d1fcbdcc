use crate::dialect::kind::SinkDialect;
use crate::sink::mysql::config::MySqlSinkConfig;
use crate::sink::postgres::config::PostgresSinkConfig;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

/// Which snapshot logs to capture and how often.
/// An empty `tables` list selects every log visible for `owner`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CaptureConfig {
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub tables: Vec<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl CaptureConfig {
    pub fn new(owner: Option<String>, tables: Vec<String>, batch_size: usize, poll_interval_ms: u64) -> Self {
        CaptureConfig {
            owner,
            tables,
            batch_size,
            poll_interval_ms,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        CaptureConfig::new(None, vec![], DEFAULT_BATCH_SIZE, DEFAULT_POLL_INTERVAL_MS)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "dialect", rename_all = "lowercase")]
pub enum SinkConnectionConfig {
    Postgres(PostgresSinkConfig),
    Mysql(MySqlSinkConfig),
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SinkConfig {
    pub connection: SinkConnectionConfig,
    #[serde(default)]
    pub auto_create_table: bool,
}

impl SinkConfig {
    pub fn new(connection: SinkConnectionConfig, auto_create_table: bool) -> Self {
        SinkConfig {
            connection,
            auto_create_table,
        }
    }

    pub fn dialect(&self) -> SinkDialect {
        match self.connection {
            SinkConnectionConfig::Postgres(_) => SinkDialect::Postgres,
            SinkConnectionConfig::Mysql(_) => SinkDialect::MySql,
        }
    }
}
