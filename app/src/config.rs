use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use snaplog::config::{CaptureConfig, SinkConfig};
use snaplog::kafka::config::KafkaConfig;
use snaplog::source::postgres::config::PostgresSourceConfig;

/// Each run mode requires only the sections it uses.
#[derive(Deserialize, Serialize, Debug)]
pub struct AppConfig {
    pub source: Option<PostgresSourceConfig>,
    #[serde(default)]
    pub capture: CaptureConfig,
    pub kafka: Option<KafkaConfig>,
    pub sink: Option<SinkConfig>,
}

impl AppConfig {
    pub fn source(&self) -> Result<&PostgresSourceConfig> {
        self.source
            .as_ref()
            .ok_or_else(|| anyhow!("missing `source` section in config"))
    }

    pub fn kafka(&self) -> Result<&KafkaConfig> {
        self.kafka
            .as_ref()
            .ok_or_else(|| anyhow!("missing `kafka` section in config"))
    }

    pub fn sink(&self) -> Result<&SinkConfig> {
        self.sink
            .as_ref()
            .ok_or_else(|| anyhow!("missing `sink` section in config"))
    }
}
