use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct KafkaConfig {
    pub bootstrap_servers: String,
    pub topic: String,
    #[serde(default)]
    pub group_id: Option<String>,
}

impl KafkaConfig {
    pub fn new(bootstrap_servers: String, topic: String, group_id: Option<String>) -> Self {
        KafkaConfig {
            bootstrap_servers,
            topic,
            group_id,
        }
    }
}
