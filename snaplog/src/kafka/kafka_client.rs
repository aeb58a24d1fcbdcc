use crate::error::CdcResult;
use crate::kafka::config::KafkaConfig;
use crate::kafka::message::KafkaMessage;
use log::debug;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::producer::{FutureProducer, FutureRecord};
use std::time::Duration;
use uuid::Uuid;

pub struct Kafka {
    pub config: KafkaConfig,
    pub producer: FutureProducer,
}

impl Kafka {
    pub fn new(config: &KafkaConfig) -> CdcResult<Self> {
        let mut producer_config = ClientConfig::new();
        producer_config.set("bootstrap.servers", &config.bootstrap_servers);
        producer_config.set("message.timeout.ms", "30000");
        let producer: FutureProducer = producer_config.create()?;

        Ok(Kafka {
            config: config.clone(),
            producer,
        })
    }

    pub async fn produce(&self, message: KafkaMessage) -> CdcResult<()> {
        let topic = &message.topic;
        let value = &message.value;
        let key = &message.key.unwrap_or_default();
        let mut record = FutureRecord::to(topic).payload(value);

        if !key.is_empty() {
            record = record.key(key);
        }

        let status = self.producer.send(record, Duration::from_secs(0)).await;
        match status {
            Ok(delivery_status) => {
                debug!("Send success - {} {} {:?}", topic, key, delivery_status);
                Ok(())
            }
            Err((err, _)) => {
                debug!("Send failed - {} {}: {:?}", topic, key, err);
                Err(err.into())
            }
        }
    }

    /// Consumer settings. Offsets are committed by the caller once an event
    /// has been applied, never automatically.
    pub fn consumer_config(&self) -> ClientConfig {
        let group_id = self
            .config
            .group_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut config = ClientConfig::new();
        config.set("group.id", group_id);
        config.set("bootstrap.servers", &self.config.bootstrap_servers);
        config.set("auto.offset.reset", "smallest");
        config.set("enable.auto.commit", "false");
        config
    }

    /// Consumer subscribed to the configured topic. Without a configured
    /// group id every run reads the topic from the beginning.
    pub fn stream_consumer(&self) -> CdcResult<StreamConsumer> {
        let consumer: StreamConsumer = self.consumer_config().create()?;
        consumer.subscribe(&[self.config.topic.as_str()])?;
        Ok(consumer)
    }
}
