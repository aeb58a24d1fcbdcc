use crate::error::CdcResult;
use crate::event::payload::Envelope;
use crate::kafka::kafka_client::Kafka;
use crate::kafka::message::KafkaMessage;
use crate::sender::event_sender::EventSender;
use async_trait::async_trait;

/// Publishes envelopes as JSON to one topic.
pub struct KafkaSender {
    kafka: Kafka,
    topic: String,
}

impl KafkaSender {
    pub fn new(kafka: Kafka) -> Self {
        let topic = kafka.config.topic.clone();
        KafkaSender { kafka, topic }
    }
}

#[async_trait]
impl EventSender for KafkaSender {
    async fn send(&self, key: &str, envelope: &Envelope) -> CdcResult<()> {
        let message = KafkaMessage::new(self.topic.clone(), Some(key.to_string()), envelope.to_json()?);
        self.kafka.produce(message).await
    }
}
