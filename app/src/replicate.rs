use anyhow::Result;
use futures::StreamExt;
use log::{error, info, warn};
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::BorrowedMessage;
use rdkafka::Message;
use snaplog::config::{SinkConfig, SinkConnectionConfig};
use snaplog::error::{CdcError, CdcResult};
use snaplog::event::payload::Envelope;
use snaplog::sender::KeyedEnvelope;
use snaplog::sink::mysql::MySqlSinkConfig;
use snaplog::sink::postgres::PostgresSinkConfig;
use snaplog::sink::Replicator;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Replicator over whichever sink backend the config names. Connections
/// are opened per table as events arrive.
pub enum ReplicaSink {
    Postgres(Replicator<PostgresSinkConfig>),
    MySql(Replicator<MySqlSinkConfig>),
}

impl ReplicaSink {
    /// Expects the dialect type map to be installed already.
    pub fn new(config: &SinkConfig) -> Result<Self> {
        let sink = match &config.connection {
            SinkConnectionConfig::Postgres(c) => {
                info!("Replicating into {}:{}/{}", c.host, c.port, c.db);
                ReplicaSink::Postgres(Replicator::new(c.clone(), config.auto_create_table)?)
            }
            SinkConnectionConfig::Mysql(c) => {
                info!("Replicating into {}:{}/{}", c.host, c.port, c.db);
                ReplicaSink::MySql(Replicator::new(c.clone(), config.auto_create_table)?)
            }
        };
        Ok(sink)
    }

    /// Applies one event. Failures are logged and returned so the caller
    /// keeps the event for another attempt.
    pub async fn apply(&mut self, envelope: &Envelope) -> CdcResult<()> {
        let result = match self {
            ReplicaSink::Postgres(replicator) => replicator.apply(envelope).await,
            ReplicaSink::MySql(replicator) => replicator.apply(envelope).await,
        };
        match &result {
            Ok(()) => {}
            Err(CdcError::NotReadyError(table)) => {
                warn!("Destination for {} is not ready", table)
            }
            Err(e) => error!(
                "Unable to apply {} event for {}: {}",
                envelope.payload.op(),
                envelope.payload.source().qualified_name(),
                e
            ),
        }
        result
    }

    pub async fn close(&mut self) {
        let result = match self {
            ReplicaSink::Postgres(replicator) => replicator.close().await,
            ReplicaSink::MySql(replicator) => replicator.close().await,
        };
        if let Err(e) = result {
            error!("Unable to release replication statements: {}", e);
        }
    }
}

/// Retries `envelope` until it is applied. Returns false when shutdown
/// is requested first.
async fn apply_until_done(
    sink: &mut ReplicaSink,
    envelope: &Envelope,
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    loop {
        if sink.apply(envelope).await.is_ok() {
            return true;
        }
        tokio::select! {
            _ = tokio::time::sleep(RETRY_DELAY) => {}
            _ = shutdown.changed() => return false,
        }
    }
}

fn decode(message: &BorrowedMessage<'_>) -> Option<Envelope> {
    let text = match message.payload().map(std::str::from_utf8) {
        Some(Ok(text)) => text,
        Some(Err(e)) => {
            error!("Skipping message at offset {}: {}", message.offset(), e);
            return None;
        }
        None => {
            warn!("Skipping empty message at offset {}", message.offset());
            return None;
        }
    };
    match Envelope::from_json(text) {
        Ok(envelope) => Some(envelope),
        Err(e) => {
            error!("Skipping malformed event at offset {}: {}", message.offset(), e);
            None
        }
    }
}

/// Applies events read from Kafka until shutdown or end of stream. An
/// offset is committed only once its event is applied or found unreadable.
pub async fn consume_kafka(
    sink: &mut ReplicaSink,
    consumer: &StreamConsumer,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut stream = consumer.stream();
    loop {
        let message = tokio::select! {
            message = stream.next() => message,
            _ = shutdown.changed() => break,
        };
        let message = match message {
            Some(Ok(message)) => message,
            Some(Err(e)) => {
                error!("Kafka error: {}", e);
                continue;
            }
            None => break,
        };

        if let Some(envelope) = decode(&message) {
            if !apply_until_done(sink, &envelope, &mut shutdown).await {
                break;
            }
        }
        if let Err(e) = consumer.commit_message(&message, CommitMode::Async) {
            error!("Unable to commit offset {}: {}", message.offset(), e);
        }
    }
}

/// Applies events handed over in process until every sender is gone or
/// shutdown is requested. Each event is acknowledged with its outcome.
pub async fn consume_channel(
    sink: &mut ReplicaSink,
    rx: &mut mpsc::Receiver<KeyedEnvelope>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let event = tokio::select! {
            event = rx.recv() => event,
            _ = shutdown.changed() => break,
        };
        match event {
            Some(event) => {
                let result = sink.apply(&event.envelope).await;
                event.acknowledge(result);
            }
            None => break,
        }
    }
}
