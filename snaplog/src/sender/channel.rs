use crate::error::{CdcError, CdcResult};
use crate::event::payload::Envelope;
use crate::sender::event_sender::EventSender;
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

/// A keyed event travelling through the in-process channel.
#[derive(Debug)]
pub struct KeyedEnvelope {
    pub key: String,
    pub envelope: Envelope,
    ack: Option<oneshot::Sender<CdcResult<()>>>,
}

impl KeyedEnvelope {
    pub fn new(key: &str, envelope: Envelope) -> Self {
        KeyedEnvelope {
            key: key.to_string(),
            envelope,
            ack: None,
        }
    }

    /// Reports the outcome of handling this event to the sender. Has no
    /// effect for events from an unacknowledged channel.
    pub fn acknowledge(mut self, result: CdcResult<()>) {
        if let Some(ack) = self.ack.take() {
            // a sender that stopped waiting has already failed its cycle
            let _ = ack.send(result);
        }
    }
}

/// Hands events to an in-process consumer. On an acknowledged channel
/// `send` returns only once the consumer has acknowledged the event, and
/// fails if it was rejected or dropped unacknowledged.
pub struct ChannelSender {
    tx: mpsc::Sender<KeyedEnvelope>,
    acknowledged: bool,
}

impl ChannelSender {
    pub fn new(tx: mpsc::Sender<KeyedEnvelope>) -> Self {
        ChannelSender { tx, acknowledged: false }
    }

    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<KeyedEnvelope>) {
        let (tx, rx) = mpsc::channel(capacity);
        (ChannelSender::new(tx), rx)
    }

    pub fn acknowledged(capacity: usize) -> (Self, mpsc::Receiver<KeyedEnvelope>) {
        let (tx, rx) = mpsc::channel(capacity);
        (ChannelSender { tx, acknowledged: true }, rx)
    }
}

impl Clone for ChannelSender {
    fn clone(&self) -> Self {
        ChannelSender {
            tx: self.tx.clone(),
            acknowledged: self.acknowledged,
        }
    }
}

#[async_trait]
impl EventSender for ChannelSender {
    async fn send(&self, key: &str, envelope: &Envelope) -> CdcResult<()> {
        let mut event = KeyedEnvelope::new(key, envelope.clone());
        let done = if self.acknowledged {
            let (ack, done) = oneshot::channel();
            event.ack = Some(ack);
            Some(done)
        } else {
            None
        };

        self.tx
            .send(event)
            .await
            .map_err(|_| CdcError::SendError(format!("channel closed, dropping {}", key)))?;

        match done {
            None => Ok(()),
            Some(done) => match done.await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(CdcError::SendError(format!("{} was rejected: {}", key, e))),
                Err(_) => Err(CdcError::SendError(format!("{} was dropped unacknowledged", key))),
            },
        }
    }
}
