use crate::error::CdcResult;
use crate::event::payload::Envelope;
use async_trait::async_trait;

/// Hands a change event downstream under the given message key.
#[async_trait]
pub trait EventSender: Send + Sync {
    async fn send(&self, key: &str, envelope: &Envelope) -> CdcResult<()>;
}
