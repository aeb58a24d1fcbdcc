pub mod channel;
pub mod event_sender;
pub mod kafka;

pub use channel::{ChannelSender, KeyedEnvelope};
pub use event_sender::EventSender;
pub use kafka::KafkaSender;
