use clap::{Parser, ValueEnum};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Poll snapshot logs and publish change events to Kafka
    Capture,
    /// Consume change events from Kafka and apply them to the sink
    Replicate,
    /// Capture and replicate in one process without Kafka
    Standalone,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[arg(value_enum, default_value = "standalone")]
    pub mode: Mode,

    #[arg(short, long, default_value = "snaplog.yaml")]
    pub config: String,
}
