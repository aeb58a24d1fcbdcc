mod args;
mod capture;
mod config;
mod replicate;
mod yaml;

use anyhow::Result;
use args::{Args, Mode};
use clap::Parser;
use config::AppConfig;
use log::{error, info};
use replicate::ReplicaSink;
use snaplog::dialect::install;
use snaplog::kafka::kafka_client::Kafka;
use snaplog::sender::{ChannelSender, KafkaSender};
use std::sync::Arc;
use tokio::sync::watch;

const CHANNEL_CAPACITY: usize = 1024;

async fn run_capture(config: &AppConfig, shutdown: watch::Receiver<bool>) -> Result<()> {
    let kafka = Kafka::new(config.kafka()?)?;
    let sender = Arc::new(KafkaSender::new(kafka));
    let handles = capture::spawn_capture(config.source()?, &config.capture, sender, shutdown).await?;
    futures::future::join_all(handles).await;
    Ok(())
}

async fn run_replicate(config: &AppConfig, shutdown: watch::Receiver<bool>) -> Result<()> {
    let sink_config = config.sink()?;
    install(sink_config.dialect())?;
    let consumer = Kafka::new(config.kafka()?)?.stream_consumer()?;
    let mut sink = ReplicaSink::new(sink_config)?;

    replicate::consume_kafka(&mut sink, &consumer, shutdown).await;
    sink.close().await;
    Ok(())
}

async fn run_standalone(config: &AppConfig, shutdown: watch::Receiver<bool>) -> Result<()> {
    let sink_config = config.sink()?;
    install(sink_config.dialect())?;
    let mut sink = ReplicaSink::new(sink_config)?;

    // capture keeps its log rows until the replica acknowledges each event
    let (sender, mut rx) = ChannelSender::acknowledged(CHANNEL_CAPACITY);
    let handles = capture::spawn_capture(
        config.source()?,
        &config.capture,
        Arc::new(sender),
        shutdown.clone(),
    )
    .await?;

    replicate::consume_channel(&mut sink, &mut rx, shutdown).await;
    // unblocks capture tasks waiting on the channel or an acknowledgement
    drop(rx);
    futures::future::join_all(handles).await;
    sink.close().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = yaml::load_config(&args.config)?;
    info!("Starting snaplog in {:?} mode", args.mode);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown requested"),
            Err(e) => error!("Unable to listen for ctrl-c: {}", e),
        }
        if shutdown_tx.send(true).is_err() {
            info!("Nothing left to stop");
        }
    });

    match args.mode {
        Mode::Capture => run_capture(&config, shutdown_rx).await,
        Mode::Replicate => run_replicate(&config, shutdown_rx).await,
        Mode::Standalone => run_standalone(&config, shutdown_rx).await,
    }
}
