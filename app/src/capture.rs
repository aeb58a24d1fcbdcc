use anyhow::Result;
use log::{error, info, warn};
use snaplog::config::CaptureConfig;
use snaplog::error::CdcResult;
use snaplog::sender::EventSender;
use snaplog::source::postgres::{PostgresSourceConfig, PostgresSourceConnection};
use snaplog::source::{SnapshotLog, SourceConnection};
use snaplog::table::CaptureTable;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Discovers the configured snapshot logs and starts one polling task per
/// table, each with its own source connection.
pub async fn spawn_capture<S>(
    source: &PostgresSourceConfig,
    capture: &CaptureConfig,
    sender: Arc<S>,
    shutdown: watch::Receiver<bool>,
) -> Result<Vec<JoinHandle<()>>>
where
    S: EventSender + 'static,
{
    let mut conn = PostgresSourceConnection::connect(source).await?;
    let logs = conn
        .snapshot_logs(capture.owner.as_deref(), &capture.tables)
        .await?;
    if logs.is_empty() {
        warn!(
            "No snapshot logs found on {}:{}/{}",
            source.host, source.port, source.db
        );
    }

    let period = Duration::from_millis(capture.poll_interval_ms.max(1));
    let mut handles = vec![];
    for log in logs {
        let source = source.clone();
        let sender = sender.clone();
        let shutdown = shutdown.clone();
        let batch_size = capture.batch_size;
        handles.push(tokio::spawn(async move {
            let name = format!("{}.{}", log.owner, log.master_table);
            if let Err(e) = capture_table(&source, &log, batch_size, period, sender, shutdown).await {
                error!("Capture of {} stopped: {}", name, e);
            }
        }));
    }
    Ok(handles)
}

async fn capture_table<S: EventSender>(
    source: &PostgresSourceConfig,
    log: &SnapshotLog,
    batch_size: usize,
    period: Duration,
    sender: Arc<S>,
    mut shutdown: watch::Receiver<bool>,
) -> CdcResult<()> {
    let mut conn = PostgresSourceConnection::connect(source).await?;
    let table = CaptureTable::new(&mut conn, log, batch_size).await?;

    let mut ticker = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = table.poll(&mut conn, sender.as_ref()).await {
                    error!(
                        "Poll of {}.{} failed, retrying on next tick: {}",
                        table.owner(),
                        table.table_name(),
                        e
                    );
                }
            }
            _ = shutdown.changed() => break,
        }
    }
    info!("Capture of {}.{} stopped", table.owner(), table.table_name());
    Ok(())
}
