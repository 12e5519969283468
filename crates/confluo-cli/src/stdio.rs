// JSON lines transport between a host and the engine actor

use anyhow::Result;
use confluo_core::{Engine, EngineConfig, EngineHandle, MarkdownFenceDetector};
use confluo_protocol::{Inbound, Outbound};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

/// Engine with the built-in subscope detectors registered
///
/// Also returns the messages the host needs before the first request.
pub fn build_engine(config: EngineConfig) -> (Engine, Vec<Outbound>) {
    let mut engine = Engine::new(config);
    let prelude = engine
        .register_detector(Arc::new(MarkdownFenceDetector::new()))
        .into_iter()
        .collect();
    (engine, prelude)
}

/// Pump messages until `reader` hits EOF; returns the writer once drained
pub async fn serve<R, W>(engine: Engine, prelude: Vec<Outbound>, reader: R, writer: W) -> Result<W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (handle, mut outbox) = EngineHandle::spawn(engine);

    let writer_task = tokio::spawn(async move {
        let mut writer = writer;
        for message in &prelude {
            write_message(&mut writer, message).await?;
        }
        while let Some(message) = outbox.recv().await {
            write_message(&mut writer, &message).await?;
        }
        Ok::<W, anyhow::Error>(writer)
    });

    let mut lines = reader.lines();
    let mut received = 0usize;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Inbound>(line) {
            Ok(message) => {
                received += 1;
                handle.send(message)?;
            }
            Err(err) => warn!("skipping malformed message: {}", err),
        }
    }

    debug!("input closed after {} messages", received);
    handle.shutdown().await?;
    let writer = writer_task.await??;
    info!("engine stopped");
    Ok(writer)
}

async fn write_message<W>(writer: &mut W, message: &Outbound) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
