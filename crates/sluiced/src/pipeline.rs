//! Drives an input through its lifecycle and writes each message out.

use anyhow::{Context, Result};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use sluice_core::OutputFormat;
use sluice_input::Input;

use crate::output;

/// Connect, read until end of input, acknowledge every message.
/// Returns how many messages were written.
pub async fn run<I, W>(input: &I, format: OutputFormat, mut out: W) -> Result<u64>
where
    I: Input,
    W: AsyncWrite + Unpin,
{
    input.connect().await.context("failed to connect input")?;

    let mut written = 0u64;
    loop {
        let (message, ack) = match input.read().await {
            Ok(r) => r,
            Err(e) if e.is_end_of_input() => {
                tracing::info!(written, "end of input");
                break;
            }
            Err(e) => return Err(e).context("read failed"),
        };

        let record = output::encode(&message, format)?;
        let result = out.write_all(&record).await;
        ack.ack(
            result
                .as_ref()
                .err()
                .map(|e| e as &(dyn std::error::Error + 'static)),
        )?;
        result.context("failed to write message")?;
        written += 1;
    }

    out.flush().await.context("failed to flush output")?;
    Ok(written)
}
