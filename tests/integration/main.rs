//! Sluice integration test harness.
//!
//! Every test binds its own input on 127.0.0.1:0 and sends real UDP
//! datagrams over loopback. No privileges or external setup needed.

use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use anyhow::{bail, Context, Result};

use sluice_core::InputConfig;
use sluice_input::{StatsSnapshot, UdpInput};

mod backpressure;
mod delivery;

// ── Harness ───────────────────────────────────────────────────────────────────

/// Upper bound on any wait in these tests.
pub const WAIT: Duration = Duration::from_secs(5);

/// Bind an input on an ephemeral loopback port.
pub async fn loopback_input(max_in_flight: usize) -> Result<UdpInput> {
    let config = InputConfig::new("127.0.0.1:0")
        .with_max_buffer_size(10_000)
        .with_max_in_flight(max_in_flight);
    UdpInput::bind(config)
        .await
        .context("failed to bind loopback input")
}

/// A plain blocking sender on its own ephemeral port.
pub fn sender() -> Result<UdpSocket> {
    UdpSocket::bind("127.0.0.1:0").context("failed to bind sender")
}

pub fn send_all(sender: &UdpSocket, to: SocketAddr, payloads: &[&[u8]]) -> Result<()> {
    for payload in payloads {
        sender
            .send_to(payload, to)
            .with_context(|| format!("send_to {to} failed"))?;
    }
    Ok(())
}

/// Poll the input's counters until `cond` holds or [`WAIT`] elapses.
pub async fn wait_for_stats(
    input: &UdpInput,
    cond: impl Fn(&StatsSnapshot) -> bool,
) -> Result<StatsSnapshot> {
    let deadline = tokio::time::Instant::now() + WAIT;
    loop {
        let stats = input.stats();
        if cond(&stats) {
            return Ok(stats);
        }
        if tokio::time::Instant::now() >= deadline {
            bail!("timed out waiting for stats, last seen {stats:?}");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
