//! sluice-input — UDP datagrams in, bounded stream of messages out.
//!
//! A background receive loop fills a fixed-capacity relay queue; the host
//! pulls messages one read at a time. The queue never makes the socket
//! wait: when it is full the newest datagram is dropped and logged.

pub mod error;
pub mod host;
pub mod input;
pub mod listener;
pub mod relay;
pub mod stats;

pub use error::{InputError, Result};
pub use host::{Ack, Input};
pub use input::{State, UdpInput};
pub use stats::StatsSnapshot;

use sluice_core::InputConfig;

/// Name the host registers this input type under.
pub const INPUT_TYPE: &str = "udp";

/// Construct a UDP input from validated configuration.
pub async fn new_input(config: InputConfig) -> Result<UdpInput> {
    UdpInput::bind(config).await
}
