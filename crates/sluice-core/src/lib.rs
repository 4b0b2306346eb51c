//! sluice-core — configuration and message types shared by the input
//! and the daemon. No networking lives here.

pub mod config;
pub mod envelope;

pub use config::{ConfigError, InputConfig, OutputConfig, OutputFormat, SluiceConfig};
pub use envelope::{Envelope, Message, META_COUNT, META_SOURCE_ADDRESS};
