//! Stdout encoding for delivered messages.

use anyhow::Result;
use serde::Serialize;

use sluice_core::{Message, OutputFormat, META_COUNT, META_SOURCE_ADDRESS};

#[derive(Serialize)]
struct JsonLine {
    source_address: String,
    count: String,
    payload: String,
    payload_hex: String,
}

/// Encode one message as a newline-terminated record.
pub fn encode(message: &Message, format: OutputFormat) -> Result<Vec<u8>> {
    let mut out = match format {
        OutputFormat::Lines => message.payload().to_vec(),
        OutputFormat::Json => {
            serde_json::to_vec(&JsonLine {
                source_address: message.meta(META_SOURCE_ADDRESS).unwrap_or_default(),
                count: message.meta(META_COUNT).unwrap_or_default(),
                payload: String::from_utf8_lossy(message.payload()).into_owned(),
                payload_hex: hex::encode(message.payload()),
            })?
        }
    };
    out.push(b'\n');
    Ok(out)
}
