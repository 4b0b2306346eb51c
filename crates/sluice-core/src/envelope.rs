//! Message envelopes.
//!
//! An [`Envelope`] is built the moment a datagram is received and is what
//! sits in the relay queue. A [`Message`] is an envelope that has been
//! handed to the host and stamped with its sequence number.

use std::net::SocketAddr;

use bytes::Bytes;

/// Metadata key carrying the sender's `ip:port`.
pub const META_SOURCE_ADDRESS: &str = "source_address";
/// Metadata key carrying the decimal sequence number.
pub const META_COUNT: &str = "count";

/// A received datagram with its provenance. Immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    payload: Bytes,
    source: SocketAddr,
}

impl Envelope {
    /// Copy `payload` out of the receive buffer and pair it with its sender.
    pub fn build(payload: &[u8], source: SocketAddr) -> Self {
        Self {
            payload: Bytes::copy_from_slice(payload),
            source,
        }
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn source(&self) -> SocketAddr {
        self.source
    }

    /// Sender address as `ip:port` (`[ip]:port` for IPv6).
    pub fn source_address(&self) -> String {
        self.source.to_string()
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Stamp the envelope with the sequence number assigned at dequeue.
    pub fn into_message(self, sequence_number: u64) -> Message {
        Message {
            envelope: self,
            sequence_number,
        }
    }
}

/// An envelope as delivered to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    envelope: Envelope,
    sequence_number: u64,
}

impl Message {
    pub fn payload(&self) -> &Bytes {
        self.envelope.payload()
    }

    pub fn into_payload(self) -> Bytes {
        self.envelope.payload
    }

    pub fn source(&self) -> SocketAddr {
        self.envelope.source()
    }

    /// Starts at 1 and increases once per message read.
    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    /// Look up a metadata value by key.
    pub fn meta(&self, key: &str) -> Option<String> {
        match key {
            META_SOURCE_ADDRESS => Some(self.envelope.source_address()),
            META_COUNT => Some(self.sequence_number.to_string()),
            _ => None,
        }
    }

    /// All metadata pairs, in a fixed order.
    pub fn metadata(&self) -> [(&'static str, String); 2] {
        [
            (META_SOURCE_ADDRESS, self.envelope.source_address()),
            (META_COUNT, self.sequence_number.to_string()),
        ]
    }
}
