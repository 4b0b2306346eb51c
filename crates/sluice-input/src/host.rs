//! Host-facing contract.
//!
//! The pipeline that drives an input only ever sees this trait: one
//! `connect`, any number of `read`s, one `close`. Implementations own all
//! concurrency behind it.

use std::future::Future;

use sluice_core::Message;

use crate::error::Result;

pub trait Input: Send + Sync {
    /// Start producing messages. Returns once production has started.
    fn connect(&self) -> impl Future<Output = Result<()>> + Send;

    /// Next message and its acknowledgement handle.
    ///
    /// Fails with `EndOfInput` once no further message will ever arrive;
    /// the host must stop reading after that.
    fn read(&self) -> impl Future<Output = Result<(Message, Ack)>> + Send;

    /// Stop producing and release resources. Safe to call more than once.
    fn close(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Acknowledgement for one delivered message.
///
/// UDP has no redelivery, so acknowledging always succeeds and a negative
/// acknowledgement changes nothing.
#[derive(Debug)]
#[must_use = "acknowledge each message once the host is done with it"]
pub struct Ack {
    sequence_number: u64,
}

impl Ack {
    pub(crate) fn new(sequence_number: u64) -> Self {
        Self { sequence_number }
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    /// Report the host's outcome for the message. `error` is `Some` when
    /// processing failed.
    pub fn ack(self, error: Option<&(dyn std::error::Error + 'static)>) -> Result<()> {
        if let Some(e) = error {
            tracing::debug!(
                count = self.sequence_number,
                error = %e,
                "message nacked, udp cannot redeliver"
            );
        }
        Ok(())
    }
}
