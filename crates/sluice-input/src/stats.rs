//! Receiver counters, shared by the receive loop and readers.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct InputStats {
    received: AtomicU64,
    dropped: AtomicU64,
    recv_errors: AtomicU64,
    delivered: AtomicU64,
}

/// Point-in-time copy of [`InputStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Datagrams read off the socket.
    pub received: u64,
    /// Datagrams discarded because the relay queue was full.
    pub dropped: u64,
    /// Failed socket reads.
    pub recv_errors: u64,
    /// Messages handed to the host.
    pub delivered: u64,
}

impl InputStats {
    pub(crate) fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_recv_error(&self) {
        self.recv_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            recv_errors: self.recv_errors.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
        }
    }
}

impl StatsSnapshot {
    /// Envelopes accepted into the relay queue.
    pub fn enqueued(&self) -> u64 {
        self.received.saturating_sub(self.dropped)
    }
}
