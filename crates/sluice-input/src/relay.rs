//! Bounded relay queue between the receive loop and readers.
//!
//! Capacity is fixed at creation. The producer side never waits: a full
//! queue rejects the envelope and the caller decides what to log. The
//! consumer side is shared by concurrent readers; the receiver sits behind
//! a fair mutex so blocked readers are served in arrival order.

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};

use sluice_core::Envelope;

/// Create a relay queue holding at most `capacity` envelopes.
///
/// Panics if `capacity` is zero.
pub fn channel(capacity: usize) -> (RelaySender, RelayReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        RelaySender { tx },
        RelayReceiver {
            rx: Mutex::new(rx),
            capacity,
        },
    )
}

#[derive(Debug, Clone)]
pub struct RelaySender {
    tx: mpsc::Sender<Envelope>,
}

impl RelaySender {
    /// Enqueue without waiting. The envelope comes back inside the error
    /// when the queue is full or every reader is gone.
    pub fn try_enqueue(&self, envelope: Envelope) -> Result<(), TrySendError<Envelope>> {
        self.tx.try_send(envelope)
    }

    /// Envelopes currently queued.
    pub(crate) fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}

#[derive(Debug)]
pub struct RelayReceiver {
    rx: Mutex<mpsc::Receiver<Envelope>>,
    capacity: usize,
}

impl RelayReceiver {
    /// Wait for the next envelope. `None` once every sender is dropped and
    /// the queue is drained.
    ///
    /// Cancel safe: dropping the future never loses an envelope.
    pub async fn dequeue(&self) -> Option<Envelope> {
        self.dequeue_with(|envelope| envelope).await
    }

    /// Like [`dequeue`](Self::dequeue), but runs `f` while still holding
    /// the consumer lock, so anything `f` assigns follows dequeue order.
    pub async fn dequeue_with<T>(&self, f: impl FnOnce(Envelope) -> T) -> Option<T> {
        let mut rx = self.rx.lock().await;
        rx.recv().await.map(f)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
