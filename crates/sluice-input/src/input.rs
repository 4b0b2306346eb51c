//! UDP input — lifecycle controller.
//!
//! Binding happens at construction. `connect` spawns the receive loop,
//! which moves datagrams from the socket into the relay queue without ever
//! waiting on it. `read` pulls from the queue. `close` stops the loop and
//! drops the socket; envelopes already queued are still handed out, after
//! which every read reports end of input.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::watch;

use sluice_core::{InputConfig, Message};

use crate::error::{InputError, Result};
use crate::host::{Ack, Input};
use crate::listener::{DatagramSource, SocketListener};
use crate::relay::{self, RelayReceiver, RelaySender};
use crate::stats::{InputStats, StatsSnapshot};

/// Observable lifecycle position. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Socket bound, nothing received yet.
    Created,
    /// Receive loop running.
    Running,
    /// Close in progress.
    Closing,
    Closed,
}

enum Lifecycle<S> {
    Created {
        source: S,
        relay_tx: RelaySender,
        loop_done: watch::Sender<bool>,
    },
    Running,
    Closing,
    Closed,
}

impl<S> Lifecycle<S> {
    fn state(&self) -> State {
        match self {
            Lifecycle::Created { .. } => State::Created,
            Lifecycle::Running => State::Running,
            Lifecycle::Closing => State::Closing,
            Lifecycle::Closed => State::Closed,
        }
    }
}

pub struct UdpInput<S = SocketListener> {
    config: InputConfig,
    local_addr: SocketAddr,
    relay: RelayReceiver,
    counter: AtomicU64,
    stats: Arc<InputStats>,
    shutdown: watch::Sender<bool>,
    /// Flips to true once the receive loop has returned and dropped the source.
    loop_done: watch::Receiver<bool>,
    lifecycle: Mutex<Lifecycle<S>>,
}

impl UdpInput<SocketListener> {
    /// Validate `config` and bind the socket. A failure here means the
    /// input never exists.
    pub async fn bind(config: InputConfig) -> Result<Self> {
        config.validate()?;
        let listener = SocketListener::bind(&config).await?;
        Self::with_source(config, listener)
    }
}

impl<S: DatagramSource> UdpInput<S> {
    /// Build an input around an already-open datagram source.
    pub fn with_source(config: InputConfig, source: S) -> Result<Self> {
        config.validate()?;
        let local_addr = source.local_addr();
        let (relay_tx, relay) = relay::channel(config.max_in_flight);
        let (shutdown, _) = watch::channel(false);
        let (loop_done_tx, loop_done) = watch::channel(false);

        Ok(Self {
            config,
            local_addr,
            relay,
            counter: AtomicU64::new(0),
            stats: Arc::new(InputStats::default()),
            shutdown,
            loop_done,
            lifecycle: Mutex::new(Lifecycle::Created {
                source,
                relay_tx,
                loop_done: loop_done_tx,
            }),
        })
    }

    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    /// Address the socket is bound to, with the real port if 0 was asked for.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// How many reads the host may usefully run at once.
    pub fn max_in_flight(&self) -> usize {
        self.config.max_in_flight
    }

    pub fn state(&self) -> State {
        self.lifecycle().state()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Spawn the receive loop. A second call while running does nothing.
    pub async fn connect(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle();
        match std::mem::replace(&mut *lifecycle, Lifecycle::Closing) {
            Lifecycle::Created {
                source,
                relay_tx,
                loop_done,
            } => {
                let receive = receive_loop(
                    source,
                    relay_tx,
                    self.config.max_buffer_size,
                    self.stats.clone(),
                    self.shutdown.subscribe(),
                );
                tokio::spawn(async move {
                    receive.await;
                    loop_done.send_replace(true);
                });
                *lifecycle = Lifecycle::Running;
                tracing::info!(
                    addr = %self.local_addr,
                    max_in_flight = self.config.max_in_flight,
                    "udp input connected"
                );
                Ok(())
            }
            Lifecycle::Running => {
                *lifecycle = Lifecycle::Running;
                tracing::debug!(addr = %self.local_addr, "connect called while running, ignoring");
                Ok(())
            }
            other => {
                *lifecycle = other;
                Err(InputError::Closed)
            }
        }
    }

    /// Wait for the next message.
    pub async fn read(&self) -> Result<(Message, Ack)> {
        self.read_with(std::future::pending::<()>()).await
    }

    /// Wait for the next message, giving up with `Cancelled` after `timeout`.
    pub async fn read_timeout(&self, timeout: Duration) -> Result<(Message, Ack)> {
        self.read_with(tokio::time::sleep(timeout)).await
    }

    /// Wait for the next message until `cancel` completes.
    ///
    /// A cancelled read consumes nothing. Once the input is closed and the
    /// queue is empty this returns `EndOfInput`, immediately and forever.
    pub async fn read_with<C>(&self, cancel: C) -> Result<(Message, Ack)>
    where
        C: Future,
    {
        let dequeue = self.relay.dequeue_with(|envelope| {
            let count = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            envelope.into_message(count)
        });

        tokio::select! {
            biased;

            _ = cancel => Err(InputError::Cancelled),

            message = dequeue => match message {
                Some(message) => {
                    self.stats.record_delivered();
                    let ack = Ack::new(message.sequence_number());
                    Ok((message, ack))
                }
                None => Err(InputError::EndOfInput),
            },
        }
    }

    /// Stop the receive loop and release the socket. Idempotent.
    ///
    /// Every caller returns only after the socket is released, including
    /// one that arrives while another close is in progress or after an
    /// earlier close future was dropped.
    pub async fn close(&self) -> Result<()> {
        {
            let mut lifecycle = self.lifecycle();
            match std::mem::replace(&mut *lifecycle, Lifecycle::Closing) {
                Lifecycle::Created {
                    source,
                    relay_tx,
                    loop_done,
                } => {
                    // Never connected: dropping the only sender ends pending reads.
                    drop(source);
                    drop(relay_tx);
                    loop_done.send_replace(true);
                }
                Lifecycle::Running | Lifecycle::Closing => {}
                Lifecycle::Closed => {
                    *lifecycle = Lifecycle::Closed;
                    return Ok(());
                }
            }
        }

        self.shutdown.send_replace(true);

        let mut loop_done = self.loop_done.clone();
        let finished = loop_done.wait_for(|done| *done).await.is_ok();
        if !finished {
            tracing::warn!("receive loop ended abnormally");
        }

        let mut lifecycle = self.lifecycle();
        if let Lifecycle::Closing = *lifecycle {
            *lifecycle = Lifecycle::Closed;
            let stats = self.stats.snapshot();
            tracing::info!(
                addr = %self.local_addr,
                received = stats.received,
                dropped = stats.dropped,
                delivered = stats.delivered,
                "udp input closed"
            );
        }
        Ok(())
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle<S>> {
        self.lifecycle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<S> Drop for UdpInput<S> {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
    }
}

impl<S: DatagramSource> Input for UdpInput<S> {
    fn connect(&self) -> impl Future<Output = Result<()>> + Send {
        UdpInput::<S>::connect(self)
    }

    fn read(&self) -> impl Future<Output = Result<(Message, Ack)>> + Send {
        UdpInput::<S>::read(self)
    }

    fn close(&self) -> impl Future<Output = Result<()>> + Send {
        UdpInput::<S>::close(self)
    }
}

/// Socket → envelope → relay queue, until shutdown.
///
/// Failed reads are logged and skipped. A full queue drops the datagram.
async fn receive_loop<S: DatagramSource>(
    source: S,
    relay: RelaySender,
    buffer_size: usize,
    stats: Arc<InputStats>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut buf = vec![0u8; buffer_size];

    tracing::info!(
        addr = %source.local_addr(),
        buffer_size,
        capacity = relay.capacity(),
        "receive loop starting"
    );

    loop {
        tokio::select! {
            biased;

            _ = shutdown.wait_for(|closed| *closed) => {
                tracing::info!(queued = relay.len(), "receive loop shutting down");
                return;
            }

            result = source.recv_datagram(&mut buf) => {
                let envelope = match result {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        stats.record_recv_error();
                        tracing::warn!(error = %e, "recv_from failed");
                        continue;
                    }
                };
                stats.record_received();

                let from = envelope.source();
                let len = envelope.len();
                match relay.try_enqueue(envelope) {
                    Ok(()) => {
                        tracing::trace!(source = %from, len, "datagram queued");
                    }
                    Err(TrySendError::Full(_)) => {
                        stats.record_dropped();
                        tracing::error!(
                            source = %from,
                            len,
                            capacity = relay.capacity(),
                            "relay queue full, dropping datagram"
                        );
                    }
                    Err(TrySendError::Closed(_)) => {
                        tracing::debug!("relay queue closed, receive loop exiting");
                        return;
                    }
                }
            }
        }
    }
}
