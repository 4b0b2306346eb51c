//! UDP socket listener.
//!
//! Resolves the configured address, binds a non-blocking socket through
//! socket2 and hands it to tokio. Each receive copies the datagram out of
//! the caller's buffer into a fresh [`Envelope`].

use std::future::Future;
use std::net::SocketAddr;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

use sluice_core::{Envelope, InputConfig};

use crate::error::{InputError, Result};

/// Where the receive loop gets datagrams from.
///
/// [`SocketListener`] is the real one; anything else exists to drive the
/// loop without a network.
pub trait DatagramSource: Send + Sync + 'static {
    fn local_addr(&self) -> SocketAddr;

    /// Wait for the next datagram, truncated to `buf.len()`.
    fn recv_datagram(
        &self,
        buf: &mut [u8],
    ) -> impl Future<Output = std::io::Result<Envelope>> + Send;
}

#[derive(Debug)]
pub struct SocketListener {
    socket: UdpSocket,
    local_addr: SocketAddr,
}

impl SocketListener {
    /// Resolve and bind `config.address`. Must be called inside a tokio runtime.
    pub async fn bind(config: &InputConfig) -> Result<Self> {
        let addr = resolve(&config.address).await?;

        let bind_err = |source| InputError::Bind {
            address: config.address.clone(),
            source,
        };
        let socket = make_socket(addr, config.socket_recv_buffer).map_err(bind_err)?;
        let socket = UdpSocket::from_std(socket).map_err(bind_err)?;
        let local_addr = socket.local_addr().map_err(bind_err)?;

        tracing::info!(addr = %local_addr, "udp socket bound");
        Ok(Self { socket, local_addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait for the next datagram. `buf` bounds the payload size; anything
    /// past its length is truncated by the OS.
    pub async fn recv_datagram(&self, buf: &mut [u8]) -> std::io::Result<Envelope> {
        let (len, from) = self.socket.recv_from(buf).await?;
        Ok(Envelope::build(&buf[..len], from))
    }
}

impl DatagramSource for SocketListener {
    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn recv_datagram(
        &self,
        buf: &mut [u8],
    ) -> impl Future<Output = std::io::Result<Envelope>> + Send {
        SocketListener::recv_datagram(self, buf)
    }
}

/// First socket address `address` resolves to.
async fn resolve(address: &str) -> Result<SocketAddr> {
    let mut addrs = tokio::net::lookup_host(address)
        .await
        .map_err(|source| InputError::Resolve {
            address: address.to_string(),
            source,
        })?;
    addrs.next().ok_or_else(|| InputError::NoAddress {
        address: address.to_string(),
    })
}

fn make_socket(
    addr: SocketAddr,
    recv_buffer: Option<usize>,
) -> std::io::Result<std::net::UdpSocket> {
    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))?;

    // [::]:port accepts IPv4 too
    if addr.is_ipv6() && addr.ip().is_unspecified() {
        socket.set_only_v6(false)?;
    }
    if let Some(size) = recv_buffer {
        socket.set_recv_buffer_size(size)?;
    }
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;

    Ok(socket.into())
}
