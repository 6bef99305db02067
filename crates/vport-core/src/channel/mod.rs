//! Datagram channel to the single fixed peer.
//!
//! One envelope maps to exactly one datagram; there is no fragmentation,
//! ordering, or delivery guarantee. The peer address is fixed at open time
//! and never changes for the process lifetime.

mod udp;

pub use udp::UdpChannel;

use std::net::SocketAddr;

use crate::error::Result;

/// Trait for best-effort datagram channel implementations.
#[allow(async_fn_in_trait)]
pub trait DatagramChannel: Send {
    /// Send one datagram to the configured peer. Best-effort.
    async fn send(&self, datagram: &[u8]) -> Result<()>;

    /// Receive one datagram, reporting the sender address.
    ///
    /// Fails with `CapacityExceeded` when a datagram does not fit the
    /// fixed receive buffer; the datagram is consumed either way.
    async fn recv(&self) -> Result<(Vec<u8>, SocketAddr)>;

    /// The configured peer address.
    fn peer(&self) -> SocketAddr;
}
