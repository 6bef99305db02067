//! UDP implementation of the datagram channel.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::net::UdpSocket;

use super::DatagramChannel;
use crate::constants::MAX_DATAGRAM_SIZE;
use crate::error::{Error, Result};

/// One unconnected UDP socket addressed to a single fixed peer.
pub struct UdpChannel {
    socket: UdpSocket,
    peer: SocketAddr,
}

impl UdpChannel {
    /// Bind an ephemeral local port matching the peer's address family.
    ///
    /// # Errors
    ///
    /// Returns `Socket` if the host cannot allocate or bind the socket.
    pub async fn open(peer: SocketAddr) -> Result<Self> {
        let local: SocketAddr = if peer.is_ipv4() {
            (IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0).into()
        } else {
            (IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0).into()
        };

        let socket = UdpSocket::bind(local).await.map_err(Error::Socket)?;
        Ok(UdpChannel { socket, peer })
    }

    /// The local address the socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(Error::Socket)
    }
}

impl DatagramChannel for UdpChannel {
    async fn send(&self, datagram: &[u8]) -> Result<()> {
        if datagram.len() > MAX_DATAGRAM_SIZE {
            return Err(Error::CapacityExceeded {
                len: datagram.len(),
                max: MAX_DATAGRAM_SIZE,
            });
        }
        self.socket.send_to(datagram, self.peer).await?;
        Ok(())
    }

    async fn recv(&self) -> Result<(Vec<u8>, SocketAddr)> {
        // One probe byte past capacity distinguishes "exactly full" from
        // a kernel-truncated oversized datagram.
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE + 1];
        let (n, from) = self.socket.recv_from(&mut buf).await?;
        if n > MAX_DATAGRAM_SIZE {
            return Err(Error::CapacityExceeded {
                len: n,
                max: MAX_DATAGRAM_SIZE,
            });
        }
        buf.truncate(n);
        Ok((buf, from))
    }

    fn peer(&self) -> SocketAddr {
        self.peer
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    async fn loopback_pair() -> (UdpChannel, UdpChannel) {
        // Bind both ends first, then point each at the other.
        let probe_a = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let probe_b = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr_a = probe_a.local_addr().unwrap();
        let addr_b = probe_b.local_addr().unwrap();

        let a = UdpChannel {
            socket: probe_a,
            peer: addr_b,
        };
        let b = UdpChannel {
            socket: probe_b,
            peer: addr_a,
        };
        (a, b)
    }

    #[tokio::test]
    async fn open_binds_matching_family() {
        let peer: SocketAddr = "127.0.0.1:7000".parse().unwrap();
        let channel = UdpChannel::open(peer).await.unwrap();
        assert!(channel.local_addr().unwrap().is_ipv4());
        assert_eq!(channel.peer(), peer);

        let peer6: SocketAddr = "[::1]:7000".parse().unwrap();
        let channel6 = UdpChannel::open(peer6).await.unwrap();
        assert!(channel6.local_addr().unwrap().is_ipv6());
    }

    #[tokio::test]
    async fn send_and_receive_one_datagram() {
        let (a, b) = loopback_pair().await;

        a.send(b"{\"payload\":\"TWFu\"}").await.unwrap();
        let (datagram, from) = b.recv().await.unwrap();
        assert_eq!(datagram, b"{\"payload\":\"TWFu\"}");
        assert_eq!(from, b.peer());
    }

    #[tokio::test]
    async fn send_rejects_oversized_datagram() {
        let (a, _b) = loopback_pair().await;
        let oversized = vec![0u8; MAX_DATAGRAM_SIZE + 1];
        let err = a.send(&oversized).await.unwrap_err();
        assert!(matches!(err, Error::CapacityExceeded { .. }));
    }
}
