//! In-memory datagram channel for testing.
//!
//! Implements the channel trait over shared queues, with an optional echo
//! mode that reflects every sent datagram back as a received one.

use std::collections::VecDeque;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use vport_core::channel::DatagramChannel;
use vport_core::Result;

/// In-memory datagram channel.
///
/// Sent datagrams are recorded for inspection; in echo mode they are also
/// queued back as inbound, simulating a peer that reflects all traffic.
/// Clones share state.
#[derive(Debug)]
pub struct LoopbackChannel {
    /// The pretend peer address.
    peer: SocketAddr,
    /// Datagrams pending receipt.
    inbound: Arc<Mutex<VecDeque<Vec<u8>>>>,
    /// Record of every sent datagram.
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    /// Wakes pending receives.
    notify: Arc<Notify>,
    /// Whether sends are echoed back as receives.
    echo: bool,
}

impl LoopbackChannel {
    /// Create a channel that only records sends.
    pub fn new() -> Self {
        Self {
            peer: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 4789),
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
            echo: false,
        }
    }

    /// Create a channel that echoes every sent datagram back.
    pub fn echoing() -> Self {
        Self {
            echo: true,
            ..Self::new()
        }
    }

    /// Inject a datagram as if received from the peer.
    pub fn inject_datagram(&self, datagram: Vec<u8>) {
        self.inbound.lock().unwrap().push_back(datagram);
        self.notify.notify_one();
    }

    /// Get all sent datagrams so far.
    pub fn sent_datagrams(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }

    /// Count sent datagrams.
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl Default for LoopbackChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoopbackChannel {
    fn clone(&self) -> Self {
        Self {
            peer: self.peer,
            inbound: Arc::clone(&self.inbound),
            sent: Arc::clone(&self.sent),
            notify: Arc::clone(&self.notify),
            echo: self.echo,
        }
    }
}

impl DatagramChannel for LoopbackChannel {
    async fn send(&self, datagram: &[u8]) -> Result<()> {
        self.sent.lock().unwrap().push(datagram.to_vec());
        if self.echo {
            self.inject_datagram(datagram.to_vec());
        }
        Ok(())
    }

    async fn recv(&self) -> Result<(Vec<u8>, SocketAddr)> {
        loop {
            let notified = self.notify.notified();
            if let Some(datagram) = self.inbound.lock().unwrap().pop_front() {
                return Ok((datagram, self.peer));
            }
            notified.await;
        }
    }

    fn peer(&self) -> SocketAddr {
        self.peer
    }
}

// =============================================================================
// Tests
// =============================================================================
