//! The bidirectional relay between the virtual interface and the channel.

use std::net::SocketAddr;

use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use super::state::RelayState;
use crate::channel::DatagramChannel;
use crate::device::PortDevice;
use crate::envelope::EnvelopeCodec;
use crate::error::{Error, Result};

/// Statistics tracked by the relay.
#[derive(Debug, Clone, Default)]
pub struct RelayStats {
    /// Frames captured from the device and sent as envelopes.
    pub frames_captured: u64,
    /// Frames recovered from envelopes and injected into the device.
    pub frames_injected: u64,
    /// Frames dropped due to frame-local errors.
    pub frames_dropped: u64,
    /// Raw frame bytes captured.
    pub bytes_captured: u64,
    /// Raw frame bytes injected.
    pub bytes_injected: u64,
}

impl RelayStats {
    /// Record a captured frame.
    pub fn record_captured(&mut self, size: usize) {
        self.frames_captured += 1;
        self.bytes_captured += size as u64;
    }

    /// Record an injected frame.
    pub fn record_injected(&mut self, size: usize) {
        self.frames_injected += 1;
        self.bytes_injected += size as u64;
    }

    /// Record a dropped frame.
    pub fn record_dropped(&mut self) {
        self.frames_dropped += 1;
    }
}

/// One readiness event observed by the relay loop.
enum Event {
    /// The device produced a frame (or failed reading one).
    Captured(Result<Vec<u8>>),
    /// The channel produced a datagram (or failed receiving one).
    Received(Result<(Vec<u8>, SocketAddr)>),
    /// Shutdown was requested.
    Shutdown,
}

/// Bidirectional relay owning the device and channel for its lifetime.
///
/// Single-threaded by construction: one loop owns both handles and both
/// traffic directions, so there is no concurrent mutation anywhere.
pub struct Relay<D: PortDevice, C: DatagramChannel> {
    device: D,
    channel: C,
    state: RelayState,
    stats: RelayStats,
}

impl<D: PortDevice, C: DatagramChannel> Relay<D, C> {
    /// Create a relay over an open device and channel.
    pub fn new(device: D, channel: C) -> Self {
        Relay {
            device,
            channel,
            state: RelayState::Initializing,
            stats: RelayStats::default(),
        }
    }

    /// Get the current state.
    pub fn state(&self) -> RelayState {
        self.state
    }

    /// Get a snapshot of the statistics.
    pub fn stats(&self) -> RelayStats {
        self.stats.clone()
    }

    /// Run the relay until shutdown is requested or a read side fails.
    ///
    /// Waits for readiness on the device and the channel with no timeout;
    /// an idle bridge simply blocks. Frame-local failures (malformed or
    /// oversized envelopes, write/send errors) drop the offending frame
    /// and keep running. A read-side failure on either source is fatal
    /// and drives the `Draining` transition before the error is returned.
    ///
    /// On return both handles have been released.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<RelayStats> {
        self.state.begin_running()?;
        info!(
            device = self.device.name(),
            peer = %self.channel.peer(),
            "relay running"
        );

        let outcome = loop {
            let event = tokio::select! {
                result = self.device.read_frame() => Event::Captured(result),
                result = self.channel.recv() => Event::Received(result),
                _ = shutdown.changed() => Event::Shutdown,
            };

            match event {
                Event::Captured(Ok(frame)) => self.relay_outbound(frame).await,
                Event::Captured(Err(e)) => {
                    warn!(error = %e, "device read failed");
                    break Err(e);
                }
                Event::Received(Ok((datagram, from))) => self.relay_inbound(datagram, from).await,
                Event::Received(Err(e)) if e.is_frame_local() => {
                    warn!(error = %e, "dropping inbound datagram");
                    self.stats.record_dropped();
                }
                Event::Received(Err(e)) => {
                    warn!(error = %e, "channel receive failed");
                    break Err(e);
                }
                Event::Shutdown => {
                    info!("shutdown requested");
                    break Ok(());
                }
            }
        };

        self.state.begin_draining()?;
        debug!("releasing device and channel");
        let Relay {
            device,
            channel,
            mut state,
            stats,
        } = self;
        drop(device);
        drop(channel);
        state.stop()?;

        info!(
            captured = stats.frames_captured,
            injected = stats.frames_injected,
            dropped = stats.frames_dropped,
            "relay stopped"
        );
        outcome.map(|()| stats)
    }

    /// One capture step: encode the frame and send it to the peer.
    ///
    /// All failures here lose at most this frame, which an unreliable
    /// link tolerates by design of the transport.
    async fn relay_outbound(&mut self, frame: Vec<u8>) {
        trace!(len = frame.len(), "captured frame");
        let envelope = match EnvelopeCodec::encode(&frame) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, len = frame.len(), "dropping captured frame");
                self.stats.record_dropped();
                return;
            }
        };

        match self.channel.send(envelope.as_bytes()).await {
            Ok(()) => self.stats.record_captured(frame.len()),
            Err(e) => {
                warn!(error = %e, "dropping undeliverable envelope");
                self.stats.record_dropped();
            }
        }
    }

    /// One inject step: decode the datagram and write the frame back.
    async fn relay_inbound(&mut self, datagram: Vec<u8>, from: SocketAddr) {
        trace!(len = datagram.len(), %from, "received datagram");
        let text = match std::str::from_utf8(&datagram) {
            Ok(text) => text,
            Err(e) => {
                warn!(%from, error = %e, "dropping non-textual datagram");
                self.stats.record_dropped();
                return;
            }
        };

        let frame = match EnvelopeCodec::decode(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(%from, error = %e, "dropping undecodable envelope");
                self.stats.record_dropped();
                return;
            }
        };

        let len = frame.len();
        match self.device.write_frame(&frame).await {
            Ok(()) => self.stats.record_injected(len),
            Err(e) => {
                // Data loss must be visible, but one lost frame does not
                // take the bridge down.
                warn!(error = %e, len, "device write failed, frame lost");
                self.stats.record_dropped();
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_record_captured() {
        let mut stats = RelayStats::default();
        stats.record_captured(100);
        stats.record_captured(50);
        assert_eq!(stats.frames_captured, 2);
        assert_eq!(stats.bytes_captured, 150);
    }

    #[test]
    fn stats_record_injected() {
        let mut stats = RelayStats::default();
        stats.record_injected(42);
        assert_eq!(stats.frames_injected, 1);
        assert_eq!(stats.bytes_injected, 42);
    }

    #[test]
    fn stats_record_dropped() {
        let mut stats = RelayStats::default();
        stats.record_dropped();
        stats.record_dropped();
        assert_eq!(stats.frames_dropped, 2);
        assert_eq!(stats.frames_captured, 0);
    }
}
