//! Test utilities for vport.
//!
//! In-memory fakes for the virtual interface and the datagram channel so
//! relay logic can be exercised without kernel devices, privileges, or
//! real sockets.

mod fake_port;
mod loopback_channel;

pub use fake_port::FakePort;
pub use loopback_channel::LoopbackChannel;
