//! Relay loop bridging the virtual interface and the datagram channel.
//!
//! This module provides:
//! - The relay lifecycle state machine
//! - Relay statistics
//! - The event loop that captures, encodes, sends, receives, decodes,
//!   and injects frames

mod handler;
mod state;

pub use handler::{Relay, RelayStats};
pub use state::{RelayState, RelayStateError};
