//! vport-core: user-space virtual network port library.
//!
//! This crate provides:
//! - Wire envelope codec (base64 payload in a JSON record)
//! - Virtual interface abstraction with tap and utun-style variants
//! - Best-effort datagram channel to a single fixed peer
//! - The bidirectional relay loop and its state machine
//! - Error taxonomy and logging setup

pub mod channel;
pub mod constants;
pub mod device;
pub mod envelope;
pub mod error;
pub mod logging;
pub mod relay;

pub use error::{Error, Result};
pub use logging::{LogFormat, init_logging};
