//! Address-family tag framing for header-prefixed device variants.
//!
//! The utun-style device prepends a 4-byte network-byte-order tag naming
//! the protocol family of every packet. The bridge carries only IPv4, so
//! the write path always restores [`AF_INET_TAG`].

use crate::constants::AF_TAG_LEN;
use crate::error::{Error, Result};

/// The IPv4 address-family tag value (AF_INET).
pub const AF_INET_TAG: u32 = 2;

/// Strip the leading address-family tag from a device read.
///
/// Returns the tag value and the remaining packet bytes. Fails with an
/// I/O error if the read is shorter than the tag; the device contract
/// guarantees every packet carries one.
pub fn strip_af_tag(buf: &[u8]) -> Result<(u32, &[u8])> {
    if buf.len() < AF_TAG_LEN {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("packet shorter than address-family tag: {} bytes", buf.len()),
        )));
    }

    let tag = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
    Ok((tag, &buf[AF_TAG_LEN..]))
}

/// Prepend an address-family tag to a frame for a device write.
pub fn prepend_af_tag(family: u32, frame: &[u8]) -> Vec<u8> {
    let mut packet = Vec::with_capacity(AF_TAG_LEN + frame.len());
    packet.extend_from_slice(&family.to_be_bytes());
    packet.extend_from_slice(frame);
    packet
}

// =============================================================================
// Tests
// =============================================================================
