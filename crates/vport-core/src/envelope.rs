//! Wire envelope codec for captured frames.
//!
//! Each frame travels as one self-describing JSON record:
//!
//! ```json
//! {"source_mac":"11:11:11:11:11:11","destination_mac":"aa:aa:aa:aa:aa:aa","payload":"<base64>"}
//! ```
//!
//! Frame bytes are arbitrary binary, so the payload field carries them in
//! standard base64 ('+' and '/' symbols, '=' padding). The identity fields
//! are constant placeholders; peers locate the payload purely by its key and
//! must tolerate field reordering and unrecognized extra fields.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::constants::{DESTINATION_PLACEHOLDER, MAX_FRAME_SIZE, SOURCE_PLACEHOLDER};
use crate::error::{Error, Result};

/// One wire record carrying an encoded frame.
///
/// Unknown fields are ignored on deserialization, and field order does not
/// matter; the payload is located by key alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Source identity placeholder. Informational only.
    pub source_mac: String,
    /// Destination identity placeholder. Informational only.
    pub destination_mac: String,
    /// Base64-encoded frame bytes.
    pub payload: String,
}

impl Envelope {
    /// Wrap raw frame bytes in an envelope with placeholder identities.
    pub fn from_frame(frame: &[u8]) -> Self {
        Envelope {
            source_mac: SOURCE_PLACEHOLDER.to_string(),
            destination_mac: DESTINATION_PLACEHOLDER.to_string(),
            payload: STANDARD.encode(frame),
        }
    }
}

/// Codec between raw frame bytes and envelope text.
pub struct EnvelopeCodec;

impl EnvelopeCodec {
    /// Encode one frame as envelope text.
    ///
    /// Fails with `CapacityExceeded` if the frame is larger than the bridge
    /// carries, and `MalformedEnvelope` if serialization itself fails.
    pub fn encode(frame: &[u8]) -> Result<String> {
        if frame.len() > MAX_FRAME_SIZE {
            return Err(Error::CapacityExceeded {
                len: frame.len(),
                max: MAX_FRAME_SIZE,
            });
        }

        serde_json::to_string(&Envelope::from_frame(frame)).map_err(|e| Error::MalformedEnvelope {
            message: format!("serialization failed: {}", e),
        })
    }

    /// Decode envelope text back to the exact frame bytes.
    ///
    /// Rejects text with no payload field, an unterminated payload field, or
    /// payload symbols outside the base64 alphabet. Interior ASCII
    /// whitespace between symbol groups is skipped.
    pub fn decode(text: &str) -> Result<Vec<u8>> {
        let envelope: Envelope =
            serde_json::from_str(text).map_err(|e| Error::MalformedEnvelope {
                message: format!("invalid envelope record: {}", e),
            })?;

        Self::decode_payload(&envelope.payload)
    }

    /// Decode just the base64 payload field of an envelope.
    pub fn decode_payload(payload: &str) -> Result<Vec<u8>> {
        // Senders may break the payload into whitespace-separated symbol
        // groups; the alphabet itself contains no whitespace.
        let compact: String = payload
            .chars()
            .filter(|c| !matches!(c, ' ' | '\t' | '\n' | '\r'))
            .collect();

        let frame = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| Error::MalformedEnvelope {
                message: format!("invalid payload encoding: {}", e),
            })?;

        if frame.len() > MAX_FRAME_SIZE {
            return Err(Error::CapacityExceeded {
                len: frame.len(),
                max: MAX_FRAME_SIZE,
            });
        }

        Ok(frame)
    }
}

// =============================================================================
// Tests
// =============================================================================
