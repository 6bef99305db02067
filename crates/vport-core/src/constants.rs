//! Capacity limits and wire-format constants for vport.

// =============================================================================
// Frame Capacity
// =============================================================================

/// Maximum raw frame size accepted from or written to the virtual interface.
pub const MAX_FRAME_SIZE: usize = 4096;

/// Length of the address-family tag some interface variants prepend.
pub const AF_TAG_LEN: usize = 4;

// =============================================================================
// Datagram Capacity
// =============================================================================

/// Maximum encoded envelope size carried in a single datagram.
///
/// One envelope maps to exactly one datagram; there is no fragmentation or
/// reassembly, so this is the hard capacity limit of the bridge. Sized for
/// the base64 expansion of a maximum frame plus the JSON wrapper.
pub const MAX_DATAGRAM_SIZE: usize = 4 * MAX_FRAME_SIZE + 1024;

// =============================================================================
// Envelope Identities
// =============================================================================

/// Placeholder source identity carried in every envelope.
///
/// Informational only; the peer address, not envelope content, determines
/// where datagrams go.
pub const SOURCE_PLACEHOLDER: &str = "11:11:11:11:11:11";

/// Placeholder destination identity carried in every envelope.
pub const DESTINATION_PLACEHOLDER: &str = "aa:aa:aa:aa:aa:aa";

// =============================================================================
// Defaults
// =============================================================================

/// Default requested name for the virtual interface.
///
/// The kernel may assign a different name (tap variant) or ignore the
/// request entirely (utun-style variant).
pub const DEFAULT_DEVICE_NAME: &str = "vport0";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datagram_fits_encoded_max_frame() {
        // base64 expands 3 bytes to 4 symbols; the wrapper adds the JSON
        // structure and identity fields.
        let worst_case_payload = MAX_FRAME_SIZE.div_ceil(3) * 4;
        assert!(worst_case_payload + 256 <= MAX_DATAGRAM_SIZE);
    }

    #[test]
    fn placeholders_are_distinct() {
        assert_ne!(SOURCE_PLACEHOLDER, DESTINATION_PLACEHOLDER);
    }
}
