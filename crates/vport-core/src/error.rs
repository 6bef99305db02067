//! Error types for vport-core.

use thiserror::Error;

/// Main error type for vport operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The host has no virtual-interface support (e.g. /dev/net/tun missing).
    #[error("virtual interface unavailable: {message}")]
    DeviceUnavailable { message: String },

    /// Interface creation rejected for lack of privilege.
    #[error("permission denied creating virtual interface (requires CAP_NET_ADMIN or root)")]
    PermissionDenied,

    /// Interface creation rejected because the device is already claimed.
    #[error("virtual interface busy: {name}")]
    DeviceBusy { name: String },

    /// Datagram socket could not be allocated or bound.
    #[error("socket error: {0}")]
    Socket(std::io::Error),

    /// I/O error from underlying read/write/send/receive calls.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Envelope text that cannot be decoded back to a frame.
    #[error("malformed envelope: {message}")]
    MalformedEnvelope { message: String },

    /// Frame or datagram larger than the fixed buffer allows.
    #[error("capacity exceeded: {len} bytes (max {max})")]
    CapacityExceeded { len: usize, max: usize },

    /// Invalid relay state transition.
    #[error("invalid state: expected {expected}, got {actual}")]
    InvalidState { expected: String, actual: String },
}

impl Error {
    /// Returns true if this error only invalidates a single frame.
    ///
    /// Frame-local errors drop the offending frame and leave the relay
    /// running; everything else is fatal when it occurs on a read path.
    pub fn is_frame_local(&self) -> bool {
        matches!(
            self,
            Error::MalformedEnvelope { .. } | Error::CapacityExceeded { .. }
        )
    }
}

/// Convenience result type for vport operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_malformed_envelope() {
        let err = Error::MalformedEnvelope {
            message: "missing payload field".into(),
        };
        assert_eq!(err.to_string(), "malformed envelope: missing payload field");
    }

    #[test]
    fn error_display_capacity_exceeded() {
        let err = Error::CapacityExceeded { len: 5000, max: 4096 };
        assert_eq!(err.to_string(), "capacity exceeded: 5000 bytes (max 4096)");
    }

    #[test]
    fn error_display_invalid_state() {
        let err = Error::InvalidState {
            expected: "Running".into(),
            actual: "Stopped".into(),
        };
        assert_eq!(err.to_string(), "invalid state: expected Running, got Stopped");
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn frame_local_errors() {
        assert!(Error::MalformedEnvelope {
            message: "bad".into()
        }
        .is_frame_local());
        assert!(Error::CapacityExceeded { len: 1, max: 0 }.is_frame_local());

        // These should not be frame-local
        assert!(!Error::PermissionDenied.is_frame_local());
        assert!(!Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset"
        ))
        .is_frame_local());
        assert!(!Error::DeviceUnavailable {
            message: "no tun".into()
        }
        .is_frame_local());
    }
}
