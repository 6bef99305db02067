//! Virtual interface abstraction.
//!
//! Two device flavors exist with different framing conventions:
//! - Tap variant (Linux): exchanges whole Ethernet frames, no leading
//!   header; the caller may suggest a name and the kernel may assign
//!   another.
//! - Utun-style variant (macOS): exchanges network-layer packets prefixed
//!   with a 4-byte big-endian address-family tag; the name is entirely
//!   kernel-assigned.
//!
//! Both implement [`PortDevice`], so the relay never depends on a variant
//! directly. Variant impls strip the tag on read and restore it on write;
//! frames crossing the trait boundary never carry it.

mod framing;

#[cfg(target_os = "linux")]
mod tap_linux;

#[cfg(target_os = "macos")]
mod utun_macos;

pub use framing::{AF_INET_TAG, prepend_af_tag, strip_af_tag};

#[cfg(target_os = "linux")]
pub use tap_linux::TapPort;

#[cfg(target_os = "macos")]
pub use utun_macos::UtunPort;

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
compile_error!("vport supports Linux (tap) and macOS (utun) virtual interfaces");

use crate::error::Result;

/// Trait for virtual interface implementations.
#[allow(async_fn_in_trait)]
pub trait PortDevice: Send {
    /// Read exactly one frame from the device.
    ///
    /// For header-prefixed variants the address-family tag is already
    /// stripped from the returned bytes.
    async fn read_frame(&mut self) -> Result<Vec<u8>>;

    /// Write exactly one frame to the device.
    ///
    /// Header-prefixed variants reconstruct and prepend the tag before
    /// the write.
    async fn write_frame(&mut self, frame: &[u8]) -> Result<()>;

    /// Get the kernel-assigned interface name.
    fn name(&self) -> &str;
}

/// Open the platform's virtual interface variant.
///
/// `requested_name` is a suggestion: the tap variant passes it to the
/// kernel (which may still assign a different name), the utun-style
/// variant ignores it.
///
/// # Errors
///
/// Returns `DeviceUnavailable` if the host has no virtual-interface
/// support, `PermissionDenied` or `DeviceBusy` if the kernel rejects
/// creation.
pub async fn open_port(requested_name: &str) -> Result<impl PortDevice> {
    #[cfg(target_os = "linux")]
    {
        TapPort::create(requested_name).await
    }

    #[cfg(target_os = "macos")]
    {
        let _ = requested_name;
        UtunPort::create().await
    }
}
