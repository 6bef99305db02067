//! Linux tap device.
//!
//! Opens the clone device and attaches a tap interface with `TUNSETIFF`.
//! Requires elevated privileges (CAP_NET_ADMIN) to create tap devices.
//! Address and link configuration (`ip addr add ...`, `ip link set ... up`)
//! is an external step performed by the operator.

use std::ffi::CStr;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use tokio::io::unix::AsyncFd;

use super::PortDevice;
use crate::constants::MAX_FRAME_SIZE;
use crate::error::{Error, Result};

const CLONE_DEVICE: &str = "/dev/net/tun";

/// Linux tap device.
///
/// Exchanges whole Ethernet frames with no packet-info header
/// (`IFF_NO_PI`), so reads and writes map one-to-one to frames.
pub struct TapPort {
    /// Nonblocking device fd registered with the reactor.
    fd: AsyncFd<OwnedFd>,
    /// Kernel-assigned interface name.
    name: String,
}

impl TapPort {
    /// Create a new tap device.
    ///
    /// # Arguments
    ///
    /// * `requested_name` - Name suggestion (e.g. "vport0"). The kernel may
    ///   assign a different name, which `name()` reports.
    ///
    /// # Errors
    ///
    /// Returns `DeviceUnavailable` if the clone device is missing,
    /// `PermissionDenied` or `DeviceBusy` if the kernel rejects the attach.
    pub async fn create(requested_name: &str) -> Result<Self> {
        let raw = unsafe {
            libc::open(
                c"/dev/net/tun".as_ptr(),
                libc::O_RDWR | libc::O_CLOEXEC | libc::O_NONBLOCK,
            )
        };
        if raw < 0 {
            let err = io::Error::last_os_error();
            return Err(match err.kind() {
                io::ErrorKind::NotFound => Error::DeviceUnavailable {
                    message: format!("{} not present on this host", CLONE_DEVICE),
                },
                io::ErrorKind::PermissionDenied => Error::PermissionDenied,
                _ => Error::Io(err),
            });
        }
        // Owns the fd from here on; closed on every exit path below.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        let mut ifr: libc::ifreq = unsafe { std::mem::zeroed() };
        let name_bytes = requested_name.as_bytes();
        let copy_len = name_bytes.len().min(ifr.ifr_name.len() - 1);
        for (dst, src) in ifr.ifr_name.iter_mut().zip(&name_bytes[..copy_len]) {
            *dst = *src as libc::c_char;
        }
        unsafe {
            ifr.ifr_ifru.ifru_flags = (libc::IFF_TAP | libc::IFF_NO_PI) as libc::c_short;
        }

        let rc = unsafe { libc::ioctl(fd.as_raw_fd(), libc::TUNSETIFF, &mut ifr) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            return Err(match err.raw_os_error() {
                Some(libc::EPERM) | Some(libc::EACCES) => Error::PermissionDenied,
                Some(libc::EBUSY) => Error::DeviceBusy {
                    name: requested_name.to_string(),
                },
                _ => Error::Io(err),
            });
        }

        // The kernel writes the actual name back into the request.
        let assigned = unsafe { CStr::from_ptr(ifr.ifr_name.as_ptr()) }
            .to_string_lossy()
            .into_owned();

        Ok(TapPort {
            fd: AsyncFd::new(fd)?,
            name: assigned,
        })
    }
}

impl PortDevice for TapPort {
    async fn read_frame(&mut self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; MAX_FRAME_SIZE];
        loop {
            let mut guard = self.fd.readable().await?;
            match guard.try_io(|inner| {
                let n = unsafe {
                    libc::read(
                        inner.get_ref().as_raw_fd(),
                        buf.as_mut_ptr().cast(),
                        buf.len(),
                    )
                };
                if n < 0 {
                    Err(io::Error::last_os_error())
                } else {
                    Ok(n as usize)
                }
            }) {
                Ok(Ok(n)) => {
                    buf.truncate(n);
                    return Ok(buf);
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_would_block) => continue,
            }
        }
    }

    async fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        loop {
            let mut guard = self.fd.writable().await?;
            match guard.try_io(|inner| {
                let n = unsafe {
                    libc::write(
                        inner.get_ref().as_raw_fd(),
                        frame.as_ptr().cast(),
                        frame.len(),
                    )
                };
                if n < 0 {
                    Err(io::Error::last_os_error())
                } else {
                    Ok(n as usize)
                }
            }) {
                Ok(Ok(n)) if n == frame.len() => return Ok(()),
                Ok(Ok(n)) => {
                    return Err(Error::Io(io::Error::new(
                        io::ErrorKind::WriteZero,
                        format!("partial frame write: {} of {} bytes", n, frame.len()),
                    )));
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_would_block) => continue,
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // Note: Creating a real tap device requires CAP_NET_ADMIN, so the
    // creation path is covered by an ignored test run explicitly as root.

    #[tokio::test]
    #[ignore = "requires root privileges"]
    async fn create_tap_device_reports_name() {
        match TapPort::create("vport-test0").await {
            Ok(port) => assert!(!port.name().is_empty()),
            Err(e) => eprintln!("expected to fail without root: {}", e),
        }
    }

    #[tokio::test]
    async fn create_without_privilege_maps_error() {
        // On hosts without the clone device or without privilege, creation
        // must fail with one of the creation-taxonomy errors, never panic.
        if let Err(e) = TapPort::create("vport-test0").await {
            assert!(matches!(
                e,
                Error::DeviceUnavailable { .. }
                    | Error::PermissionDenied
                    | Error::DeviceBusy { .. }
                    | Error::Io(_)
            ));
        }
    }
}
