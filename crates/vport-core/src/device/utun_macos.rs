//! macOS utun device.
//!
//! Created through the kernel-control socket handshake: resolve the utun
//! control id with `CTLIOCGINFO`, connect with unit 0 so the kernel picks
//! the next free interface, then read the assigned name back with
//! `getsockopt`. The device exchanges network-layer packets prefixed with
//! a 4-byte big-endian address-family tag.

use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use tokio::io::unix::AsyncFd;

use super::PortDevice;
use super::framing::{AF_INET_TAG, prepend_af_tag, strip_af_tag};
use crate::constants::{AF_TAG_LEN, MAX_FRAME_SIZE};
use crate::error::{Error, Result};

const UTUN_CONTROL_NAME: &[u8] = b"com.apple.net.utun_control";

// Kernel-control ABI; not exposed by the libc crate.
const PF_SYSTEM: libc::c_int = 32;
const AF_SYS_CONTROL: u16 = 2;
const SYSPROTO_CONTROL: libc::c_int = 2;
const UTUN_OPT_IFNAME: libc::c_int = 2;
const CTLIOCGINFO: libc::c_ulong = 0xC064_4E03;
const MAX_KCTL_NAME: usize = 96;

#[repr(C)]
struct CtlInfo {
    ctl_id: u32,
    ctl_name: [libc::c_char; MAX_KCTL_NAME],
}

#[repr(C)]
struct SockaddrCtl {
    sc_len: u8,
    sc_family: u8,
    ss_sysaddr: u16,
    sc_id: u32,
    sc_unit: u32,
    sc_reserved: [u32; 5],
}

/// macOS utun device.
///
/// The interface name (`utunN`) is entirely kernel-assigned; requests are
/// ignored. Reads strip the address-family tag, writes restore the IPv4
/// tag (the bridge carries IPv4 only).
pub struct UtunPort {
    fd: AsyncFd<OwnedFd>,
    name: String,
}

impl UtunPort {
    /// Create a new utun device on the next free unit.
    ///
    /// # Errors
    ///
    /// Returns `DeviceUnavailable` if the utun kernel control is missing,
    /// `PermissionDenied` or `DeviceBusy` if the kernel rejects the
    /// connect.
    pub async fn create() -> Result<Self> {
        let raw = unsafe { libc::socket(PF_SYSTEM, libc::SOCK_DGRAM, SYSPROTO_CONTROL) };
        if raw < 0 {
            return Err(Error::DeviceUnavailable {
                message: format!(
                    "kernel control socket unavailable: {}",
                    io::Error::last_os_error()
                ),
            });
        }
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        let mut info = CtlInfo {
            ctl_id: 0,
            ctl_name: [0; MAX_KCTL_NAME],
        };
        for (dst, src) in info.ctl_name.iter_mut().zip(UTUN_CONTROL_NAME) {
            *dst = *src as libc::c_char;
        }
        if unsafe { libc::ioctl(fd.as_raw_fd(), CTLIOCGINFO, &mut info) } < 0 {
            return Err(Error::DeviceUnavailable {
                message: format!(
                    "utun kernel control not registered: {}",
                    io::Error::last_os_error()
                ),
            });
        }

        // Unit 0 asks the kernel for the next free utun interface.
        let addr = SockaddrCtl {
            sc_len: std::mem::size_of::<SockaddrCtl>() as u8,
            sc_family: PF_SYSTEM as u8,
            ss_sysaddr: AF_SYS_CONTROL,
            sc_id: info.ctl_id,
            sc_unit: 0,
            sc_reserved: [0; 5],
        };
        let rc = unsafe {
            libc::connect(
                fd.as_raw_fd(),
                (&addr as *const SockaddrCtl).cast(),
                std::mem::size_of::<SockaddrCtl>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            let err = io::Error::last_os_error();
            return Err(match err.raw_os_error() {
                Some(libc::EPERM) | Some(libc::EACCES) => Error::PermissionDenied,
                Some(libc::EBUSY) => Error::DeviceBusy {
                    name: "utun".to_string(),
                },
                _ => Error::Io(err),
            });
        }

        let mut name_buf = [0u8; libc::IFNAMSIZ];
        let mut name_len = name_buf.len() as libc::socklen_t;
        let rc = unsafe {
            libc::getsockopt(
                fd.as_raw_fd(),
                SYSPROTO_CONTROL,
                UTUN_OPT_IFNAME,
                name_buf.as_mut_ptr().cast(),
                &mut name_len,
            )
        };
        if rc < 0 {
            return Err(Error::Io(io::Error::last_os_error()));
        }
        let end = name_buf.iter().position(|b| *b == 0).unwrap_or(name_buf.len());
        let name = String::from_utf8_lossy(&name_buf[..end]).into_owned();

        let flags = unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_GETFL) };
        if flags < 0
            || unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0
        {
            return Err(Error::Io(io::Error::last_os_error()));
        }

        Ok(UtunPort {
            fd: AsyncFd::new(fd)?,
            name,
        })
    }
}

impl PortDevice for UtunPort {
    async fn read_frame(&mut self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; AF_TAG_LEN + MAX_FRAME_SIZE];
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
                    let (_family, frame) = strip_af_tag(&buf[..n])?;
                    return Ok(frame.to_vec());
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_would_block) => continue,
            }
        }
    }

    async fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        let packet = prepend_af_tag(AF_INET_TAG, frame);
        loop {
            let mut guard = self.fd.writable().await?;
            match guard.try_io(|inner| {
                let n = unsafe {
                    libc::write(
                        inner.get_ref().as_raw_fd(),
                        packet.as_ptr().cast(),
                        packet.len(),
                    )
                };
                if n < 0 {
                    Err(io::Error::last_os_error())
                } else {
                    Ok(n as usize)
                }
            }) {
                Ok(Ok(n)) if n == packet.len() => return Ok(()),
                Ok(Ok(n)) => {
                    return Err(Error::Io(io::Error::new(
                        io::ErrorKind::WriteZero,
                        format!("partial packet write: {} of {} bytes", n, packet.len()),
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

    #[tokio::test]
    #[ignore = "requires root privileges"]
    async fn create_utun_device_reports_name() {
        match UtunPort::create().await {
            Ok(port) => assert!(port.name().starts_with("utun")),
            Err(e) => eprintln!("expected to fail without root: {}", e),
        }
    }
}
