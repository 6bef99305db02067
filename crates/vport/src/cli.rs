//! CLI implementation for the vport binary.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use vport_core::constants::DEFAULT_DEVICE_NAME;

/// Log output format for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CliLogFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// Structured JSON output.
    Json,
}

impl From<CliLogFormat> for vport_core::LogFormat {
    fn from(fmt: CliLogFormat) -> Self {
        match fmt {
            CliLogFormat::Text => vport_core::LogFormat::Text,
            CliLogFormat::Json => vport_core::LogFormat::Json,
        }
    }
}

/// vport - user-space virtual network port bridged to a fixed UDP peer.
#[derive(Debug, Parser)]
#[command(
    name = "vport",
    version,
    about = "user-space virtual network port bridged to a fixed UDP peer"
)]
pub struct Cli {
    /// Peer host (IPv4 or IPv6 address)
    pub peer_host: IpAddr,

    /// Peer UDP port
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    pub peer_port: u16,

    /// Requested interface name; the kernel may assign another
    /// (ignored by the utun-style variant)
    #[arg(short = 'n', long = "name", default_value = DEFAULT_DEVICE_NAME)]
    pub name: String,

    /// Increase verbosity (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Log to file instead of stderr
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log output format
    #[arg(long = "log-format", default_value = "text")]
    pub log_format: CliLogFormat,
}

impl Cli {
    /// The fixed peer transport endpoint.
    pub fn peer_addr(&self) -> SocketAddr {
        SocketAddr::new(self.peer_host, self.peer_port)
    }
}

// =============================================================================
// Tests
// =============================================================================
