//! vport binary entry point.
//!
//! Creates the virtual interface, opens the datagram channel to the
//! configured peer, and runs the relay until shutdown or a fatal error.
//! Address and route configuration of the interface is left to the
//! operator (e.g. `ip addr add ... && ip link set ... up`).

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};

use vport::Cli;
use vport_core::channel::UdpChannel;
use vport_core::device::{PortDevice, open_port};
use vport_core::relay::{Relay, RelayStats};

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let log_format = cli.log_format.into();
    if let Err(e) = vport_core::init_logging(cli.verbose, cli.log_file.as_deref(), log_format) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!(version = env!("CARGO_PKG_VERSION"), "vport starting");

    // Create tokio runtime
    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");

    let result = rt.block_on(run(&cli));

    match result {
        Ok(stats) => {
            info!(
                captured = stats.frames_captured,
                injected = stats.frames_injected,
                "clean shutdown"
            );
        }
        Err(e) => {
            error!(error = %e, "fatal");
            eprintln!("vport: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> vport_core::Result<RelayStats> {
    let peer = cli.peer_addr();

    let device = open_port(&cli.name).await?;
    info!(device = device.name(), "virtual interface created");

    let channel = UdpChannel::open(peer).await?;
    info!(local = %channel.local_addr()?, peer = %peer, "datagram channel open");

    // SIGINT forces the draining transition so both handles are released
    // deterministically instead of relying on OS teardown.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    Relay::new(device, channel).run(shutdown_rx).await
}
