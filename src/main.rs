//! OPC-to-serial bridge — entry point.
//!
//! ```text
//! TCP client → Acceptor → per-connection Framer → Router
//!   → (per-output) single-slot Slot → Serial Worker
//!   → Pixel Transform → Protocol Codec → Serial Port → LED controller
//! ```
#![deny(unused_must_use)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use opc_bridge::bridge::Bridge;
use opc_bridge::config::BridgeConfig;

#[derive(Parser)]
#[command(name = "opc-bridge", version, about = "Open Pixel Control to AdaLight/AWA/WLED serial bridge")]
struct Cli {
    /// Path to the bridge configuration file (JSON).
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Enable verbose (debug-level) logging.
    #[arg(long)]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let config = match BridgeConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("failed to load config: {e}");
            return ExitCode::FAILURE;
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!("failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    rt.block_on(run(config))
}

async fn run(config: BridgeConfig) -> ExitCode {
    info!("opc-bridge v{} starting with {} output(s)", env!("CARGO_PKG_VERSION"), config.outputs.len());

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let bridge = Bridge::new(config);
    let serving = tokio::spawn(bridge.run(shutdown_rx));

    if tokio::signal::ctrl_c().await.is_ok() {
        info!("received shutdown signal");
    }
    let _ = shutdown_tx.send(true);

    match serving.await {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(e)) => {
            error!("bridge exited with error: {e}");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("bridge task panicked: {e}");
            ExitCode::FAILURE
        }
    }
}
