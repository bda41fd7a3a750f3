//! Hermes paper-trading binary
//!
//! `hermes --config config.toml` runs the orchestrator against the
//! paper venue until Ctrl-C.

use clap::Parser;
use hermes_runner::{RunnerConfig, bootstrap};
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hermes", about = "Risk-gated trade orchestrator")]
struct Args {
    /// Path to the TOML configuration file; defaults apply without one
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> hermes_runner::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = RunnerConfig::load(args.config.as_deref())?;
    let (orchestrator, handle) = bootstrap(&config).await?;

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("[MAIN] ctrl-c received, shutting down");
            let _ = handle.shutdown.send(()).await;
        }
    });

    orchestrator.run().await;
    Ok(())
}
