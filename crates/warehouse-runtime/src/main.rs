//! # Warehouse Runtime
//!
//! Entry point: loads configuration, restores the ledger and keeps
//! verification expiry up to date until stopped.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use terminal_ledger::TerminalLedgerApi;
use tracing::{error, info};

use warehouse_runtime::{init_tracing, ExpirySweeper, LedgerContainer, RuntimeConfig};

/// Terminal warehouse runtime.
#[derive(Parser, Debug)]
#[command(name = "warehouse-runtime")]
#[command(about = "Terminal lifecycle ledger with background verification expiry")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON data file (overrides config and TW_DATA_FILE)
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// Seconds between expiry sweeps
    #[arg(long)]
    sweep_interval: Option<u64>,

    /// Log filter, e.g. "info" or "terminal_ledger=debug"
    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON logs
    #[arg(long)]
    json_logs: bool,

    /// Run a single expiry sweep and exit
    #[arg(long)]
    sweep_once: bool,

    /// Print the warehouse status as JSON and exit
    #[arg(long)]
    status: bool,
}

/// Resolves configuration: defaults, then file, then environment, then flags.
fn load_config(args: &Args) -> Result<RuntimeConfig> {
    let mut config = match &args.config {
        Some(path) => RuntimeConfig::from_file(path)?,
        None => RuntimeConfig::default(),
    };
    config.apply_env()?;

    if let Some(path) = &args.data_file {
        config.storage.data_file = Some(path.clone());
    }
    if let Some(secs) = args.sweep_interval {
        config.sweep.interval_secs = secs;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.json = true;
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args).context("Invalid configuration")?;
    init_tracing(&config.logging)?;

    let container = LedgerContainer::build(config)?;
    let ledger = Arc::clone(&container.ledger);

    if args.status {
        let status = serde_json::to_string_pretty(&ledger.status())?;
        println!("{status}");
        return Ok(());
    }

    if args.sweep_once {
        let report = ledger.run_expiry_sweep().context("Expiry sweep failed")?;
        info!(expired = report.expired_count(), "Sweep finished");
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let interval = Duration::from_secs(container.config.sweep.interval_secs);
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let sweeper = ExpirySweeper::new(Arc::clone(&ledger), interval);
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown_rx));

    info!("Warehouse runtime is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    info!("Initiating graceful shutdown...");
    if let Err(e) = shutdown_tx.send(true) {
        error!("Failed to send shutdown signal: {}", e);
    }
    if let Err(e) = sweeper_handle.await {
        error!("Expiry sweeper task failed: {}", e);
    }
    info!("Shutdown complete");
    Ok(())
}
