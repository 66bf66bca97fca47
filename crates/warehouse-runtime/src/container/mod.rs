//! # Ledger Container
//!
//! Builds the repository and the ledger service from a [`RuntimeConfig`].

pub mod config;

pub use config::*;

use std::sync::Arc;

use anyhow::{Context, Result};
use terminal_ledger::adapters::{InMemoryRepository, JsonFileRepository};
use terminal_ledger::{TerminalLedgerService, WarehouseRepository};
use tracing::{info, warn};

/// Initialized runtime services.
pub struct LedgerContainer {
    /// Configuration the container was built from.
    pub config: RuntimeConfig,
    /// The ledger service shared with handlers.
    pub ledger: Arc<TerminalLedgerService>,
}

impl LedgerContainer {
    /// Opens the configured repository and restores the ledger from it.
    pub fn build(config: RuntimeConfig) -> Result<Self> {
        let repository: Arc<dyn WarehouseRepository> = match &config.storage.data_file {
            Some(path) => {
                let repository = JsonFileRepository::open(path)
                    .with_context(|| format!("Failed to open data file {}", path.display()))?;
                Arc::new(repository)
            }
            None => {
                warn!("No data file configured; warehouse state will not survive a restart");
                Arc::new(InMemoryRepository::new())
            }
        };

        let ledger = TerminalLedgerService::new(config.ledger.clone(), repository)
            .context("Failed to load warehouse state")?;
        info!(
            sections = config.ledger.shelf_layout.len(),
            "Ledger service initialized"
        );

        Ok(Self {
            config,
            ledger: Arc::new(ledger),
        })
    }
}
