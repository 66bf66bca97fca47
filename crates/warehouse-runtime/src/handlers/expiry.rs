//! # Expiry Sweeper
//!
//! Periodically asks the ledger to expire overdue verifications.
//!
//! A failed sweep is logged and retried on the next tick; it never stops the
//! loop.

use std::sync::Arc;
use std::time::Duration;

use terminal_ledger::{SweepReport, TerminalLedgerApi};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Background task running the expiry sweep on a fixed interval.
pub struct ExpirySweeper<L: TerminalLedgerApi + ?Sized> {
    ledger: Arc<L>,
    interval: Duration,
}

impl<L: TerminalLedgerApi + ?Sized> ExpirySweeper<L> {
    pub fn new(ledger: Arc<L>, interval: Duration) -> Self {
        Self { ledger, interval }
    }

    /// Runs one sweep. Returns `None` if it failed.
    pub fn tick(&self) -> Option<SweepReport> {
        match self.ledger.run_expiry_sweep() {
            Ok(report) => {
                if report.expired.is_empty() {
                    debug!("[sweep] Nothing expired");
                } else {
                    info!(
                        expired = report.expired_count(),
                        "[sweep] Verification expired for {:?}", report.expired
                    );
                }
                Some(report)
            }
            Err(e) => {
                error!(kind = ?e.kind(), "[sweep] Expiry sweep failed, retrying next tick: {}", e);
                None
            }
        }
    }

    /// Sweeps immediately, then every interval until `shutdown` flips.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = self.interval.as_secs(), "[sweep] Expiry sweeper started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick();
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("[sweep] Shutdown signal received");
                        break;
                    }
                }
            }
        }
    }
}
