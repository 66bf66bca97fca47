//! Outbound (Driven) ports for the terminal ledger.
//!
//! These traits define what the ledger needs from its environment: a clock,
//! a request-id generator and durable storage.

use std::path::PathBuf;

use chrono::Utc;
use parking_lot::RwLock;

use crate::domain::{LedgerError, Timestamp, Warehouse};

/// Time source for consistent timestamp handling.
///
/// Abstracted to allow testing with deterministic time.
pub trait TimeSource: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Timestamp;
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug)]
pub struct FixedTimeSource {
    now: RwLock<Timestamp>,
}

impl FixedTimeSource {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    pub fn set(&self, now: Timestamp) {
        *self.now.write() = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.write();
        *now += by;
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> Timestamp {
        *self.now.read()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for std::sync::Arc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Generates ids for verification requests created without a custom id.
pub trait RequestIdSource: Send + Sync {
    /// Id for the `ordinal`-th request (1-based).
    fn request_id(&self, ordinal: usize) -> String;
}

/// `"{prefix}{ordinal:04}"`, e.g. `"Заявка №0001"`.
#[derive(Debug, Clone)]
pub struct SequentialRequestIds {
    prefix: String,
}

impl SequentialRequestIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for SequentialRequestIds {
    fn default() -> Self {
        Self::new("Заявка №")
    }
}

impl RequestIdSource for SequentialRequestIds {
    fn request_id(&self, ordinal: usize) -> String {
        format!("{}{:04}", self.prefix, ordinal)
    }
}

/// Errors from warehouse repositories.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt warehouse data in {path}: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Warehouse data at {path} is locked by another process")]
    Locked { path: PathBuf },

    #[error("Repository unavailable: {0}")]
    Unavailable(String),
}

impl From<RepositoryError> for LedgerError {
    fn from(err: RepositoryError) -> Self {
        LedgerError::Storage(err.to_string())
    }
}

/// Durable storage for the complete warehouse state.
///
/// `save` is called with the full candidate state before it becomes visible;
/// a failed save aborts the operation.
pub trait WarehouseRepository: Send + Sync {
    /// Loads the stored state, or `None` if nothing was saved yet.
    fn load(&self) -> Result<Option<Warehouse>, RepositoryError>;

    /// Replaces the stored state.
    fn save(&self, warehouse: &Warehouse) -> Result<(), RepositoryError>;
}
