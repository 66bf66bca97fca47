//! In-memory repository.

use parking_lot::RwLock;

use crate::domain::Warehouse;
use crate::ports::{RepositoryError, WarehouseRepository};

/// Keeps the last saved state in memory.
///
/// Used by tests and by the runtime when no data file is configured.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    stored: RwLock<Option<Warehouse>>,
    saves: RwLock<u64>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with an already stored state.
    pub fn with_state(warehouse: Warehouse) -> Self {
        Self {
            stored: RwLock::new(Some(warehouse)),
            saves: RwLock::new(0),
        }
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> u64 {
        *self.saves.read()
    }

    pub fn snapshot(&self) -> Option<Warehouse> {
        self.stored.read().clone()
    }
}

impl WarehouseRepository for InMemoryRepository {
    fn load(&self) -> Result<Option<Warehouse>, RepositoryError> {
        Ok(self.stored.read().clone())
    }

    fn save(&self, warehouse: &Warehouse) -> Result<(), RepositoryError> {
        *self.stored.write() = Some(warehouse.clone());
        *self.saves.write() += 1;
        Ok(())
    }
}
