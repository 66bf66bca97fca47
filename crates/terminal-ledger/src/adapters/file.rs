//! # JSON File Repository
//!
//! Persists the whole warehouse as one JSON document.
//!
//! - Writes go to a sibling temp file, are synced, then renamed over the
//!   data file, so a crash never leaves a half-written document.
//! - An exclusive `fs2` lock on `<data file>.lock` keeps a second process
//!   from opening the same data file. The lock is released on drop.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{check_all_invariants, Warehouse};
use crate::ports::{RepositoryError, WarehouseRepository};

/// On-disk format version.
const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct StoredRef<'a> {
    version: u32,
    warehouse: &'a Warehouse,
}

#[derive(Deserialize)]
struct Stored {
    version: u32,
    warehouse: Warehouse,
}

/// File-backed warehouse repository.
#[derive(Debug)]
pub struct JsonFileRepository {
    path: PathBuf,
    lock_file: File,
    lock_path: PathBuf,
    /// Serializes writers inside this process.
    write_guard: Mutex<()>,
}

impl JsonFileRepository {
    /// Opens (or prepares) the data file at `path` and takes its lock.
    ///
    /// # Errors
    /// - `Locked`: another process holds the data file
    /// - `Io`: the parent directory or lock file cannot be created
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| RepositoryError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let lock_path = sibling(&path, "lock");
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|source| RepositoryError::Io {
                path: lock_path.clone(),
                source,
            })?;
        lock_file
            .try_lock_exclusive()
            .map_err(|_| RepositoryError::Locked { path: path.clone() })?;

        info!("[warehouse] 💾 Opened data file {}", path.display());
        Ok(Self {
            path,
            lock_file,
            lock_path,
            write_guard: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        sibling(&self.path, "tmp")
    }

    fn io_error(&self, source: std::io::Error) -> RepositoryError {
        RepositoryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// `data.json` -> `data.json.<suffix>`
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

impl WarehouseRepository for JsonFileRepository {
    fn load(&self) -> Result<Option<Warehouse>, RepositoryError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("[warehouse] 📁 No data file at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let stored: Stored = serde_json::from_str(&text).map_err(|e| RepositoryError::Corrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        if stored.version != FORMAT_VERSION {
            return Err(RepositoryError::Corrupt {
                path: self.path.clone(),
                message: format!("unsupported format version {}", stored.version),
            });
        }

        let violations = check_all_invariants(&stored.warehouse);
        if !violations.is_empty() {
            return Err(RepositoryError::Corrupt {
                path: self.path.clone(),
                message: format!("{} invariant violations, first: {:?}", violations.len(), violations[0]),
            });
        }

        info!(
            "[warehouse] 💾 Loaded {} terminals from {}",
            stored.warehouse.terminal_count(),
            self.path.display()
        );
        Ok(Some(stored.warehouse))
    }

    fn save(&self, warehouse: &Warehouse) -> Result<(), RepositoryError> {
        let _guard = self.write_guard.lock();

        let bytes = serde_json::to_vec_pretty(&StoredRef {
            version: FORMAT_VERSION,
            warehouse,
        })
        .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        let temp_path = self.temp_path();
        let mut file = File::create(&temp_path).map_err(|e| self.io_error(e))?;
        file.write_all(&bytes).map_err(|e| self.io_error(e))?;
        file.sync_all().map_err(|e| self.io_error(e))?;
        std::fs::rename(&temp_path, &self.path).map_err(|e| self.io_error(e))?;

        debug!(bytes = bytes.len(), "[warehouse] state saved");
        Ok(())
    }
}

impl Drop for JsonFileRepository {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.lock_file);
        let _ = std::fs::remove_file(&self.lock_path);
    }
}
