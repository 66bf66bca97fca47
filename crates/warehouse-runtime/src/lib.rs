//! # Warehouse Runtime
//!
//! Process wiring for the terminal ledger.
//!
//! ## Modular Structure
//!
//! - `container/` - Configuration and service construction
//! - `handlers/` - Background tasks (expiry sweep)
//! - `telemetry` - Tracing subscriber setup
//!
//! ## Startup Sequence
//!
//! 1. Parse command-line flags
//! 2. Load configuration (defaults, TOML file, environment, flags)
//! 3. Initialize tracing
//! 4. Open the repository and restore the ledger
//! 5. Run one sweep and exit, or start the sweeper and wait for Ctrl+C

pub mod container;
pub mod handlers;
pub mod telemetry;

pub use container::{ConfigError, LedgerContainer, RuntimeConfig};
pub use handlers::ExpirySweeper;
pub use telemetry::init_tracing;
