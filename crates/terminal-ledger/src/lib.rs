//! # Terminal Ledger
//!
//! Lifecycle state machine and shelf allocation engine for measurement
//! terminals in a single warehouse.
//!
//! ## Purpose
//!
//! Tracks every terminal through verification, shelf placement, shipment and
//! rental, keeping an append-only audit trail per terminal and enforcing the
//! physical limits of the shelf sections.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Serial numbers are unique | `domain/warehouse.rs` - `create_terminal()` |
//! | Section occupancy never exceeds rows x cols of its box type | `domain/allocation.rs` - `find_free_cell()` |
//! | A non-empty section holds one box type | `domain/warehouse.rs` - `placement_view()` |
//! | Placement section and position are set together | `domain/entities.rs` - `Option<Placement>` |
//! | History is append-only | `domain/history.rs` - no mutable entry access |
//! | Failed operations change nothing | `service.rs` - draft / save / swap |
//!
//! ## Terminal Lifecycle
//!
//! ```text
//! [NOT_VERIFIED] ──batch──→ [PENDING] ──verify──→ [VERIFIED] ──sweep──→ [EXPIRED]
//!                                                     │
//!                 ship (not verified / pending / expired)   ship (otherwise)
//!                           ↓                              ↓
//!       [AWAITS_VERIFICATION_AFTER_SHIPPING] ──verify──→ [SHIPPED]
//!
//! (any) ──rent──→ [RENTED] ──return──→ [NOT_VERIFIED]
//! ```
//!
//! ## Outbound Dependencies
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | `TimeSource` | Event timestamps and expiry dates |
//! | `RequestIdSource` | Sequential verification request ids |
//! | `WarehouseRepository` | Load and save the complete state |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use terminal_ledger::prelude::*;
//!
//! let ledger = TerminalLedgerService::in_memory(LedgerConfig::default());
//! let actor = Actor::new("Иванов");
//! ledger.create_terminal(NewTerminal::new("170240001", BoxType::A).in_section("12121"), &actor)?;
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use domain::*;
pub use ports::*;
pub use service::TerminalLedgerService;

/// Everything needed to drive the ledger.
pub mod prelude {
    pub use crate::adapters::{InMemoryRepository, JsonFileRepository};
    pub use crate::domain::{
        Actor, BoxType, ErrorKind, IntakeChannel, LedgerConfig, LedgerError, LedgerResult,
        NewTerminal, SectionId, SerialNumber, TerminalStatus, VerificationOutcome,
    };
    pub use crate::ports::{
        FixedTimeSource, SystemTimeSource, TerminalLedgerApi, TimeSource, WarehouseRepository,
    };
    pub use crate::service::TerminalLedgerService;
}
