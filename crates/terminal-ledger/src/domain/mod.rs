//! # Domain Layer - Terminal Ledger
//!
//! Pure business logic. No I/O, no clocks, no locks.
//!
//! ## Components
//!
//! - `entities`: Terminal, ShelfSection, Shipment, VerificationRequest, identifiers
//! - `history`: Append-only audit log with typed event payloads
//! - `contragents`: Manual contragent set and the merged projection
//! - `capacity`: Section occupancy projection and capacity checks
//! - `allocation`: First-fit cell assignment
//! - `lifecycle`: Per-terminal status transitions
//! - `requests`: Verification request ledger
//! - `warehouse`: The complete entity set and every operation on it
//! - `services`: Fleet classification, intake validation, warehouse calendar
//! - `value_objects`: LedgerConfig, NewTerminal, SweepReport, WarehouseStatus
//! - `invariants`: Whole-state consistency checks
//! - `errors`: LedgerError enumeration

pub mod allocation;
pub mod capacity;
pub mod contragents;
pub mod entities;
pub mod errors;
pub mod history;
pub mod invariants;
pub mod lifecycle;
pub mod requests;
pub mod services;
pub mod value_objects;
pub mod warehouse;

pub use capacity::*;
pub use contragents::*;
pub use entities::*;
pub use errors::*;
pub use history::*;
pub use invariants::*;
pub use lifecycle::VerificationOutcome;
pub use requests::*;
pub use services::*;
pub use value_objects::*;
pub use warehouse::*;
