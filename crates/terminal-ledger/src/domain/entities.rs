//! Core domain entities for the terminal ledger.
//!
//! Terminals, shelf sections, shipments, verification requests and the
//! identifiers that tie them together.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{LedgerError, LedgerResult};
use super::history::History;

/// Wall-clock instant of an event.
pub type Timestamp = DateTime<Utc>;

/// Parses a trimmed, non-blank identifier.
fn non_blank(raw: &str, field: &'static str) -> LedgerResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::EmptyIdentifier { field });
    }
    Ok(trimmed.to_string())
}

/// Globally unique, immutable terminal serial number.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerialNumber(String);

impl SerialNumber {
    /// Wraps a serial number without validation.
    pub fn new(serial: impl Into<String>) -> Self {
        Self(serial.into())
    }

    /// Parses operator input: trims whitespace and rejects blank values.
    pub fn parse(raw: &str) -> LedgerResult<Self> {
        non_blank(raw, "serial number").map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shelf section identifier, e.g. `"12121"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(String);

impl SectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parses operator input: trims whitespace and rejects blank values.
    pub fn parse(raw: &str) -> LedgerResult<Self> {
        non_blank(raw, "section id").map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of whoever performed an operation.
///
/// Supplied by the session layer; the ledger only records it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Actor(String);

impl Actor {
    /// Name recorded for events produced by background processes.
    pub const SYSTEM: &'static str = "Система";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The actor used by the expiry sweep.
    pub fn system() -> Self {
        Self(Self::SYSTEM.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Physical packaging size class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BoxType {
    #[serde(rename = "type_A")]
    A,
    #[serde(rename = "type_B")]
    B,
}

impl BoxType {
    pub const ALL: [BoxType; 2] = [BoxType::A, BoxType::B];
}

impl fmt::Display for BoxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoxType::A => f.write_str("A"),
            BoxType::B => f.write_str("B"),
        }
    }
}

/// Terminal status.
///
/// ```text
///                 ┌──────── batch ────────┐
///                 ↓                       │
/// [NOT_VERIFIED] ──→ [PENDING] ──verify──→ [VERIFIED] ──sweep──→ [EXPIRED]
///       ↑                                      │                    │
///       │                                      └──ship──→ [SHIPPED] │
///       │      ship from NOT_VERIFIED / PENDING / EXPIRED           │
///       │              ↓                                            │
///       │   [AWAITS_VERIFICATION_AFTER_SHIPPING] ──verify──→ [SHIPPED]
///       │
///       └──return── [RENTED] ←──rent── (any status)
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalStatus {
    #[default]
    NotVerified,
    Pending,
    Verified,
    Expired,
    Shipped,
    AwaitsVerificationAfterShipping,
    Rented,
}

impl TerminalStatus {
    pub const ALL: [TerminalStatus; 7] = [
        TerminalStatus::NotVerified,
        TerminalStatus::Pending,
        TerminalStatus::Verified,
        TerminalStatus::Expired,
        TerminalStatus::Shipped,
        TerminalStatus::AwaitsVerificationAfterShipping,
        TerminalStatus::Rented,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotVerified => "not_verified",
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Expired => "expired",
            Self::Shipped => "shipped",
            Self::AwaitsVerificationAfterShipping => "awaits_verification_after_shipping",
            Self::Rented => "rented",
        }
    }
}

impl fmt::Display for TerminalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which fleet a terminal belongs to, decided once at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fleet {
    #[default]
    Warehouse,
    Rental,
}

/// A terminal's cell inside a shelf section.
///
/// Holding the section and position together keeps `location` and `position`
/// present or absent as a unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub section: SectionId,
    /// 0-based index into the section's occupancy grid.
    pub position: u32,
}

impl Placement {
    pub fn new(section: SectionId, position: u32) -> Self {
        Self { section, position }
    }

    /// 1-based cell number shown to operators.
    pub fn cell(&self) -> u32 {
        self.position + 1
    }
}

/// A tracked measurement device.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terminal {
    pub serial: SerialNumber,
    pub model: String,
    pub status: TerminalStatus,
    pub box_type: BoxType,
    pub fleet: Fleet,
    pub placement: Option<Placement>,
    pub last_verification_date: Option<NaiveDate>,
    pub verified_until: Option<NaiveDate>,
    /// Contragent currently holding a rented terminal.
    pub rented_to: Option<String>,
    pub history: History,
}

impl Terminal {
    /// Creates an unplaced terminal in `NotVerified` status with empty history.
    pub fn new(serial: SerialNumber, model: impl Into<String>, box_type: BoxType, fleet: Fleet) -> Self {
        Self {
            serial,
            model: model.into(),
            status: TerminalStatus::NotVerified,
            box_type,
            fleet,
            placement: None,
            last_verification_date: None,
            verified_until: None,
            rented_to: None,
            history: History::default(),
        }
    }

    pub fn is_placed(&self) -> bool {
        self.placement.is_some()
    }

    pub fn section(&self) -> Option<&SectionId> {
        self.placement.as_ref().map(|p| &p.section)
    }

    pub fn is_in_section(&self, section: &SectionId) -> bool {
        self.section() == Some(section)
    }
}

/// Physical zone of a shelf section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShelfTier {
    Upper,
    Lower,
    Rental,
}

impl ShelfTier {
    /// Label used on the warehouse floor.
    pub fn label(&self) -> &'static str {
        match self {
            ShelfTier::Upper => "Верхний",
            ShelfTier::Lower => "Нижний",
            ShelfTier::Rental => "Аренда",
        }
    }
}

impl fmt::Display for ShelfTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rows x columns grid of cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellGrid {
    pub rows: u32,
    pub cols: u32,
}

impl CellGrid {
    pub const fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    pub fn cells(&self) -> u32 {
        self.rows.saturating_mul(self.cols)
    }
}

/// Capacity of a section per box type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionCapacity {
    #[serde(rename = "type_A")]
    pub type_a: CellGrid,
    #[serde(rename = "type_B")]
    pub type_b: CellGrid,
}

impl SectionCapacity {
    pub const fn new(type_a: CellGrid, type_b: CellGrid) -> Self {
        Self { type_a, type_b }
    }

    pub fn for_box(&self, box_type: BoxType) -> CellGrid {
        match box_type {
            BoxType::A => self.type_a,
            BoxType::B => self.type_b,
        }
    }
}

/// A fixed, pre-provisioned shelf section.
///
/// The current box type and the terminals it holds are derived from terminal
/// placements; see [`super::capacity::SectionView`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelfSection {
    pub id: SectionId,
    pub tier: ShelfTier,
    pub capacity: SectionCapacity,
}

impl ShelfSection {
    pub fn new(id: impl Into<String>, tier: ShelfTier, capacity: SectionCapacity) -> Self {
        Self {
            id: SectionId::new(id),
            tier,
            capacity,
        }
    }
}

/// Record of a terminal leaving the warehouse for a contragent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    /// Monotonic identifier, referenced by the matching history event.
    pub id: u64,
    pub terminal_id: SerialNumber,
    pub shipping_date: Timestamp,
    pub contragent: String,
    pub status_before_shipment: TerminalStatus,
}

/// Processing status of a verification request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationRequestStatus {
    #[default]
    Pending,
    Processed,
}

/// A named batch of terminals submitted together for inspection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub id: String,
    pub status: VerificationRequestStatus,
    pub created_at: Timestamp,
    pub processed_at: Option<Timestamp>,
    pub terminal_ids: Vec<SerialNumber>,
    pub created_by: Actor,
}

impl VerificationRequest {
    pub fn is_pending(&self) -> bool {
        self.status == VerificationRequestStatus::Pending
    }
}
