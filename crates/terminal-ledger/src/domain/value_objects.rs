//! Value objects and configuration for the terminal ledger.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::entities::{
    BoxType, CellGrid, SectionCapacity, SectionId, SerialNumber, ShelfSection, ShelfTier,
    TerminalStatus,
};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Ledger configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Fixed set of shelf sections.
    pub shelf_layout: Vec<ShelfSection>,
    /// Contragents registered manually at first start.
    pub initial_contragents: Vec<String>,
    /// Serial prefix that puts a terminal into the rental fleet.
    pub rental_serial_prefix: String,
    pub warehouse_model: String,
    pub rental_model: String,
    /// Warehouse UTC offset in seconds, used for expiry dates.
    pub calendar_offset_secs: i32,
    /// Prefix for generated verification request ids.
    pub request_id_prefix: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            shelf_layout: default_shelf_layout(),
            initial_contragents: vec![
                "ООО \"СтройИнвест\"".to_string(),
                "АО \"ТехноСтрой\"".to_string(),
            ],
            rental_serial_prefix: "1792".to_string(),
            warehouse_model: "Инспектор 1".to_string(),
            rental_model: "Инспектор 1 (Аренда)".to_string(),
            calendar_offset_secs: 0,
            request_id_prefix: "Заявка №".to_string(),
        }
    }
}

impl LedgerConfig {
    /// Create a config for testing: the default layout without seeded
    /// contragents.
    pub fn for_testing() -> Self {
        Self {
            initial_contragents: Vec::new(),
            ..Default::default()
        }
    }

    pub fn section(&self, id: &SectionId) -> Option<&ShelfSection> {
        self.shelf_layout.iter().find(|s| &s.id == id)
    }
}

/// The nine sections of the warehouse floor.
pub fn default_shelf_layout() -> Vec<ShelfSection> {
    const fn cap(a: (u32, u32), b: (u32, u32)) -> SectionCapacity {
        SectionCapacity::new(CellGrid::new(a.0, a.1), CellGrid::new(b.0, b.1))
    }

    vec![
        ShelfSection::new("12121", ShelfTier::Upper, cap((2, 5), (3, 6))),
        ShelfSection::new("12122", ShelfTier::Upper, cap((2, 5), (3, 7))),
        ShelfSection::new("12123", ShelfTier::Upper, cap((2, 5), (3, 6))),
        ShelfSection::new("12111", ShelfTier::Lower, cap((3, 5), (5, 6))),
        ShelfSection::new("12112", ShelfTier::Lower, cap((3, 6), (5, 7))),
        ShelfSection::new("12113", ShelfTier::Lower, cap((3, 5), (5, 6))),
        ShelfSection::new("12131", ShelfTier::Rental, cap((2, 5), (1, 5))),
        ShelfSection::new("12132", ShelfTier::Rental, cap((2, 5), (1, 5))),
        ShelfSection::new("12133", ShelfTier::Rental, cap((2, 5), (1, 5))),
    ]
}

// =============================================================================
// INPUTS
// =============================================================================

/// Intake path a terminal arrives through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeChannel {
    Warehouse,
    Rental,
}

impl fmt::Display for IntakeChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntakeChannel::Warehouse => f.write_str("warehouse"),
            IntakeChannel::Rental => f.write_str("rental"),
        }
    }
}

/// Request to register a terminal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTerminal {
    /// Raw operator input; trimmed before use.
    pub serial: String,
    pub box_type: BoxType,
    pub section: Option<SectionId>,
    /// When set, the serial and section are checked against the channel.
    pub channel: Option<IntakeChannel>,
}

impl NewTerminal {
    pub fn new(serial: impl Into<String>, box_type: BoxType) -> Self {
        Self {
            serial: serial.into(),
            box_type,
            section: None,
            channel: None,
        }
    }

    pub fn in_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(SectionId::new(section));
        self
    }

    pub fn via(mut self, channel: IntakeChannel) -> Self {
        self.channel = Some(channel);
        self
    }
}

// =============================================================================
// OUTPUTS
// =============================================================================

/// Result of one expiry sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub today: Option<NaiveDate>,
    pub expired: Vec<SerialNumber>,
}

impl SweepReport {
    pub fn expired_count(&self) -> usize {
        self.expired.len()
    }
}

/// Snapshot of warehouse totals.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WarehouseStatus {
    pub total_terminals: usize,
    pub by_status: HashMap<TerminalStatus, usize>,
    pub placed: usize,
    pub unplaced: usize,
    pub sections: usize,
    pub occupied_sections: usize,
    pub shipments: usize,
    pub verification_requests: usize,
    pub pending_requests: usize,
    pub contragents: usize,
}

impl WarehouseStatus {
    pub fn count(&self, status: TerminalStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}
