//! Ledger error types.
//!
//! Every rejected operation returns one of these; the warehouse state is left
//! untouched whenever an error is returned.

use super::entities::{BoxType, SectionId, SerialNumber, ShelfTier, TerminalStatus};

/// Broad classification of a [`LedgerError`], used by callers that map
/// failures onto user-facing messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown terminal, section, request or shipment.
    NotFound,
    /// Duplicate identifier, exhausted capacity or incompatible placement.
    Conflict,
    /// Operation not permitted from the current status.
    InvalidState,
    /// Blank identifiers or malformed input.
    Validation,
    /// Repository failure.
    Storage,
}

/// Ledger error type.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Terminal not found: {0}")]
    TerminalNotFound(SerialNumber),

    #[error("Shelf section not found: {0}")]
    SectionNotFound(SectionId),

    #[error("Verification request not found: {0}")]
    RequestNotFound(String),

    #[error("No shipment recorded for terminal {0}")]
    ShipmentNotFound(SerialNumber),

    #[error("Terminal with serial number {0} already exists")]
    DuplicateSerial(SerialNumber),

    #[error("Verification request {0} already exists")]
    DuplicateRequestId(String),

    #[error("Section {section} has no free cell ({total_cells} cells for box type {box_type})")]
    CapacityExhausted {
        section: SectionId,
        box_type: BoxType,
        total_cells: u32,
    },

    #[error("Section {section} holds box type {current}, cannot accept {incoming}")]
    BoxTypeMismatch {
        section: SectionId,
        current: BoxType,
        incoming: BoxType,
    },

    #[error("Serial number {serial} is not accepted through the {channel} intake")]
    SerialChannelMismatch { serial: SerialNumber, channel: String },

    #[error("Section {section} ({tier}) is not available to the {channel} intake")]
    SectionChannelMismatch {
        section: SectionId,
        tier: ShelfTier,
        channel: String,
    },

    #[error("Cannot {operation} terminal {serial} in status {status}")]
    InvalidTransition {
        serial: SerialNumber,
        status: TerminalStatus,
        operation: &'static str,
    },

    #[error("Terminal {serial} is already placed in section {section}")]
    AlreadyPlaced {
        serial: SerialNumber,
        section: SectionId,
    },

    #[error("Terminal {0} is not placed on any shelf")]
    NotPlaced(SerialNumber),

    #[error("Verification request {0} has already been processed")]
    RequestAlreadyProcessed(String),

    #[error("{field} must not be empty")]
    EmptyIdentifier { field: &'static str },

    #[error("Verification batch must contain at least one terminal")]
    EmptyBatch,

    #[error("Verification window is inverted: valid until {valid_until} precedes {verified_on}")]
    InvalidVerificationWindow {
        verified_on: chrono::NaiveDate,
        valid_until: chrono::NaiveDate,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TerminalNotFound(_)
            | Self::SectionNotFound(_)
            | Self::RequestNotFound(_)
            | Self::ShipmentNotFound(_) => ErrorKind::NotFound,
            Self::DuplicateSerial(_)
            | Self::DuplicateRequestId(_)
            | Self::CapacityExhausted { .. }
            | Self::BoxTypeMismatch { .. }
            | Self::SerialChannelMismatch { .. }
            | Self::SectionChannelMismatch { .. } => ErrorKind::Conflict,
            Self::InvalidTransition { .. }
            | Self::AlreadyPlaced { .. }
            | Self::NotPlaced(_)
            | Self::RequestAlreadyProcessed(_) => ErrorKind::InvalidState,
            Self::EmptyIdentifier { .. }
            | Self::EmptyBatch
            | Self::InvalidVerificationWindow { .. } => ErrorKind::Validation,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
