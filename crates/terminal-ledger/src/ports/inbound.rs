//! # Inbound Port - TerminalLedgerApi
//!
//! Primary driving port exposing every ledger operation.
//!
//! | Group | Methods |
//! |-------|---------|
//! | Intake | `create_terminal`, `place_terminal`, `move_terminal` |
//! | Verification | `begin_verification_batch`, `process_verification_request`, `update_verification_request_details`, `set_verification_outcome`, `record_post_shipment_verification` |
//! | Outbound flow | `ship_terminal`, `rent_terminal`, `return_terminal`, `update_shipment_date` |
//! | Contragents | `add_contragent`, `remove_contragent`, `list_contragents` |
//! | Background | `run_expiry_sweep` |
//! | Reads | `list_terminals`, `get_terminal`, `list_sections`, `available_sections`, `list_shipments`, `list_verification_requests`, `status` |

use chrono::NaiveDate;

use crate::domain::{
    Actor, BoxType, IntakeChannel, LedgerResult, NewTerminal, Placement, SectionId, SectionView,
    SerialNumber, Shipment, SweepReport, Terminal, Timestamp, VerificationOutcome,
    VerificationRequest, WarehouseStatus,
};

/// Primary API of the terminal ledger.
///
/// Every mutation takes the [`Actor`] supplied by the session layer and is
/// atomic: it either fully applies or returns an error with no visible
/// change.
///
/// # Example
///
/// ```rust,ignore
/// use terminal_ledger::prelude::*;
///
/// fn intake(ledger: &impl TerminalLedgerApi, actor: &Actor) -> LedgerResult<()> {
///     ledger.create_terminal(NewTerminal::new("170240001", BoxType::A).in_section("12121"), actor)?;
///     ledger.begin_verification_batch(&[SerialNumber::new("170240001")], None, actor)?;
///     Ok(())
/// }
/// ```
pub trait TerminalLedgerApi: Send + Sync {
    // =========================================================================
    // INTAKE AND PLACEMENT
    // =========================================================================

    /// Registers a terminal, optionally placing it.
    ///
    /// # Errors
    /// - `Validation`: blank serial
    /// - `Conflict`: duplicate serial, intake channel mismatch, box-type
    ///   mismatch or exhausted section
    /// - `NotFound`: unknown section
    fn create_terminal(&self, new: NewTerminal, actor: &Actor) -> LedgerResult<Terminal>;

    /// Places an unplaced terminal in the first free cell of `section`.
    fn place_terminal(
        &self,
        serial: &SerialNumber,
        section: &SectionId,
        actor: &Actor,
    ) -> LedgerResult<Placement>;

    /// Moves a placed terminal to another section.
    fn move_terminal(
        &self,
        serial: &SerialNumber,
        to: &SectionId,
        actor: &Actor,
    ) -> LedgerResult<Placement>;

    // =========================================================================
    // VERIFICATION
    // =========================================================================

    /// Sends terminals to verification under one request.
    ///
    /// A blank or missing `request_id` gets a generated sequential id.
    fn begin_verification_batch(
        &self,
        ids: &[SerialNumber],
        request_id: Option<&str>,
        actor: &Actor,
    ) -> LedgerResult<VerificationRequest>;

    /// Marks a pending request processed.
    fn process_verification_request(
        &self,
        id: &str,
        actor: &Actor,
    ) -> LedgerResult<VerificationRequest>;

    /// Renames and re-dates a request.
    fn update_verification_request_details(
        &self,
        old_id: &str,
        new_id: &str,
        created_at: Timestamp,
        actor: &Actor,
    ) -> LedgerResult<VerificationRequest>;

    fn set_verification_outcome(
        &self,
        serial: &SerialNumber,
        outcome: VerificationOutcome,
        actor: &Actor,
    ) -> LedgerResult<Terminal>;

    /// Enters inspection data for a terminal that already left.
    fn record_post_shipment_verification(
        &self,
        serial: &SerialNumber,
        verified_on: NaiveDate,
        valid_until: NaiveDate,
        actor: &Actor,
    ) -> LedgerResult<Terminal>;

    // =========================================================================
    // SHIPMENT AND RENTAL
    // =========================================================================

    fn ship_terminal(
        &self,
        serial: &SerialNumber,
        contragent: &str,
        actor: &Actor,
    ) -> LedgerResult<Shipment>;

    fn rent_terminal(
        &self,
        serial: &SerialNumber,
        contragent: &str,
        actor: &Actor,
    ) -> LedgerResult<Terminal>;

    /// Takes a rented terminal back.
    ///
    /// # Errors
    /// - `InvalidState`: terminal is not rented
    fn return_terminal(&self, serial: &SerialNumber, actor: &Actor) -> LedgerResult<Terminal>;

    /// Corrects the date of the terminal's latest shipment.
    fn update_shipment_date(
        &self,
        serial: &SerialNumber,
        shipping_date: Timestamp,
        actor: &Actor,
    ) -> LedgerResult<Shipment>;

    // =========================================================================
    // CONTRAGENTS
    // =========================================================================

    /// Returns false if the name is blank or already known.
    fn add_contragent(&self, name: &str, actor: &Actor) -> LedgerResult<bool>;

    /// Removes a manual entry. Names derived from shipments and rentals stay.
    fn remove_contragent(&self, name: &str, actor: &Actor) -> LedgerResult<bool>;

    fn list_contragents(&self) -> Vec<String>;

    // =========================================================================
    // BACKGROUND
    // =========================================================================

    /// Expires every verified terminal whose validity ended before today.
    fn run_expiry_sweep(&self) -> LedgerResult<SweepReport>;

    // =========================================================================
    // READS
    // =========================================================================

    fn list_terminals(&self) -> Vec<Terminal>;

    fn get_terminal(&self, serial: &SerialNumber) -> LedgerResult<Terminal>;

    fn list_sections(&self) -> Vec<SectionView>;

    /// Sections that can take a terminal of `box_type` from `channel`.
    fn available_sections(&self, channel: IntakeChannel, box_type: BoxType) -> Vec<SectionView>;

    /// Newest first.
    fn list_shipments(&self) -> Vec<Shipment>;

    /// Newest first.
    fn list_verification_requests(&self) -> Vec<VerificationRequest>;

    fn status(&self) -> WarehouseStatus;
}
