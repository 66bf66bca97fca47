//! # Warehouse State
//!
//! The complete, serializable entity set: terminals, shelf sections,
//! shipments, verification requests and manual contragents.
//!
//! Every mutating method validates first and only then writes, so an `Err`
//! leaves the warehouse unchanged. Section occupancy and the contragent list
//! are projected from this state on read.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::allocation;
use super::capacity::{has_free_cell, is_homogeneity_violation, SectionView};
use super::contragents::ContragentRegistry;
use super::entities::{
    Actor, BoxType, Placement, SectionId, SerialNumber, Shipment, ShelfSection, Terminal,
    TerminalStatus, Timestamp, VerificationRequest,
};
use super::errors::{LedgerError, LedgerResult};
use super::lifecycle::{self, VerificationOutcome};
use super::requests::VerificationLedger;
use super::services::{validate_intake, FleetClassifier};
use super::value_objects::{IntakeChannel, LedgerConfig, NewTerminal, WarehouseStatus};

/// The authoritative warehouse state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    terminals: BTreeMap<SerialNumber, Terminal>,
    sections: Vec<ShelfSection>,
    /// Newest first.
    shipments: Vec<Shipment>,
    requests: VerificationLedger,
    contragents: ContragentRegistry,
    next_shipment_id: u64,
}

impl Warehouse {
    pub fn new(sections: Vec<ShelfSection>, contragents: ContragentRegistry) -> Self {
        Self {
            terminals: BTreeMap::new(),
            sections,
            shipments: Vec::new(),
            requests: VerificationLedger::default(),
            contragents,
            next_shipment_id: 1,
        }
    }

    /// Empty warehouse with the configured layout and seeded contragents.
    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(
            config.shelf_layout.clone(),
            ContragentRegistry::with_names(&config.initial_contragents),
        )
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    pub fn terminal(&self, serial: &SerialNumber) -> Option<&Terminal> {
        self.terminals.get(serial)
    }

    /// Terminals ordered by serial number.
    pub fn terminals(&self) -> impl Iterator<Item = &Terminal> {
        self.terminals.values()
    }

    pub fn terminal_count(&self) -> usize {
        self.terminals.len()
    }

    pub fn sections(&self) -> &[ShelfSection] {
        &self.sections
    }

    pub fn section(&self, id: &SectionId) -> Option<&ShelfSection> {
        self.sections.iter().find(|s| &s.id == id)
    }

    pub fn section_view(&self, id: &SectionId) -> LedgerResult<SectionView> {
        let section = self
            .section(id)
            .ok_or_else(|| LedgerError::SectionNotFound(id.clone()))?;
        Ok(SectionView::project(section, self.terminals.values()))
    }

    /// Views of every section in layout order.
    pub fn section_views(&self) -> Vec<SectionView> {
        self.sections
            .iter()
            .map(|s| SectionView::project(s, self.terminals.values()))
            .collect()
    }

    /// Sections a terminal of `box_type` arriving through `channel` can go to:
    /// the channel's tiers, either empty or holding the same box type with a
    /// free cell.
    pub fn available_sections(&self, channel: IntakeChannel, box_type: BoxType) -> Vec<SectionView> {
        self.section_views()
            .into_iter()
            .filter(|view| channel.accepts_tier(view.tier))
            .filter(|view| {
                view.is_empty()
                    || (!is_homogeneity_violation(view, box_type) && has_free_cell(view, box_type))
            })
            .collect()
    }

    /// Shipments, newest first.
    pub fn shipments(&self) -> &[Shipment] {
        &self.shipments
    }

    pub fn requests(&self) -> &VerificationLedger {
        &self.requests
    }

    pub fn manual_contragents(&self) -> &[String] {
        self.contragents.manual()
    }

    /// Contragent names implied by shipments (newest first) and by the rental
    /// events of currently rented terminals.
    pub fn derived_contragents(&self) -> Vec<String> {
        let shipped = self.shipments.iter().map(|s| s.contragent.clone());
        let rented = self
            .terminals
            .values()
            .filter(|t| t.status == TerminalStatus::Rented)
            .flat_map(|t| t.history.iter())
            .filter_map(|e| e.kind.rental_contragent().map(str::to_string));
        shipped.chain(rented).collect()
    }

    pub fn contragents(&self) -> Vec<String> {
        self.contragents.list(&self.derived_contragents())
    }

    pub fn status(&self) -> WarehouseStatus {
        let mut by_status: HashMap<TerminalStatus, usize> = HashMap::new();
        for terminal in self.terminals.values() {
            *by_status.entry(terminal.status).or_default() += 1;
        }
        let placed = self.terminals.values().filter(|t| t.is_placed()).count();

        WarehouseStatus {
            total_terminals: self.terminals.len(),
            by_status,
            placed,
            unplaced: self.terminals.len() - placed,
            sections: self.sections.len(),
            occupied_sections: self.section_views().iter().filter(|v| !v.is_empty()).count(),
            shipments: self.shipments.len(),
            verification_requests: self.requests.len(),
            pending_requests: self.requests.pending_count(),
            contragents: self.contragents().len(),
        }
    }

    // =========================================================================
    // TERMINAL INTAKE AND PLACEMENT
    // =========================================================================

    /// Registers a terminal, optionally placing it in one step.
    ///
    /// # Errors
    /// - `EmptyIdentifier`: blank serial
    /// - `DuplicateSerial`: serial already registered
    /// - `SectionNotFound`: unknown target section
    /// - `SerialChannelMismatch` / `SectionChannelMismatch`: intake channel rules
    /// - `BoxTypeMismatch` / `CapacityExhausted`: target section cannot take it
    pub fn create_terminal(
        &mut self,
        new: NewTerminal,
        classifier: &FleetClassifier,
        actor: &Actor,
        now: Timestamp,
    ) -> LedgerResult<&Terminal> {
        let serial = SerialNumber::parse(&new.serial)?;
        if self.terminals.contains_key(&serial) {
            return Err(LedgerError::DuplicateSerial(serial));
        }

        let target = match &new.section {
            Some(id) => Some(
                self.section(id)
                    .ok_or_else(|| LedgerError::SectionNotFound(id.clone()))?,
            ),
            None => None,
        };
        if let Some(channel) = new.channel {
            validate_intake(channel, classifier, &serial, target)?;
        }

        let fleet = classifier.classify(&serial);
        let mut terminal = Terminal::new(
            serial.clone(),
            classifier.model_for(fleet),
            new.box_type,
            fleet,
        );
        terminal
            .history
            .record(FleetClassifier::intake_event(fleet), actor, now);

        if let Some(id) = &new.section {
            let view = self.placement_view(id, terminal.box_type)?;
            allocation::allocate(&mut terminal, &view, actor, now)?;
        }

        debug!(serial = %serial, fleet = ?fleet, "terminal registered");
        Ok(self.terminals.entry(serial).or_insert(terminal))
    }

    /// Places an unplaced terminal in the first free cell of `section`.
    pub fn place_terminal(
        &mut self,
        serial: &SerialNumber,
        section: &SectionId,
        actor: &Actor,
        now: Timestamp,
    ) -> LedgerResult<Placement> {
        let terminal = self.existing(serial)?;
        if let Some(current) = terminal.section() {
            return Err(LedgerError::AlreadyPlaced {
                serial: serial.clone(),
                section: current.clone(),
            });
        }
        let view = self.placement_view(section, terminal.box_type)?;

        let terminal = self.existing_mut(serial)?;
        allocation::allocate(terminal, &view, actor, now)
    }

    /// Moves a placed terminal to the first free cell of another section.
    pub fn move_terminal(
        &mut self,
        serial: &SerialNumber,
        to: &SectionId,
        actor: &Actor,
        now: Timestamp,
    ) -> LedgerResult<Placement> {
        let terminal = self.existing(serial)?;
        let current = terminal
            .section()
            .ok_or_else(|| LedgerError::NotPlaced(serial.clone()))?;
        if current == to {
            return Err(LedgerError::AlreadyPlaced {
                serial: serial.clone(),
                section: to.clone(),
            });
        }
        let view = self.placement_view(to, terminal.box_type)?;

        let terminal = self.existing_mut(serial)?;
        allocation::allocate(terminal, &view, actor, now)
    }

    /// View of `id` for an incoming terminal, rejecting mixed box types.
    fn placement_view(&self, id: &SectionId, box_type: BoxType) -> LedgerResult<SectionView> {
        let view = self.section_view(id)?;
        match view.current_box_type {
            Some(current) if is_homogeneity_violation(&view, box_type) => {
                Err(LedgerError::BoxTypeMismatch {
                    section: id.clone(),
                    current,
                    incoming: box_type,
                })
            }
            _ => Ok(view),
        }
    }

    // =========================================================================
    // VERIFICATION
    // =========================================================================

    /// Moves every listed terminal to `pending` under a new request.
    ///
    /// `generate` produces the id for an ordinal when no custom id is given.
    pub fn begin_verification_batch<F>(
        &mut self,
        ids: &[SerialNumber],
        custom_id: Option<&str>,
        generate: F,
        actor: &Actor,
        now: Timestamp,
    ) -> LedgerResult<VerificationRequest>
    where
        F: Fn(usize) -> String,
    {
        let mut batch: Vec<SerialNumber> = Vec::with_capacity(ids.len());
        for serial in ids {
            if !batch.contains(serial) {
                batch.push(serial.clone());
            }
        }
        if batch.is_empty() {
            return Err(LedgerError::EmptyBatch);
        }
        if let Some(missing) = batch.iter().find(|s| !self.terminals.contains_key(*s)) {
            return Err(LedgerError::TerminalNotFound(missing.clone()));
        }
        let request_id = self.requests.allocate_id(custom_id, generate)?;

        for serial in &batch {
            let terminal = self.existing_mut(serial)?;
            lifecycle::enter_batch(terminal, &request_id, actor, now);
        }
        Ok(self
            .requests
            .open(request_id, batch, actor.clone(), now)
            .clone())
    }

    /// Marks a request processed. Terminal statuses are not touched.
    pub fn process_verification_request(
        &mut self,
        id: &str,
        now: Timestamp,
    ) -> LedgerResult<VerificationRequest> {
        self.requests.process(id, now).cloned()
    }

    /// Renames and re-dates a request, retagging every history reference.
    pub fn update_verification_request_details(
        &mut self,
        old_id: &str,
        new_id: &str,
        created_at: Timestamp,
    ) -> LedgerResult<VerificationRequest> {
        let new_id = self.requests.update_details(old_id, new_id, created_at)?;
        if new_id != old_id {
            let retagged: usize = self
                .terminals
                .values_mut()
                .map(|t| t.history.rename_request_reference(old_id, &new_id))
                .sum();
            debug!(old_id, new_id = %new_id, retagged, "verification request renamed");
        }
        self.requests
            .get(&new_id)
            .cloned()
            .ok_or(LedgerError::RequestNotFound(new_id))
    }

    pub fn set_verification_outcome(
        &mut self,
        serial: &SerialNumber,
        outcome: VerificationOutcome,
        actor: &Actor,
        now: Timestamp,
    ) -> LedgerResult<&Terminal> {
        let terminal = self.existing_mut(serial)?;
        lifecycle::apply_outcome(terminal, outcome, actor, now)?;
        Ok(terminal)
    }

    pub fn record_post_shipment_verification(
        &mut self,
        serial: &SerialNumber,
        verified_on: NaiveDate,
        valid_until: NaiveDate,
        actor: &Actor,
        now: Timestamp,
    ) -> LedgerResult<&Terminal> {
        let terminal = self.existing_mut(serial)?;
        lifecycle::record_post_shipment_verification(terminal, verified_on, valid_until, actor, now)?;
        Ok(terminal)
    }

    // =========================================================================
    // SHIPMENT AND RENTAL
    // =========================================================================

    /// Ships a terminal to `contragent`, registering the name if new.
    pub fn ship_terminal(
        &mut self,
        serial: &SerialNumber,
        contragent: &str,
        actor: &Actor,
        now: Timestamp,
    ) -> LedgerResult<Shipment> {
        self.existing(serial)?;
        let contragent = self.resolve_contragent(contragent)?;
        let shipment_id = self.next_shipment_id.max(1);

        let terminal = self.existing_mut(serial)?;
        let status_before_shipment = lifecycle::ship(terminal, &contragent, shipment_id, actor, now);

        let shipment = Shipment {
            id: shipment_id,
            terminal_id: serial.clone(),
            shipping_date: now,
            contragent,
            status_before_shipment,
        };
        self.shipments.insert(0, shipment.clone());
        self.next_shipment_id = shipment_id + 1;
        Ok(shipment)
    }

    /// Rents a terminal out to `contragent`, registering the name if new.
    pub fn rent_terminal(
        &mut self,
        serial: &SerialNumber,
        contragent: &str,
        actor: &Actor,
        now: Timestamp,
    ) -> LedgerResult<&Terminal> {
        self.existing(serial)?;
        let contragent = self.resolve_contragent(contragent)?;

        let terminal = self.existing_mut(serial)?;
        lifecycle::rent(terminal, &contragent, actor, now);
        Ok(terminal)
    }

    pub fn return_terminal(
        &mut self,
        serial: &SerialNumber,
        actor: &Actor,
        now: Timestamp,
    ) -> LedgerResult<&Terminal> {
        let terminal = self.existing_mut(serial)?;
        lifecycle::return_from_rental(terminal, actor, now)?;
        Ok(terminal)
    }

    /// Corrects the date of the terminal's latest shipment and its history
    /// event.
    pub fn update_shipment_date(
        &mut self,
        serial: &SerialNumber,
        shipping_date: Timestamp,
    ) -> LedgerResult<Shipment> {
        self.existing(serial)?;
        let shipment = self
            .shipments
            .iter_mut()
            .find(|s| &s.terminal_id == serial)
            .ok_or_else(|| LedgerError::ShipmentNotFound(serial.clone()))?;
        shipment.shipping_date = shipping_date;
        let shipment = shipment.clone();

        let terminal = self.existing_mut(serial)?;
        terminal.history.redate_shipment(shipment.id, shipping_date);
        Ok(shipment)
    }

    // =========================================================================
    // CONTRAGENTS
    // =========================================================================

    pub fn add_contragent(&mut self, name: &str) -> bool {
        let derived = self.derived_contragents();
        self.contragents.add(name, &derived)
    }

    pub fn remove_contragent(&mut self, name: &str) -> bool {
        self.contragents.remove(name)
    }

    fn resolve_contragent(&mut self, name: &str) -> LedgerResult<String> {
        let derived = self.derived_contragents();
        self.contragents
            .resolve(name, &derived)
            .ok_or(LedgerError::EmptyIdentifier { field: "contragent" })
    }

    // =========================================================================
    // EXPIRY
    // =========================================================================

    /// Serials of verified terminals whose validity ended before `today`.
    pub fn overdue(&self, today: NaiveDate) -> Vec<SerialNumber> {
        self.terminals
            .values()
            .filter(|t| lifecycle::is_overdue(t, today))
            .map(|t| t.serial.clone())
            .collect()
    }

    /// Expires every overdue terminal. Returns the expired serials.
    pub fn expire_overdue(&mut self, today: NaiveDate, now: Timestamp) -> Vec<SerialNumber> {
        self.terminals
            .values_mut()
            .filter_map(|t| lifecycle::expire_if_overdue(t, today, now).then(|| t.serial.clone()))
            .collect()
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    fn existing(&self, serial: &SerialNumber) -> LedgerResult<&Terminal> {
        self.terminals
            .get(serial)
            .ok_or_else(|| LedgerError::TerminalNotFound(serial.clone()))
    }

    fn existing_mut(&mut self, serial: &SerialNumber) -> LedgerResult<&mut Terminal> {
        self.terminals
            .get_mut(serial)
            .ok_or_else(|| LedgerError::TerminalNotFound(serial.clone()))
    }
}
