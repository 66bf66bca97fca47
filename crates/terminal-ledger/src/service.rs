//! Terminal Ledger Service
//!
//! Owns the warehouse state and funnels every mutation through one write
//! lock.
//!
//! # Mutation Protocol
//!
//! ```text
//! write lock ─→ clone draft ─→ apply operation ─→ repository.save(draft) ─→ swap in
//!                                   │                     │
//!                                   └── Err ──────────────┴──→ state untouched
//! ```
//!
//! Readers take the read lock and never observe a draft. Cross-section moves
//! need no lock ordering because there is only one lock.

use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::adapters::InMemoryRepository;
use crate::domain::{
    Actor, BoxType, FleetClassifier, IntakeChannel, LedgerConfig, LedgerError, LedgerResult,
    NewTerminal, Placement, SectionId, SectionView, SerialNumber, Shipment, SweepReport, Terminal,
    Timestamp, VerificationOutcome, VerificationRequest, Warehouse, WarehouseCalendar,
    WarehouseStatus,
};
use crate::ports::{
    RequestIdSource, SequentialRequestIds, SystemTimeSource, TerminalLedgerApi, TimeSource,
    WarehouseRepository,
};

/// Terminal ledger service.
pub struct TerminalLedgerService {
    state: RwLock<Warehouse>,
    repository: Arc<dyn WarehouseRepository>,
    config: LedgerConfig,
    classifier: FleetClassifier,
    calendar: WarehouseCalendar,
    time_source: Box<dyn TimeSource>,
    request_ids: Box<dyn RequestIdSource>,
}

impl TerminalLedgerService {
    /// Create a service backed by `repository`.
    ///
    /// Loads the stored state; an empty repository starts from the
    /// configured layout.
    pub fn new(config: LedgerConfig, repository: Arc<dyn WarehouseRepository>) -> LedgerResult<Self> {
        let state = match repository.load()? {
            Some(warehouse) => {
                info!(
                    terminals = warehouse.terminal_count(),
                    "[warehouse] Restored state from repository"
                );
                warehouse
            }
            None => {
                info!(
                    sections = config.shelf_layout.len(),
                    "[warehouse] Starting with an empty warehouse"
                );
                Warehouse::from_config(&config)
            }
        };
        Ok(Self::with_state(config, repository, state))
    }

    /// Create a service with an in-memory repository and empty state.
    pub fn in_memory(config: LedgerConfig) -> Self {
        let state = Warehouse::from_config(&config);
        Self::with_state(config, Arc::new(InMemoryRepository::new()), state)
    }

    fn with_state(
        config: LedgerConfig,
        repository: Arc<dyn WarehouseRepository>,
        state: Warehouse,
    ) -> Self {
        Self {
            state: RwLock::new(state),
            repository,
            classifier: FleetClassifier::from_config(&config),
            calendar: WarehouseCalendar::from_offset_secs(config.calendar_offset_secs),
            request_ids: Box::new(SequentialRequestIds::new(config.request_id_prefix.clone())),
            time_source: Box::new(SystemTimeSource),
            config,
        }
    }

    /// Set custom time source (for testing)
    pub fn with_time_source(mut self, time_source: Box<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    /// Set custom request id generator
    pub fn with_request_ids(mut self, request_ids: Box<dyn RequestIdSource>) -> Self {
        self.request_ids = request_ids;
        self
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> Warehouse {
        self.state.read().clone()
    }

    /// Calendar date the expiry sweep considers "today".
    pub fn today(&self) -> NaiveDate {
        self.calendar.today(self.time_source.now())
    }

    // === MUTATION PROTOCOL ===

    /// Applies `op` to a draft of the state and commits it once saved.
    fn mutate<T, F>(&self, operation: &'static str, actor: &Actor, op: F) -> LedgerResult<T>
    where
        F: FnOnce(&mut Warehouse, Timestamp) -> LedgerResult<T>,
    {
        self.mutate_with(operation, actor, |w, now| op(w, now).map(|v| (v, true)))
    }

    /// Like [`Self::mutate`], but `op` also reports whether it changed the
    /// draft. An unchanged draft is neither saved nor committed.
    fn mutate_with<T, F>(&self, operation: &'static str, actor: &Actor, op: F) -> LedgerResult<T>
    where
        F: FnOnce(&mut Warehouse, Timestamp) -> LedgerResult<(T, bool)>,
    {
        let mut state = self.state.write();
        let now = self.time_source.now();
        let mut draft = state.clone();

        let (value, changed) = op(&mut draft, now).map_err(|e| {
            warn!(operation, actor = %actor, kind = ?e.kind(), "[warehouse] Rejected: {}", e);
            e
        })?;
        if !changed {
            debug!(operation, actor = %actor, "[warehouse] Nothing to commit");
            return Ok(value);
        }

        self.repository.save(&draft).map_err(|e| {
            warn!(operation, actor = %actor, "[warehouse] Save failed: {}", e);
            LedgerError::from(e)
        })?;

        *state = draft;
        info!(operation, actor = %actor, "[warehouse] Committed");
        Ok(value)
    }

    fn read<T>(&self, f: impl FnOnce(&Warehouse) -> T) -> T {
        f(&self.state.read())
    }
}

impl TerminalLedgerApi for TerminalLedgerService {
    fn create_terminal(&self, new: NewTerminal, actor: &Actor) -> LedgerResult<Terminal> {
        let classifier = &self.classifier;
        self.mutate("create_terminal", actor, |w, now| {
            w.create_terminal(new, classifier, actor, now).cloned()
        })
    }

    fn place_terminal(
        &self,
        serial: &SerialNumber,
        section: &SectionId,
        actor: &Actor,
    ) -> LedgerResult<Placement> {
        self.mutate("place_terminal", actor, |w, now| {
            w.place_terminal(serial, section, actor, now)
        })
    }

    fn move_terminal(
        &self,
        serial: &SerialNumber,
        to: &SectionId,
        actor: &Actor,
    ) -> LedgerResult<Placement> {
        self.mutate("move_terminal", actor, |w, now| {
            w.move_terminal(serial, to, actor, now)
        })
    }

    fn begin_verification_batch(
        &self,
        ids: &[SerialNumber],
        request_id: Option<&str>,
        actor: &Actor,
    ) -> LedgerResult<VerificationRequest> {
        let request_ids = &self.request_ids;
        self.mutate("begin_verification_batch", actor, |w, now| {
            w.begin_verification_batch(
                ids,
                request_id,
                |ordinal| request_ids.request_id(ordinal),
                actor,
                now,
            )
        })
    }

    fn process_verification_request(
        &self,
        id: &str,
        actor: &Actor,
    ) -> LedgerResult<VerificationRequest> {
        self.mutate("process_verification_request", actor, |w, now| {
            w.process_verification_request(id, now)
        })
    }

    fn update_verification_request_details(
        &self,
        old_id: &str,
        new_id: &str,
        created_at: Timestamp,
        actor: &Actor,
    ) -> LedgerResult<VerificationRequest> {
        self.mutate("update_verification_request_details", actor, |w, _| {
            w.update_verification_request_details(old_id, new_id, created_at)
        })
    }

    fn set_verification_outcome(
        &self,
        serial: &SerialNumber,
        outcome: VerificationOutcome,
        actor: &Actor,
    ) -> LedgerResult<Terminal> {
        self.mutate("set_verification_outcome", actor, |w, now| {
            w.set_verification_outcome(serial, outcome, actor, now).cloned()
        })
    }

    fn record_post_shipment_verification(
        &self,
        serial: &SerialNumber,
        verified_on: NaiveDate,
        valid_until: NaiveDate,
        actor: &Actor,
    ) -> LedgerResult<Terminal> {
        self.mutate("record_post_shipment_verification", actor, |w, now| {
            w.record_post_shipment_verification(serial, verified_on, valid_until, actor, now)
                .cloned()
        })
    }

    fn ship_terminal(
        &self,
        serial: &SerialNumber,
        contragent: &str,
        actor: &Actor,
    ) -> LedgerResult<Shipment> {
        self.mutate("ship_terminal", actor, |w, now| {
            w.ship_terminal(serial, contragent, actor, now)
        })
    }

    fn rent_terminal(
        &self,
        serial: &SerialNumber,
        contragent: &str,
        actor: &Actor,
    ) -> LedgerResult<Terminal> {
        self.mutate("rent_terminal", actor, |w, now| {
            w.rent_terminal(serial, contragent, actor, now).cloned()
        })
    }

    fn return_terminal(&self, serial: &SerialNumber, actor: &Actor) -> LedgerResult<Terminal> {
        self.mutate("return_terminal", actor, |w, now| {
            w.return_terminal(serial, actor, now).cloned()
        })
    }

    fn update_shipment_date(
        &self,
        serial: &SerialNumber,
        shipping_date: Timestamp,
        actor: &Actor,
    ) -> LedgerResult<Shipment> {
        self.mutate("update_shipment_date", actor, |w, _| {
            w.update_shipment_date(serial, shipping_date)
        })
    }

    fn add_contragent(&self, name: &str, actor: &Actor) -> LedgerResult<bool> {
        self.mutate_with("add_contragent", actor, |w, _| {
            let added = w.add_contragent(name);
            Ok((added, added))
        })
    }

    fn remove_contragent(&self, name: &str, actor: &Actor) -> LedgerResult<bool> {
        self.mutate_with("remove_contragent", actor, |w, _| {
            let removed = w.remove_contragent(name);
            Ok((removed, removed))
        })
    }

    fn list_contragents(&self) -> Vec<String> {
        self.read(Warehouse::contragents)
    }

    fn run_expiry_sweep(&self) -> LedgerResult<SweepReport> {
        let mut state = self.state.write();
        let now = self.time_source.now();
        let today = self.calendar.today(now);

        // Status is re-checked under the write lock; a terminal re-verified
        // since the last tick is skipped.
        if state.overdue(today).is_empty() {
            debug!(%today, "[warehouse] Expiry sweep: nothing overdue");
            return Ok(SweepReport {
                today: Some(today),
                expired: Vec::new(),
            });
        }

        let mut draft = state.clone();
        let expired = draft.expire_overdue(today, now);
        self.repository.save(&draft).map_err(|e| {
            warn!("[warehouse] Expiry sweep save failed: {}", e);
            LedgerError::from(e)
        })?;
        *state = draft;

        info!(%today, expired = expired.len(), "[warehouse] Expiry sweep committed");
        Ok(SweepReport {
            today: Some(today),
            expired,
        })
    }

    fn list_terminals(&self) -> Vec<Terminal> {
        self.read(|w| w.terminals().cloned().collect())
    }

    fn get_terminal(&self, serial: &SerialNumber) -> LedgerResult<Terminal> {
        self.read(|w| {
            w.terminal(serial)
                .cloned()
                .ok_or_else(|| LedgerError::TerminalNotFound(serial.clone()))
        })
    }

    fn list_sections(&self) -> Vec<SectionView> {
        self.read(Warehouse::section_views)
    }

    fn available_sections(&self, channel: IntakeChannel, box_type: BoxType) -> Vec<SectionView> {
        self.read(|w| w.available_sections(channel, box_type))
    }

    fn list_shipments(&self) -> Vec<Shipment> {
        self.read(|w| w.shipments().to_vec())
    }

    fn list_verification_requests(&self) -> Vec<VerificationRequest> {
        self.read(|w| w.requests().iter().cloned().collect())
    }

    fn status(&self) -> WarehouseStatus {
        self.read(Warehouse::status)
    }
}
