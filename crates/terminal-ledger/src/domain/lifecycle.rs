//! # Terminal Lifecycle
//!
//! Status transitions applied to a single terminal.
//!
//! | Operation | From | To |
//! |-----------|------|----|
//! | batch | any | `pending` |
//! | verify | `awaits_verification_after_shipping` | `shipped` |
//! | verify | any other | `verified` |
//! | ship | `pending`, `not_verified`, `expired` | `awaits_verification_after_shipping` |
//! | ship | any other | `shipped` |
//! | rent | any | `rented` |
//! | return | `rented` | `not_verified` |
//! | sweep | `verified` and past `verified_until` | `expired` |
//!
//! Every function here either fully applies its transition or returns an
//! error without touching the terminal.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::entities::{Actor, Terminal, TerminalStatus, Timestamp};
use super::errors::{LedgerError, LedgerResult};
use super::history::EventKind;

/// Operator-chosen result of an inspection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VerificationOutcome {
    Verified {
        verified_on: NaiveDate,
        valid_until: NaiveDate,
    },
    Pending,
    NotVerified,
}

fn check_window(verified_on: NaiveDate, valid_until: NaiveDate) -> LedgerResult<()> {
    if valid_until < verified_on {
        return Err(LedgerError::InvalidVerificationWindow {
            verified_on,
            valid_until,
        });
    }
    Ok(())
}

/// Status reached after a successful verification.
pub fn status_after_verification(previous: TerminalStatus) -> TerminalStatus {
    match previous {
        TerminalStatus::AwaitsVerificationAfterShipping => TerminalStatus::Shipped,
        _ => TerminalStatus::Verified,
    }
}

/// Status reached after shipping from `before`.
pub fn status_after_shipment(before: TerminalStatus) -> TerminalStatus {
    match before {
        TerminalStatus::Pending | TerminalStatus::NotVerified | TerminalStatus::Expired => {
            TerminalStatus::AwaitsVerificationAfterShipping
        }
        _ => TerminalStatus::Shipped,
    }
}

/// Applies an inspection outcome.
pub fn apply_outcome(
    terminal: &mut Terminal,
    outcome: VerificationOutcome,
    actor: &Actor,
    now: Timestamp,
) -> LedgerResult<()> {
    match outcome {
        VerificationOutcome::Verified {
            verified_on,
            valid_until,
        } => {
            check_window(verified_on, valid_until)?;
            terminal.status = status_after_verification(terminal.status);
            terminal.last_verification_date = Some(verified_on);
            terminal.verified_until = Some(valid_until);
            terminal.history.record(
                EventKind::Verified {
                    verified_on,
                    valid_until,
                },
                actor,
                now,
            );
        }
        VerificationOutcome::Pending => {
            terminal.status = TerminalStatus::Pending;
            terminal.history.record(EventKind::MarkedPending, actor, now);
        }
        VerificationOutcome::NotVerified => {
            terminal.status = TerminalStatus::NotVerified;
            terminal
                .history
                .record(EventKind::ResetToNotVerified, actor, now);
        }
    }
    Ok(())
}

/// Records inspection data entered after the terminal already left.
pub fn record_post_shipment_verification(
    terminal: &mut Terminal,
    verified_on: NaiveDate,
    valid_until: NaiveDate,
    actor: &Actor,
    now: Timestamp,
) -> LedgerResult<()> {
    check_window(verified_on, valid_until)?;
    terminal.status = status_after_verification(terminal.status);
    terminal.last_verification_date = Some(verified_on);
    terminal.verified_until = Some(valid_until);
    terminal.history.record(
        EventKind::VerificationRecordedAfterShipment {
            verified_on,
            valid_until,
        },
        actor,
        now,
    );
    Ok(())
}

/// Marks the terminal as part of a verification batch.
pub fn enter_batch(terminal: &mut Terminal, request_id: &str, actor: &Actor, now: Timestamp) {
    terminal.status = TerminalStatus::Pending;
    terminal.history.record(
        EventKind::AddedToVerificationRequest {
            request_id: request_id.to_string(),
        },
        actor,
        now,
    );
}

/// Ships the terminal. Returns the status it had before.
pub fn ship(
    terminal: &mut Terminal,
    contragent: &str,
    shipment_id: u64,
    actor: &Actor,
    now: Timestamp,
) -> TerminalStatus {
    let before = terminal.status;
    terminal.status = status_after_shipment(before);
    terminal.placement = None;
    terminal.rented_to = None;
    terminal.history.record(
        EventKind::Shipped {
            contragent: contragent.to_string(),
            shipment_id,
            expired_at_shipment: before == TerminalStatus::Expired,
        },
        actor,
        now,
    );
    before
}

/// Hands the terminal over to a renting contragent.
pub fn rent(terminal: &mut Terminal, contragent: &str, actor: &Actor, now: Timestamp) {
    let expired = terminal.status == TerminalStatus::Expired;
    terminal.status = TerminalStatus::Rented;
    terminal.rented_to = Some(contragent.to_string());
    terminal.placement = None;
    terminal.history.record(
        EventKind::Rented {
            contragent: contragent.to_string(),
            expired_at_rental: expired,
        },
        actor,
        now,
    );
}

/// Takes a rented terminal back into the rental fleet.
///
/// # Errors
/// - `InvalidTransition`: terminal is not rented
pub fn return_from_rental(terminal: &mut Terminal, actor: &Actor, now: Timestamp) -> LedgerResult<()> {
    if terminal.status != TerminalStatus::Rented {
        return Err(LedgerError::InvalidTransition {
            serial: terminal.serial.clone(),
            status: terminal.status,
            operation: "return",
        });
    }
    terminal.status = TerminalStatus::NotVerified;
    terminal.rented_to = None;
    terminal.placement = None;
    terminal.history.compact_for_return();
    terminal
        .history
        .record(EventKind::ReturnedFromRental, actor, now);
    Ok(())
}

/// True when a verified terminal's validity ended before `today`.
pub fn is_overdue(terminal: &Terminal, today: NaiveDate) -> bool {
    terminal.status == TerminalStatus::Verified
        && terminal.verified_until.is_some_and(|until| until < today)
}

/// Expires an overdue terminal. Returns false if nothing changed.
pub fn expire_if_overdue(terminal: &mut Terminal, today: NaiveDate, now: Timestamp) -> bool {
    if !is_overdue(terminal, today) {
        return false;
    }
    terminal.status = TerminalStatus::Expired;
    terminal
        .history
        .record(EventKind::VerificationExpired, &Actor::system(), now);
    true
}
