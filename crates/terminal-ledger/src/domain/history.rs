//! # Audit Log
//!
//! Strictly ordered, append-only history per terminal.
//!
//! Every event carries a typed [`EventKind`] payload next to its rendered
//! description, so contragent names, request ids and shipment references are
//! read from fields, never parsed back out of text.
//!
//! ## Corrective Operations
//!
//! Only three operations touch existing entries:
//!
//! | Operation | Used by | Effect |
//! |-----------|---------|--------|
//! | `rename_request_reference()` | request rename | rewrites request id + text |
//! | `redate_shipment()` | shipment date correction | rewrites one timestamp |
//! | `compact_for_return()` | rental return | drops non-verification events |

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::entities::{Actor, SectionId, Timestamp};

/// Structured payload of a history event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    AddedToWarehouse,
    AddedToRentalFleet,
    Placed {
        section: SectionId,
    },
    Moved {
        from: SectionId,
        to: SectionId,
    },
    AddedToVerificationRequest {
        request_id: String,
    },
    Verified {
        verified_on: NaiveDate,
        valid_until: NaiveDate,
    },
    VerificationRecordedAfterShipment {
        verified_on: NaiveDate,
        valid_until: NaiveDate,
    },
    MarkedPending,
    ResetToNotVerified,
    Shipped {
        contragent: String,
        shipment_id: u64,
        expired_at_shipment: bool,
    },
    Rented {
        contragent: String,
        expired_at_rental: bool,
    },
    ReturnedFromRental,
    VerificationExpired,
}

impl EventKind {
    /// Human-readable rendering stored alongside the payload.
    pub fn describe(&self) -> String {
        match self {
            Self::AddedToWarehouse => "Добавлен на склад".to_string(),
            Self::AddedToRentalFleet => "Добавлен в арендный фонд".to_string(),
            Self::Placed { section } => format!("Размещен на стеллаже {section}"),
            Self::Moved { from, to } => format!("Перемещен со стеллажа {from} на {to}"),
            Self::AddedToVerificationRequest { request_id } => {
                format!("Добавлен в заявку на поверку {request_id}")
            }
            Self::Verified { .. } => "Поверен".to_string(),
            Self::VerificationRecordedAfterShipment { .. } => {
                "Данные о поверке внесены (после отгрузки)".to_string()
            }
            Self::MarkedPending => "Переведен в статус \"Ожидание\"".to_string(),
            Self::ResetToNotVerified => "Статус сброшен на \"Не поверен\"".to_string(),
            Self::Shipped {
                contragent,
                expired_at_shipment,
                ..
            } => {
                if *expired_at_shipment {
                    format!("Отгружен контрагенту (с истекшим сроком поверки): {contragent}")
                } else {
                    format!("Отгружен контрагенту: {contragent}")
                }
            }
            Self::Rented {
                contragent,
                expired_at_rental,
            } => {
                if *expired_at_rental {
                    format!("Передан в аренду контрагенту (с истекшим сроком поверки): {contragent}")
                } else {
                    format!("Передан в аренду контрагенту: {contragent}")
                }
            }
            Self::ReturnedFromRental => "Возвращен на арендный склад".to_string(),
            Self::VerificationExpired => {
                "Статус изменен на \"Просрочен\" из-за истечения срока поверки".to_string()
            }
        }
    }

    /// Events that survive the return-from-rental compaction: completed
    /// verifications and the rental-fleet intake.
    pub fn survives_return(&self) -> bool {
        matches!(self, Self::Verified { .. } | Self::AddedToRentalFleet)
    }

    /// Request id referenced by this event, if any.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::AddedToVerificationRequest { request_id } => Some(request_id),
            _ => None,
        }
    }

    /// Contragent referenced by a rental event.
    pub fn rental_contragent(&self) -> Option<&str> {
        match self {
            Self::Rented { contragent, .. } => Some(contragent),
            _ => None,
        }
    }
}

/// One entry of a terminal's audit trail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub timestamp: Timestamp,
    pub description: String,
    pub responsible: Actor,
    pub kind: EventKind,
}

impl HistoryEvent {
    pub fn new(kind: EventKind, responsible: Actor, timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            description: kind.describe(),
            responsible,
            kind,
        }
    }
}

/// Ordered audit trail of a single terminal.
///
/// No mutable access to entries is exposed outside the corrective operations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History(Vec<HistoryEvent>);

impl History {
    /// Appends an event at the end, preserving prior order.
    pub fn append(&mut self, event: HistoryEvent) {
        self.0.push(event);
    }

    /// Convenience for `append(HistoryEvent::new(..))`.
    pub fn record(&mut self, kind: EventKind, responsible: &Actor, timestamp: Timestamp) {
        self.append(HistoryEvent::new(kind, responsible.clone(), timestamp));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HistoryEvent> {
        self.0.iter()
    }

    pub fn last(&self) -> Option<&HistoryEvent> {
        self.0.last()
    }

    pub fn as_slice(&self) -> &[HistoryEvent] {
        &self.0
    }

    /// Rewrites the payload of every entry matching `predicate`, re-rendering
    /// its description. Order and timestamps are preserved.
    ///
    /// Returns the number of rewritten entries.
    pub fn retag<P, R>(&mut self, predicate: P, rewrite: R) -> usize
    where
        P: Fn(&EventKind) -> bool,
        R: Fn(&EventKind) -> EventKind,
    {
        let mut rewritten = 0;
        for event in self.0.iter_mut().filter(|e| predicate(&e.kind)) {
            event.kind = rewrite(&event.kind);
            event.description = event.kind.describe();
            rewritten += 1;
        }
        rewritten
    }

    /// Points every reference to request `old_id` at `new_id`.
    pub fn rename_request_reference(&mut self, old_id: &str, new_id: &str) -> usize {
        self.retag(
            |kind| kind.request_id() == Some(old_id),
            |_| EventKind::AddedToVerificationRequest {
                request_id: new_id.to_string(),
            },
        )
    }

    /// Moves the timestamp of the event recording shipment `shipment_id`.
    ///
    /// Returns false if no such event exists.
    pub fn redate_shipment(&mut self, shipment_id: u64, timestamp: Timestamp) -> bool {
        let target = self.0.iter_mut().find(|e| {
            matches!(e.kind, EventKind::Shipped { shipment_id: id, .. } if id == shipment_id)
        });
        match target {
            Some(event) => {
                event.timestamp = timestamp;
                true
            }
            None => false,
        }
    }

    /// Keeps only completed verifications and the rental-fleet intake event.
    pub fn compact_for_return(&mut self) {
        self.0.retain(|e| e.kind.survives_return());
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a HistoryEvent;
    type IntoIter = std::slice::Iter<'a, HistoryEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
