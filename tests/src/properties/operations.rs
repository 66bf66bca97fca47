//! Operation model and strategies for the property tests.

use chrono::Duration;
use proptest::prelude::*;
use terminal_ledger::prelude::*;

use crate::fixtures::{date, rental_serial, serial, warehouse_serial, TestLedger};

/// Warehouse and rental serial pool size. Small on purpose so operations
/// collide on the same terminals.
pub const POOL: usize = 12;

/// Sections used by generated operations.
pub const SECTIONS: [&str; 5] = ["12121", "12111", "12131", "12132", "12123"];

/// One generated ledger call.
#[derive(Clone, Debug)]
pub enum Op {
    Create {
        n: usize,
        rental: bool,
        box_type: BoxType,
        section: Option<usize>,
    },
    Place {
        n: usize,
        rental: bool,
        section: usize,
    },
    Move {
        n: usize,
        rental: bool,
        section: usize,
    },
    Batch {
        members: Vec<(usize, bool)>,
    },
    Verify {
        n: usize,
        rental: bool,
        valid_days: i64,
    },
    Ship {
        n: usize,
        rental: bool,
    },
    Rent {
        n: usize,
        rental: bool,
    },
    Return {
        n: usize,
        rental: bool,
    },
    Sweep {
        advance_days: i64,
    },
}

impl Op {
    /// Serial targeted by single-terminal operations.
    pub fn target(&self) -> Option<SerialNumber> {
        match self {
            Op::Create { n, rental, .. }
            | Op::Place { n, rental, .. }
            | Op::Move { n, rental, .. }
            | Op::Verify { n, rental, .. }
            | Op::Ship { n, rental }
            | Op::Rent { n, rental }
            | Op::Return { n, rental } => Some(pool_serial(*n, *rental)),
            Op::Batch { .. } | Op::Sweep { .. } => None,
        }
    }

    pub fn is_return(&self) -> bool {
        matches!(self, Op::Return { .. })
    }
}

pub fn pool_serial(n: usize, rental: bool) -> SerialNumber {
    if rental {
        serial(&rental_serial(n))
    } else {
        serial(&warehouse_serial(n))
    }
}

fn box_type() -> impl Strategy<Value = BoxType> {
    prop_oneof![Just(BoxType::A), Just(BoxType::B)]
}

fn member() -> impl Strategy<Value = (usize, bool)> {
    (0..POOL, any::<bool>())
}

pub fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (member(), box_type(), proptest::option::of(0..SECTIONS.len())).prop_map(
            |((n, rental), box_type, section)| Op::Create { n, rental, box_type, section }
        ),
        2 => (member(), 0..SECTIONS.len())
            .prop_map(|((n, rental), section)| Op::Place { n, rental, section }),
        2 => (member(), 0..SECTIONS.len())
            .prop_map(|((n, rental), section)| Op::Move { n, rental, section }),
        1 => proptest::collection::vec(member(), 0..4).prop_map(|members| Op::Batch { members }),
        2 => (member(), -60i64..400)
            .prop_map(|((n, rental), valid_days)| Op::Verify { n, rental, valid_days }),
        1 => member().prop_map(|(n, rental)| Op::Ship { n, rental }),
        1 => member().prop_map(|(n, rental)| Op::Rent { n, rental }),
        1 => member().prop_map(|(n, rental)| Op::Return { n, rental }),
        1 => (0i64..120).prop_map(|advance_days| Op::Sweep { advance_days }),
    ]
}

/// Outcome of applying one [`Op`].
#[derive(Debug)]
pub enum Applied {
    Ok,
    Failed(LedgerError),
}

/// Applies `op` through the public API.
pub fn apply(t: &TestLedger, op: &Op, actor: &Actor) -> Applied {
    let result: LedgerResult<()> = match op {
        Op::Create {
            n,
            rental,
            box_type,
            section,
        } => {
            let channel = if *rental {
                IntakeChannel::Rental
            } else {
                IntakeChannel::Warehouse
            };
            let mut new = NewTerminal::new(pool_serial(*n, *rental).as_str(), *box_type).via(channel);
            if let Some(section) = section {
                new = new.in_section(SECTIONS[*section]);
            }
            t.ledger.create_terminal(new, actor).map(drop)
        }
        Op::Place { n, rental, section } => t
            .ledger
            .place_terminal(&pool_serial(*n, *rental), &SectionId::new(SECTIONS[*section]), actor)
            .map(drop),
        Op::Move { n, rental, section } => t
            .ledger
            .move_terminal(&pool_serial(*n, *rental), &SectionId::new(SECTIONS[*section]), actor)
            .map(drop),
        Op::Batch { members } => {
            let ids: Vec<SerialNumber> = members
                .iter()
                .map(|(n, rental)| pool_serial(*n, *rental))
                .collect();
            t.ledger.begin_verification_batch(&ids, None, actor).map(drop)
        }
        Op::Verify {
            n,
            rental,
            valid_days,
        } => {
            let verified_on = date(2024, 1, 1);
            let outcome = if *valid_days < 0 {
                VerificationOutcome::Pending
            } else {
                VerificationOutcome::Verified {
                    verified_on,
                    valid_until: verified_on + Duration::days(*valid_days),
                }
            };
            t.ledger
                .set_verification_outcome(&pool_serial(*n, *rental), outcome, actor)
                .map(drop)
        }
        Op::Ship { n, rental } => t
            .ledger
            .ship_terminal(&pool_serial(*n, *rental), "ООО \"Север\"", actor)
            .map(drop),
        Op::Rent { n, rental } => t
            .ledger
            .rent_terminal(&pool_serial(*n, *rental), "ИП Петров", actor)
            .map(drop),
        Op::Return { n, rental } => t
            .ledger
            .return_terminal(&pool_serial(*n, *rental), actor)
            .map(drop),
        Op::Sweep { advance_days } => {
            t.clock.advance(Duration::days(*advance_days));
            t.ledger.run_expiry_sweep().map(drop)
        }
    };
    match result {
        Ok(()) => Applied::Ok,
        Err(e) => Applied::Failed(e),
    }
}
