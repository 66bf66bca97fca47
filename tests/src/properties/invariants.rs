//! Invariant properties over random operation sequences.

use proptest::prelude::*;
use terminal_ledger::prelude::*;
use terminal_ledger::{check_all_invariants, check_history_order, HistoryEvent, Warehouse};

use super::operations::{apply, op, Applied, Op};
use crate::fixtures::{noon, operator, TestLedger};

fn histories(warehouse: &Warehouse) -> Vec<(SerialNumber, Vec<HistoryEvent>)> {
    warehouse
        .terminals()
        .map(|t| (t.serial.clone(), t.history.as_slice().to_vec()))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    // =========================================================================
    // STRUCTURAL INVARIANTS
    // =========================================================================

    /// Capacity, homogeneity, unique cells and request ids hold after any
    /// sequence, including sequences full of rejected operations.
    #[test]
    fn prop_invariants_hold(ops in proptest::collection::vec(op(), 1..60)) {
        let t = TestLedger::at(noon(2024, 1, 1));
        let actor = operator();

        for op in &ops {
            let _ = apply(&t, op, &actor);
            let warehouse = t.ledger.snapshot();
            let violations = check_all_invariants(&warehouse);
            prop_assert!(violations.is_empty(), "after {:?}: {:?}", op, violations);
            prop_assert!(check_history_order(&warehouse).is_empty());
        }
    }

    /// A failed operation leaves no trace.
    #[test]
    fn prop_failures_are_atomic(ops in proptest::collection::vec(op(), 1..60)) {
        let t = TestLedger::at(noon(2024, 1, 1));
        let actor = operator();

        for op in &ops {
            let before = t.ledger.snapshot();
            if let Applied::Failed(_) = apply(&t, op, &actor) {
                prop_assert_eq!(t.ledger.snapshot(), before);
            }
        }
    }

    /// Serial numbers stay unique: a second create of a live serial fails.
    #[test]
    fn prop_serials_unique(ops in proptest::collection::vec(op(), 1..60)) {
        let t = TestLedger::at(noon(2024, 1, 1));
        let actor = operator();

        for op in &ops {
            let existed = op
                .target()
                .map(|serial| t.ledger.get_terminal(&serial).is_ok())
                .unwrap_or(false);
            let outcome = apply(&t, op, &actor);
            if let (Op::Create { .. }, true) = (op, existed) {
                prop_assert!(matches!(
                    outcome,
                    Applied::Failed(LedgerError::DuplicateSerial(_))
                ));
            }
        }
    }

    // =========================================================================
    // HISTORY
    // =========================================================================

    /// Histories only grow, and existing entries are never rewritten, except
    /// on the return path which compacts before appending.
    #[test]
    fn prop_history_append_only(ops in proptest::collection::vec(op(), 1..60)) {
        let t = TestLedger::at(noon(2024, 1, 1));
        let actor = operator();

        for op in &ops {
            let before = histories(&t.ledger.snapshot());
            let outcome = apply(&t, op, &actor);
            let after = t.ledger.snapshot();

            for (serial, old) in &before {
                let new = after.terminal(serial).map(|t| t.history.as_slice()).unwrap_or(&[]);
                let compacted = op.is_return()
                    && matches!(outcome, Applied::Ok)
                    && op.target().as_ref() == Some(serial);
                if compacted {
                    prop_assert!(new.len() <= old.len() + 1);
                    continue;
                }
                prop_assert!(new.len() >= old.len());
                prop_assert_eq!(&new[..old.len()], old.as_slice());
            }
        }
    }

    // =========================================================================
    // EXPIRY
    // =========================================================================

    /// A second sweep on the same day changes nothing.
    #[test]
    fn prop_sweep_idempotent(ops in proptest::collection::vec(op(), 1..60)) {
        let t = TestLedger::at(noon(2024, 1, 1));
        let actor = operator();
        for op in &ops {
            let _ = apply(&t, op, &actor);
        }

        t.ledger.run_expiry_sweep().unwrap();
        let settled = t.ledger.snapshot();
        let again = t.ledger.run_expiry_sweep().unwrap();

        let today = t.ledger.today();
        prop_assert!(again.expired.is_empty());
        prop_assert!(settled.overdue(today).is_empty());
        prop_assert_eq!(t.ledger.snapshot(), settled);
    }
}
