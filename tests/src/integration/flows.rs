//! # Workflow Tests
//!
//! Longer operator workflows exercised through [`TerminalLedgerApi`] only.
//!
//! [`TerminalLedgerApi`]: terminal_ledger::TerminalLedgerApi

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use terminal_ledger::prelude::*;
    use terminal_ledger::{check_all_invariants, EventKind, ShelfTier};

    use crate::fixtures::*;

    // =========================================================================
    // INTAKE TO SHIPMENT
    // =========================================================================

    #[test]
    fn test_intake_verify_move_ship() {
        let t = TestLedger::at(noon(2024, 9, 2));
        let actor = operator();
        let ids: Vec<SerialNumber> = (0..3).map(|n| serial(&warehouse_serial(n))).collect();

        for id in &ids {
            t.ledger
                .create_terminal(
                    NewTerminal::new(id.as_str(), BoxType::A).in_section("12121"),
                    &actor,
                )
                .unwrap();
        }
        let request = t.ledger.begin_verification_batch(&ids, None, &actor).unwrap();
        assert_eq!(request.id, "Заявка №0001");
        assert_eq!(t.ledger.status().count(TerminalStatus::Pending), 3);

        t.clock.advance(Duration::days(3));
        t.ledger
            .process_verification_request(&request.id, &actor)
            .unwrap();
        t.ledger
            .set_verification_outcome(&ids[0], verified(date(2024, 9, 4), date(2025, 9, 4)), &actor)
            .unwrap();
        t.ledger
            .set_verification_outcome(&ids[1], VerificationOutcome::NotVerified, &actor)
            .unwrap();

        let moved = t.ledger.move_terminal(&ids[0], &section("12123"), &actor).unwrap();
        assert_eq!(moved.section, section("12123"));
        assert_eq!(moved.cell(), 1);

        let shipment = t.ledger.ship_terminal(&ids[0], "ООО \"Север\"", &actor).unwrap();
        assert_eq!(shipment.id, 1);
        assert_eq!(shipment.status_before_shipment, TerminalStatus::Verified);

        let status = t.ledger.status();
        assert_eq!(status.total_terminals, 3);
        assert_eq!(status.count(TerminalStatus::Shipped), 1);
        assert_eq!(status.count(TerminalStatus::NotVerified), 1);
        assert_eq!(status.count(TerminalStatus::Pending), 1);
        assert_eq!(status.placed, 2);
        assert_eq!(status.shipments, 1);
        assert_eq!(status.pending_requests, 0);

        let shipped = t.ledger.get_terminal(&ids[0]).unwrap();
        let kinds: Vec<&EventKind> = shipped.history.iter().map(|e| &e.kind).collect();
        assert!(matches!(kinds[0], EventKind::AddedToWarehouse));
        assert!(matches!(kinds[1], EventKind::Placed { .. }));
        assert!(matches!(kinds[2], EventKind::AddedToVerificationRequest { .. }));
        assert!(matches!(kinds[3], EventKind::Verified { .. }));
        assert!(matches!(kinds[4], EventKind::Moved { .. }));
        assert!(matches!(kinds[5], EventKind::Shipped { .. }));
        assert!(check_all_invariants(&t.ledger.snapshot()).is_empty());
    }

    #[test]
    fn test_shipment_date_correction() {
        let t = TestLedger::at(noon(2024, 9, 2));
        let actor = operator();
        let id = serial("170240001");
        t.ledger
            .create_terminal(NewTerminal::new("170240001", BoxType::A), &actor)
            .unwrap();
        t.ledger.ship_terminal(&id, "ООО \"Север\"", &actor).unwrap();

        let corrected = t
            .ledger
            .update_shipment_date(&id, noon(2024, 8, 30), &actor)
            .unwrap();
        assert_eq!(corrected.shipping_date, noon(2024, 8, 30));
        assert_eq!(t.ledger.list_shipments()[0].shipping_date, noon(2024, 8, 30));

        let terminal = t.ledger.get_terminal(&id).unwrap();
        let event = terminal
            .history
            .iter()
            .find(|e| matches!(e.kind, EventKind::Shipped { .. }))
            .unwrap();
        assert_eq!(event.timestamp, noon(2024, 8, 30));

        let never_shipped = serial("170240002");
        t.ledger
            .create_terminal(NewTerminal::new("170240002", BoxType::A), &actor)
            .unwrap();
        let err = t
            .ledger
            .update_shipment_date(&never_shipped, noon(2024, 8, 30), &actor)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    // =========================================================================
    // SHELF RULES
    // =========================================================================

    #[test]
    fn test_section_box_type_follows_occupants() {
        let t = TestLedger::at(noon(2024, 9, 2));
        let actor = operator();
        let shelf = section("12112");

        t.ledger
            .create_terminal(
                NewTerminal::new(warehouse_serial(1), BoxType::B).in_section("12112"),
                &actor,
            )
            .unwrap();
        t.ledger
            .create_terminal(NewTerminal::new(warehouse_serial(2), BoxType::A), &actor)
            .unwrap();

        let err = t
            .ledger
            .place_terminal(&serial(&warehouse_serial(2)), &shelf, &actor)
            .unwrap_err();
        assert!(matches!(err, LedgerError::BoxTypeMismatch { .. }));

        t.ledger
            .move_terminal(&serial(&warehouse_serial(1)), &section("12113"), &actor)
            .unwrap();
        let placement = t
            .ledger
            .place_terminal(&serial(&warehouse_serial(2)), &shelf, &actor)
            .unwrap();
        assert_eq!(placement.position, 0);

        let view = t
            .ledger
            .list_sections()
            .into_iter()
            .find(|v| v.id == shelf)
            .unwrap();
        assert_eq!(view.current_box_type, Some(BoxType::A));
        assert_eq!(view.total_cells(BoxType::A), 18);
    }

    #[test]
    fn test_available_sections_by_channel() {
        let t = TestLedger::at(noon(2024, 9, 2));
        let actor = operator();

        let rental: Vec<ShelfTier> = t
            .ledger
            .available_sections(IntakeChannel::Rental, BoxType::B)
            .into_iter()
            .map(|v| v.tier)
            .collect();
        assert_eq!(rental.len(), 3);
        assert!(rental.iter().all(|tier| *tier == ShelfTier::Rental));

        for n in 0..5 {
            t.ledger
                .create_terminal(
                    NewTerminal::new(rental_serial(n), BoxType::B)
                        .in_section("12131")
                        .via(IntakeChannel::Rental),
                    &actor,
                )
                .unwrap();
        }
        let remaining = t.ledger.available_sections(IntakeChannel::Rental, BoxType::B);
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().all(|v| v.id != section("12131")));

        let warehouse = t.ledger.available_sections(IntakeChannel::Warehouse, BoxType::A);
        assert_eq!(warehouse.len(), 6);
    }

    #[test]
    fn test_channel_mismatches_are_rejected() {
        let t = TestLedger::at(noon(2024, 9, 2));
        let actor = operator();

        let err = t
            .ledger
            .create_terminal(
                NewTerminal::new(rental_serial(1), BoxType::A).via(IntakeChannel::Warehouse),
                &actor,
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::SerialChannelMismatch { .. }));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = t
            .ledger
            .create_terminal(
                NewTerminal::new(warehouse_serial(1), BoxType::A)
                    .in_section("12133")
                    .via(IntakeChannel::Warehouse),
                &actor,
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::SectionChannelMismatch { .. }));

        let err = t
            .ledger
            .create_terminal(
                NewTerminal::new(warehouse_serial(2), BoxType::A).via(IntakeChannel::Rental),
                &actor,
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::SerialChannelMismatch { .. }));
        assert!(t.ledger.list_terminals().is_empty());
    }

    // =========================================================================
    // CONTRAGENTS
    // =========================================================================

    #[test]
    fn test_contragent_registry_merges_sources() {
        let t = TestLedger::at(noon(2024, 9, 2));
        let actor = operator();

        assert!(t.ledger.add_contragent("ООО \"Север\"", &actor).unwrap());
        assert!(!t.ledger.add_contragent("ооо \"север\"", &actor).unwrap());
        assert!(!t.ledger.add_contragent("   ", &actor).unwrap());

        t.ledger
            .create_terminal(NewTerminal::new("170240001", BoxType::A), &actor)
            .unwrap();
        let shipment = t
            .ledger
            .ship_terminal(&serial("170240001"), " ооо \"север\" ", &actor)
            .unwrap();
        assert_eq!(shipment.contragent, "ООО \"Север\"");

        t.ledger
            .create_terminal(
                NewTerminal::new(rental_serial(1), BoxType::A).via(IntakeChannel::Rental),
                &actor,
            )
            .unwrap();
        t.ledger
            .rent_terminal(&serial(&rental_serial(1)), "ИП Петров", &actor)
            .unwrap();

        let names = t.ledger.list_contragents();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"ИП Петров".to_string()));

        // Shipments still reference the name after the manual entry goes.
        assert!(t.ledger.remove_contragent("ООО \"Север\"", &actor).unwrap());
        assert!(t
            .ledger
            .list_contragents()
            .contains(&"ООО \"Север\"".to_string()));
    }

    #[test]
    fn test_ship_requires_contragent() {
        let t = TestLedger::at(noon(2024, 9, 2));
        let actor = operator();
        t.ledger
            .create_terminal(NewTerminal::new("170240001", BoxType::A), &actor)
            .unwrap();

        let err = t.ledger.ship_terminal(&serial("170240001"), "  ", &actor).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(t.ledger.list_shipments().is_empty());
        assert_eq!(
            t.ledger.get_terminal(&serial("170240001")).unwrap().status,
            TerminalStatus::NotVerified
        );
    }

    // =========================================================================
    // ATOMICITY
    // =========================================================================

    #[test]
    fn test_failed_batch_changes_nothing() {
        let t = TestLedger::at(noon(2024, 9, 2));
        let actor = operator();
        t.ledger
            .create_terminal(NewTerminal::new("170240001", BoxType::A), &actor)
            .unwrap();
        let before = t.ledger.snapshot();

        let err = t
            .ledger
            .begin_verification_batch(&[serial("170240001"), serial("missing")], None, &actor)
            .unwrap_err();
        assert_eq!(err, LedgerError::TerminalNotFound(serial("missing")));
        assert_eq!(t.ledger.snapshot(), before);

        let err = t.ledger.begin_verification_batch(&[], None, &actor).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(t.ledger.snapshot(), before);
    }

    #[test]
    fn test_duplicate_request_id_is_rejected() {
        let t = TestLedger::at(noon(2024, 9, 2));
        let actor = operator();
        t.ledger
            .create_terminal(NewTerminal::new("170240001", BoxType::A), &actor)
            .unwrap();
        t.ledger
            .begin_verification_batch(&[serial("170240001")], Some("Заявка №0002"), &actor)
            .unwrap();

        let err = t
            .ledger
            .begin_verification_batch(&[serial("170240001")], Some("Заявка №0002"), &actor)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        // The generated id skips the taken one.
        let generated = t
            .ledger
            .begin_verification_batch(&[serial("170240001")], None, &actor)
            .unwrap();
        assert_eq!(generated.id, "Заявка №0003");
    }
}
