//! # Persistence Tests
//!
//! State written through the JSON file repository must come back intact,
//! including history payloads, shipments and request ids.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use terminal_ledger::prelude::*;
    use terminal_ledger::{check_all_invariants, EventKind, RepositoryError};
    use warehouse_runtime::{ExpirySweeper, LedgerContainer, RuntimeConfig};

    use crate::fixtures::*;

    fn file_ledger(path: &std::path::Path, clock: Arc<FixedTimeSource>) -> TerminalLedgerService {
        let repository = Arc::new(JsonFileRepository::open(path).unwrap());
        TerminalLedgerService::new(LedgerConfig::for_testing(), repository)
            .unwrap()
            .with_time_source(Box::new(clock))
    }

    // =========================================================================
    // RESTART
    // =========================================================================

    #[test]
    fn test_full_state_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warehouse.json");
        let clock = Arc::new(FixedTimeSource::new(noon(2024, 4, 1)));
        let actor = operator();

        let before = {
            let ledger = file_ledger(&path, Arc::clone(&clock));
            ledger
                .create_terminal(
                    NewTerminal::new("170240001", BoxType::A).in_section("12121"),
                    &actor,
                )
                .unwrap();
            ledger
                .create_terminal(
                    NewTerminal::new(rental_serial(1), BoxType::B)
                        .in_section("12132")
                        .via(IntakeChannel::Rental),
                    &actor,
                )
                .unwrap();
            ledger
                .begin_verification_batch(&[serial("170240001")], Some("Заявка №0042"), &actor)
                .unwrap();
            ledger
                .set_verification_outcome(
                    &serial("170240001"),
                    verified(date(2024, 4, 1), date(2024, 4, 30)),
                    &actor,
                )
                .unwrap();
            ledger
                .rent_terminal(&serial(&rental_serial(1)), "ИП Петров", &actor)
                .unwrap();
            ledger.add_contragent("ООО \"Север\"", &actor).unwrap();
            ledger.snapshot()
        };

        let stored: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(stored["version"], 1);
        assert_eq!(
            stored["warehouse"]["terminals"]["170240001"]["status"],
            "verified"
        );

        let ledger = file_ledger(&path, Arc::clone(&clock));
        assert_eq!(ledger.snapshot(), before);
        assert!(check_all_invariants(&before).is_empty());
        assert_eq!(ledger.list_verification_requests()[0].id, "Заявка №0042");
        assert_eq!(ledger.list_contragents().len(), 2);

        // The restored ledger keeps sweeping where the old one stopped.
        clock.set(noon(2024, 5, 2));
        let report = ledger.run_expiry_sweep().unwrap();
        assert_eq!(report.expired, vec![serial("170240001")]);
        drop(ledger);

        let ledger = file_ledger(&path, clock);
        let terminal = ledger.get_terminal(&serial("170240001")).unwrap();
        assert_eq!(terminal.status, TerminalStatus::Expired);
        assert_eq!(terminal.history.last().unwrap().kind, EventKind::VerificationExpired);
    }

    #[test]
    fn test_second_open_is_locked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warehouse.json");

        let _held = JsonFileRepository::open(&path).unwrap();
        let err = JsonFileRepository::open(&path).unwrap_err();
        assert!(matches!(err, RepositoryError::Locked { .. }));
        assert_eq!(LedgerError::from(err).kind(), ErrorKind::Storage);
    }

    #[test]
    fn test_corrupt_file_refuses_to_start() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warehouse.json");
        std::fs::write(&path, "{ not json").unwrap();

        let repository = Arc::new(JsonFileRepository::open(&path).unwrap());
        let err = TerminalLedgerService::new(LedgerConfig::for_testing(), repository)
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    // =========================================================================
    // RUNTIME
    // =========================================================================

    #[tokio::test]
    async fn test_sweeper_persists_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RuntimeConfig::default();
        config.ledger = LedgerConfig::for_testing();
        config.storage.data_file = Some(dir.path().join("warehouse.json"));
        let actor = operator();

        {
            let container = LedgerContainer::build(config.clone()).unwrap();
            container
                .ledger
                .create_terminal(NewTerminal::new("170240001", BoxType::A), &actor)
                .unwrap();
            container
                .ledger
                .set_verification_outcome(
                    &serial("170240001"),
                    verified(date(2020, 1, 1), date(2021, 1, 1)),
                    &actor,
                )
                .unwrap();
        }

        let container = LedgerContainer::build(config.clone()).unwrap();
        let sweeper = ExpirySweeper::new(Arc::clone(&container.ledger), Duration::from_millis(10));
        let (tx, rx) = tokio::sync::watch::channel(false);
        let handle = tokio::spawn(sweeper.run(rx));
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();
        drop(container);

        let container = LedgerContainer::build(config).unwrap();
        let terminal = container.ledger.get_terminal(&serial("170240001")).unwrap();
        assert_eq!(terminal.status, TerminalStatus::Expired);
        let expiries = terminal
            .history
            .iter()
            .filter(|e| e.kind == EventKind::VerificationExpired)
            .count();
        assert_eq!(expiries, 1);
    }
}
