//! Smoke Screen Unit tests for custody engine components
//!
//! These tests span the public API of the crate, exercising each component
//! in isolation from the service-level scenarios. They are intended as a
//! smoke screen and mostly test the happy path.
//!

use multisig_custody::{
    AuditLog, ConfigError, Event, ExecutionAuthorization, Ledger, OwnerSet, Principal, TxId,
    Wallet, WalletError, utils::new_uuid_to_bech32,
};

fn owner(n: u8) -> Principal {
    Principal::from_bytes("owner", &[n; 16]).unwrap()
}

fn dest(n: u8) -> Principal {
    Principal::from_bytes("dest", &[n; 16]).unwrap()
}

// UTILS MODULE TESTS
#[cfg(test)]
mod utils_tests {
    use super::*;

    /// Generated identifiers carry the requested human-readable prefix
    #[test]
    fn generates_valid_bech32_with_hrp() {
        let encoded = new_uuid_to_bech32("wallet").unwrap();
        assert!(encoded.starts_with("wallet1"));
        assert!(encoded.len() > 10);
    }

    /// Principals generated from the same prefix never collide
    #[test]
    fn generates_unique_principals() {
        let a = Principal::generate("owner").unwrap();
        let b = Principal::generate("owner").unwrap();
        assert_ne!(a, b);
        assert!(!a.is_zero());
    }

    /// Principals survive a round trip through their string form
    #[test]
    fn principal_parses_its_display_form() {
        let original = Principal::generate("owner").unwrap();
        let parsed: Principal = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }
}

// OWNER SET TESTS
#[cfg(test)]
mod owner_set_tests {
    use super::*;

    #[test]
    fn single_owner_single_confirmation() {
        let set = OwnerSet::new(vec![owner(1)], 1).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.required(), 1);
    }

    #[test]
    fn wallet_construction_reports_config_errors() {
        let result = Wallet::new(vec![], 1, ExecutionAuthorization::OwnersOnly);
        assert_eq!(result.unwrap_err(), ConfigError::NoOwners);
    }
}

// WALLET LIFECYCLE TESTS
#[cfg(test)]
mod wallet_tests {
    use super::*;

    fn two_of_three() -> Wallet {
        Wallet::new(
            vec![owner(1), owner(2), owner(3)],
            2,
            ExecutionAuthorization::OwnersOnly,
        )
        .unwrap()
    }

    /// A full lifecycle emits one record per successful call, in order
    #[test]
    fn lifecycle_emits_records_in_order() {
        let mut wallet = two_of_three();
        let ledger = Ledger::new();

        wallet.deposit(&dest(5), 100).unwrap();
        let id = wallet.submit(&owner(1), dest(9), 40, vec![0xab]).unwrap();
        wallet.confirm(&owner(1), id).unwrap();
        wallet.confirm(&owner(2), id).unwrap();
        wallet.execute(&owner(3), id, &ledger).unwrap();

        let events: Vec<&Event> = wallet.events().iter().map(|r| &r.event).collect();
        assert!(matches!(events[0], Event::Created { .. }));
        assert_eq!(
            events[1..],
            [
                &Event::Deposited {
                    sender: dest(5),
                    value: 100
                },
                &Event::Submitted {
                    tx_id: id,
                    destination: dest(9),
                    value: 40,
                    payload: vec![0xab]
                },
                &Event::Confirmed {
                    owner: owner(1),
                    tx_id: id
                },
                &Event::Confirmed {
                    owner: owner(2),
                    tx_id: id
                },
                &Event::Executed { tx_id: id },
            ]
        );
    }

    /// Ids are dense and start from zero
    #[test]
    fn first_transaction_gets_id_zero() {
        let mut wallet = two_of_three();
        assert_eq!(wallet.submit(&owner(2), dest(1), 1, vec![]).unwrap(), TxId(0));
        assert_eq!(wallet.submit(&owner(2), dest(1), 1, vec![]).unwrap(), TxId(1));
    }

    /// Pending and executed listings split the log
    #[test]
    fn pending_and_executed_listings() {
        let mut wallet = two_of_three();
        let ledger = Ledger::new();
        wallet.deposit(&owner(1), 10).unwrap();

        let a = wallet.submit(&owner(1), dest(1), 5, vec![]).unwrap();
        let b = wallet.submit(&owner(1), dest(2), 5, vec![]).unwrap();
        wallet.confirm(&owner(1), b).unwrap();
        wallet.confirm(&owner(3), b).unwrap();
        wallet.execute(&owner(1), b, &ledger).unwrap();

        assert_eq!(wallet.transactions().pending_ids(), vec![a]);
        assert_eq!(wallet.transactions().executed_ids(), vec![b]);
    }

    /// Errors carry the ids and counts needed by the caller
    #[test]
    fn errors_describe_the_conflict() {
        let mut wallet = two_of_three();
        let ledger = Ledger::new();
        let id = wallet.submit(&owner(1), dest(1), 0, vec![]).unwrap();

        let err = wallet.execute(&owner(1), id, &ledger).unwrap_err();
        assert_eq!(
            err,
            WalletError::InsufficientApprovals {
                id,
                required: 2,
                actual: 0
            }
        );
        assert_eq!(
            err.to_string(),
            "Transaction 0 has 0 of 2 required confirmations"
        );
    }
}

// AUDIT LOG TESTS
#[cfg(test)]
mod audit_tests {
    use super::*;

    #[test]
    fn empty_log_has_no_head() {
        let log = AuditLog::new();
        assert!(log.is_empty());
        assert!(log.head().is_none());
    }

    #[test]
    fn history_describes_every_record() {
        let mut wallet = Wallet::new(vec![owner(1)], 1, ExecutionAuthorization::Anyone).unwrap();
        wallet.deposit(&owner(1), 3).unwrap();
        wallet.submit(&owner(1), dest(1), 1, vec![1, 2]).unwrap();

        let history = wallet.audit().history();
        assert_eq!(history.len(), 3);
        assert!(history[0].contains("Created(1 of 1, Anyone)"));
        assert!(history[2].contains("0x0102"));
    }
}
