//! Per-transaction confirmation tracking
use crate::audit::Event;
use crate::error::WalletError;
use crate::types::{Principal, TxId};
use crate::wallet::Wallet;
use std::collections::BTreeSet;

/// Owners that currently confirm one transaction. The confirmation count is
/// always the size of this set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Confirmations(BTreeSet<Principal>);

impl Confirmations {
    pub fn count(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, owner: &Principal) -> bool {
        self.0.contains(owner)
    }

    // false when already present
    pub(crate) fn insert(&mut self, owner: Principal) -> bool {
        self.0.insert(owner)
    }

    // false when absent
    pub(crate) fn remove(&mut self, owner: &Principal) -> bool {
        self.0.remove(owner)
    }
}

impl Wallet {
    /// Records `caller`'s approval of transaction `id`.
    ///
    /// Checks run in a fixed order: the transaction must exist, the caller
    /// must be an owner, the transaction must still be pending, and the
    /// caller must not have confirmed it already.
    pub fn confirm(&mut self, caller: &Principal, id: TxId) -> Result<(), WalletError> {
        if let Err(e) = self.check_confirm(caller, id) {
            tracing::warn!(%caller, %id, error = %e, "confirm rejected");
            return Err(e);
        }

        self.record(Event::Confirmed {
            owner: caller.clone(),
            tx_id: id,
        })?;
        tracing::debug!(
            %caller,
            %id,
            count = self.confirmation_count(id).unwrap_or_default(),
            "transaction confirmed"
        );
        Ok(())
    }

    /// Withdraws a previous confirmation. Available at any time before the
    /// transaction executes.
    pub fn revoke(&mut self, caller: &Principal, id: TxId) -> Result<(), WalletError> {
        if let Err(e) = self.check_revoke(caller, id) {
            tracing::warn!(%caller, %id, error = %e, "revoke rejected");
            return Err(e);
        }

        self.record(Event::Revoked {
            owner: caller.clone(),
            tx_id: id,
        })?;
        tracing::debug!(%caller, %id, "confirmation revoked");
        Ok(())
    }

    pub fn is_confirmed(&self, id: TxId, owner: &Principal) -> Result<bool, WalletError> {
        self.transaction(id)
            .map(|tx| tx.confirmations.contains(owner))
    }

    /// Confirming owners in owner-set order.
    pub fn confirmations(&self, id: TxId) -> Result<Vec<Principal>, WalletError> {
        let tx = self.transaction(id)?;
        Ok(self
            .owners()
            .iter()
            .filter(|o| tx.confirmations.contains(o))
            .cloned()
            .collect())
    }

    pub(crate) fn check_confirm(&self, caller: &Principal, id: TxId) -> Result<(), WalletError> {
        let tx = self.transaction(id)?;
        self.ensure_owner(caller)?;
        if tx.is_executed() {
            return Err(WalletError::AlreadyExecuted(id));
        }
        if tx.confirmations.contains(caller) {
            return Err(WalletError::AlreadyConfirmed {
                id,
                owner: caller.clone(),
            });
        }
        Ok(())
    }

    pub(crate) fn check_revoke(&self, caller: &Principal, id: TxId) -> Result<(), WalletError> {
        let tx = self.transaction(id)?;
        self.ensure_owner(caller)?;
        if tx.is_executed() {
            return Err(WalletError::AlreadyExecuted(id));
        }
        if !tx.confirmations.contains(caller) {
            return Err(WalletError::NotConfirmed {
                id,
                owner: caller.clone(),
            });
        }
        Ok(())
    }
}
