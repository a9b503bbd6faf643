//! The wallet aggregate.
//!
//! All owner, transaction and balance state lives here. Every mutation
//! follows the same path: validate, prepare an audit record, apply the
//! event to state, then commit the record. Replaying the committed records
//! through the same `apply` rebuilds an identical wallet.
use crate::audit::{AuditLog, AuditRecord, Event};
use crate::engine::ExecutionAuthorization;
use crate::error::{ConfigError, ReplayError, TransferError, WalletError};
use crate::owners::OwnerSet;
use crate::transaction::{Transaction, TransactionLog, TransactionView};
use crate::types::{Principal, TxId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wallet {
    pub(crate) owners: OwnerSet,
    pub(crate) log: TransactionLog,
    pub(crate) balance: u64,
    pub(crate) authorization: ExecutionAuthorization,
    pub(crate) audit: AuditLog,
}

impl Wallet {
    /// Validates the owner set and emits the genesis record.
    pub fn new(
        owners: Vec<Principal>,
        required: usize,
        authorization: ExecutionAuthorization,
    ) -> Result<Self, ConfigError> {
        let owner_set = OwnerSet::new(owners, required)?;
        let mut wallet = Self::empty(owner_set, authorization);

        let genesis = wallet
            .audit
            .prepare(Event::Created {
                owners: wallet.owners.owners().to_vec(),
                required,
                authorization,
            })
            .map_err(|e| ConfigError::Encoding(e.to_string()))?;
        wallet.audit.commit(genesis);

        Ok(wallet)
    }

    fn empty(owners: OwnerSet, authorization: ExecutionAuthorization) -> Self {
        Self {
            owners,
            log: TransactionLog::new(),
            balance: 0,
            authorization,
            audit: AuditLog::new(),
        }
    }

    /// Rebuilds a wallet from its audit records, verifying the digest chain.
    pub fn replay<I>(records: I) -> Result<Self, ReplayError>
    where
        I: IntoIterator<Item = AuditRecord>,
    {
        let mut records = records.into_iter();
        let genesis = records.next().ok_or(ReplayError::MissingGenesis)?;

        let Event::Created {
            owners,
            required,
            authorization,
        } = &genesis.event
        else {
            return Err(ReplayError::MissingGenesis);
        };
        let owner_set = OwnerSet::new(owners.clone(), *required)?;
        let mut wallet = Self::empty(owner_set, *authorization);

        let prepared = wallet.audit.verify(genesis)?;
        wallet.audit.commit(prepared);

        for record in records {
            let seq = record.seq;
            let prepared = wallet.audit.verify(record)?;
            match prepared.event() {
                Event::Created { .. } => return Err(ReplayError::UnexpectedGenesis(seq)),
                Event::Submitted { tx_id, .. } if *tx_id != wallet.log.next_id() => {
                    return Err(ReplayError::UnexpectedTxId {
                        seq,
                        expected: wallet.log.next_id(),
                        found: *tx_id,
                    });
                }
                _ => {}
            }

            wallet
                .apply(prepared.event())
                .map_err(|source| ReplayError::Rejected { seq, source })?;
            wallet.audit.commit(prepared);
        }

        Ok(wallet)
    }

    /// Proposes a transfer. Only owners may submit.
    pub fn submit(
        &mut self,
        caller: &Principal,
        destination: Principal,
        value: u64,
        payload: Vec<u8>,
    ) -> Result<TxId, WalletError> {
        if let Err(e) = self.ensure_owner(caller) {
            tracing::warn!(%caller, "submit rejected: not an owner");
            return Err(e);
        }
        if destination.is_zero() {
            tracing::warn!(%caller, %destination, "submit rejected: zero destination");
            return Err(WalletError::InvalidDestination(destination));
        }

        let id = self.log.next_id();
        self.record(Event::Submitted {
            tx_id: id,
            destination,
            value,
            payload,
        })?;
        tracing::info!(%caller, %id, value, "transaction submitted");
        Ok(id)
    }

    /// Adds funds to the pool. Anyone may deposit.
    pub fn deposit(&mut self, caller: &Principal, value: u64) -> Result<(), WalletError> {
        if self.balance.checked_add(value).is_none() {
            tracing::warn!(%caller, value, "deposit rejected: balance overflow");
            return Err(WalletError::BalanceOverflow);
        }

        self.record(Event::Deposited {
            sender: caller.clone(),
            value,
        })?;
        tracing::debug!(%caller, value, balance = self.balance, "deposit received");
        Ok(())
    }

    pub fn get_transaction(&self, id: TxId) -> Result<TransactionView, WalletError> {
        self.transaction(id).map(Transaction::view)
    }

    pub fn transaction(&self, id: TxId) -> Result<&Transaction, WalletError> {
        self.log.get(id).ok_or(WalletError::NotFound(id))
    }

    pub fn confirmation_count(&self, id: TxId) -> Result<usize, WalletError> {
        self.transaction(id).map(Transaction::confirmation_count)
    }

    pub fn transaction_count(&self) -> usize {
        self.log.len()
    }

    pub fn is_owner(&self, principal: &Principal) -> bool {
        self.owners.is_owner(principal)
    }

    pub fn owners(&self) -> &[Principal] {
        self.owners.owners()
    }

    pub fn required(&self) -> usize {
        self.owners.required()
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn authorization(&self) -> ExecutionAuthorization {
        self.authorization
    }

    pub fn transactions(&self) -> &TransactionLog {
        &self.log
    }

    pub fn events(&self) -> &[AuditRecord] {
        self.audit.records()
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub(crate) fn ensure_owner(&self, caller: &Principal) -> Result<(), WalletError> {
        if self.owners.is_owner(caller) {
            Ok(())
        } else {
            Err(WalletError::NotOwner(caller.clone()))
        }
    }

    /// Prepare, apply and commit one event. Nothing changes if any step fails.
    pub(crate) fn record(&mut self, event: Event) -> Result<&AuditRecord, WalletError> {
        let prepared = self.audit.prepare(event)?;
        self.apply(prepared.event())?;
        Ok(self.audit.commit(prepared))
    }

    /// Applies one event to state. Each arm validates before mutating, so an
    /// error leaves the wallet untouched.
    pub(crate) fn apply(&mut self, event: &Event) -> Result<(), WalletError> {
        match event {
            // genesis is consumed at construction
            Event::Created { .. } => Ok(()),
            Event::Deposited { value, .. } => {
                self.balance = self
                    .balance
                    .checked_add(*value)
                    .ok_or(WalletError::BalanceOverflow)?;
                Ok(())
            }
            Event::Submitted {
                destination,
                value,
                payload,
                ..
            } => {
                if destination.is_zero() {
                    return Err(WalletError::InvalidDestination(destination.clone()));
                }
                self.log
                    .append(destination.clone(), *value, payload.clone())?;
                Ok(())
            }
            Event::Confirmed { owner, tx_id } => {
                self.check_confirm(owner, *tx_id)?;
                if let Some(tx) = self.log.get_mut(*tx_id) {
                    tx.confirmations.insert(owner.clone());
                }
                Ok(())
            }
            Event::Revoked { owner, tx_id } => {
                self.check_revoke(owner, *tx_id)?;
                if let Some(tx) = self.log.get_mut(*tx_id) {
                    tx.confirmations.remove(owner);
                }
                Ok(())
            }
            Event::Executed { tx_id } => {
                let value = self.check_executable(*tx_id)?;
                let remaining = self.balance.checked_sub(value).ok_or_else(|| {
                    WalletError::ExecutionFailed {
                        id: *tx_id,
                        reason: TransferError::InsufficientFunds {
                            available: self.balance,
                            requested: value,
                        },
                    }
                })?;
                if let Some(tx) = self.log.get_mut(*tx_id) {
                    tx.mark_executed();
                }
                self.balance = remaining;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(n: u8) -> Principal {
        Principal::from_bytes("owner", &[n; 16]).unwrap()
    }

    fn dest() -> Principal {
        Principal::from_bytes("dest", &[9; 16]).unwrap()
    }

    fn wallet() -> Wallet {
        Wallet::new(
            vec![owner(1), owner(2), owner(3)],
            2,
            ExecutionAuthorization::OwnersOnly,
        )
        .unwrap()
    }

    #[test]
    fn new_wallet_starts_with_genesis_record() {
        let wallet = wallet();

        assert_eq!(wallet.events().len(), 1);
        assert!(matches!(wallet.events()[0].event, Event::Created { required: 2, .. }));
        assert_eq!(wallet.balance(), 0);
        assert!(wallet.transactions().is_empty());
    }

    #[test]
    fn submit_requires_owner() {
        let mut wallet = wallet();
        let stranger = owner(8);

        assert_eq!(
            wallet.submit(&stranger, dest(), 10, vec![]),
            Err(WalletError::NotOwner(stranger))
        );
        assert!(wallet.transactions().is_empty());
        assert_eq!(wallet.events().len(), 1);
    }

    #[test]
    fn submit_rejects_zero_destination() {
        let mut wallet = wallet();
        let zero = Principal::zero("dest").unwrap();

        assert_eq!(
            wallet.submit(&owner(1), zero.clone(), 10, vec![]),
            Err(WalletError::InvalidDestination(zero))
        );
    }

    #[test]
    fn submit_allocates_increasing_ids() {
        let mut wallet = wallet();

        let a = wallet.submit(&owner(1), dest(), 10, vec![]).unwrap();
        let b = wallet.submit(&owner(2), dest(), 20, vec![1]).unwrap();

        assert!(b > a);
        assert_eq!(wallet.transaction_count(), 2);
        assert_eq!(wallet.get_transaction(b).unwrap().payload, vec![1]);
        assert!(matches!(
            wallet.events().last().unwrap().event,
            Event::Submitted { tx_id, .. } if tx_id == b
        ));
    }

    #[test]
    fn deposit_is_open_to_anyone() {
        let mut wallet = wallet();
        let stranger = owner(8);

        wallet.deposit(&stranger, 500).unwrap();
        wallet.deposit(&owner(1), 250).unwrap();

        assert_eq!(wallet.balance(), 750);
        assert_eq!(
            wallet.events()[1].event,
            Event::Deposited {
                sender: stranger,
                value: 500
            }
        );
    }

    #[test]
    fn deposit_overflow_is_rejected_without_change() {
        let mut wallet = wallet();
        wallet.deposit(&owner(1), u64::MAX).unwrap();

        assert_eq!(wallet.deposit(&owner(1), 1), Err(WalletError::BalanceOverflow));
        assert_eq!(wallet.balance(), u64::MAX);
        assert_eq!(wallet.events().len(), 2);
    }

    #[test]
    fn get_transaction_reports_unknown_id() {
        let wallet = wallet();
        assert_eq!(
            wallet.get_transaction(TxId(999)),
            Err(WalletError::NotFound(TxId(999)))
        );
    }

    #[test]
    fn replay_rebuilds_identical_wallet() {
        let mut wallet = wallet();
        wallet.deposit(&owner(5), 1_000).unwrap();
        let id = wallet.submit(&owner(1), dest(), 400, vec![7, 7]).unwrap();
        wallet.confirm(&owner(1), id).unwrap();
        wallet.confirm(&owner(2), id).unwrap();
        wallet.revoke(&owner(1), id).unwrap();

        let rebuilt = Wallet::replay(wallet.events().to_vec()).unwrap();
        assert_eq!(rebuilt, wallet);
    }

    #[test]
    fn replay_requires_genesis_first() {
        let mut wallet = wallet();
        wallet.deposit(&owner(1), 10).unwrap();

        let records = wallet.events()[1..].to_vec();
        assert_eq!(Wallet::replay(records), Err(ReplayError::MissingGenesis));
        assert_eq!(Wallet::replay(Vec::new()), Err(ReplayError::MissingGenesis));
    }

    #[test]
    fn replay_rejects_events_that_do_not_apply() {
        let wallet = wallet();
        let mut records = wallet.events().to_vec();
        let prev = wallet.audit().head().map(String::from);
        records.push(AuditRecord::new(
            1,
            prev,
            Event::Confirmed {
                owner: owner(1),
                tx_id: TxId(0),
            },
        ));

        assert_eq!(
            Wallet::replay(records),
            Err(ReplayError::Rejected {
                seq: 1,
                source: WalletError::NotFound(TxId(0))
            })
        );
    }
}
