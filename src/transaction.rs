//! Proposed transfers and the append-only log that holds them
use crate::approvals::Confirmations;
use crate::error::WalletError;
use crate::types::{Principal, TxId};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    id: TxId,
    destination: Principal,
    value: u64,
    payload: Vec<u8>,
    executed: bool,
    pub(crate) confirmations: Confirmations,
}

/// Read-only snapshot handed out to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionView {
    pub id: TxId,
    pub destination: Principal,
    pub value: u64,
    pub payload: Vec<u8>,
    pub executed: bool,
    pub confirmation_count: usize,
}

impl Transaction {
    fn new(id: TxId, destination: Principal, value: u64, payload: Vec<u8>) -> Self {
        Self {
            id,
            destination,
            value,
            payload,
            executed: false,
            confirmations: Confirmations::default(),
        }
    }

    pub fn id(&self) -> TxId {
        self.id
    }
    pub fn destination(&self) -> &Principal {
        &self.destination
    }
    pub fn value(&self) -> u64 {
        self.value
    }
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
    pub fn is_executed(&self) -> bool {
        self.executed
    }
    pub fn confirmation_count(&self) -> usize {
        self.confirmations.count()
    }

    // flipped exactly once, by a successful execution
    pub(crate) fn mark_executed(&mut self) {
        self.executed = true;
    }

    pub fn view(&self) -> TransactionView {
        TransactionView {
            id: self.id,
            destination: self.destination.clone(),
            value: self.value,
            payload: self.payload.clone(),
            executed: self.executed,
            confirmation_count: self.confirmation_count(),
        }
    }
}

/// Transactions indexed by id. Entries are never removed and ids are never
/// reused, so iteration order is submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionLog {
    entries: BTreeMap<TxId, Transaction>,
    next_id: TxId,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next `append` will allocate.
    pub fn next_id(&self) -> TxId {
        self.next_id
    }

    pub(crate) fn append(
        &mut self,
        destination: Principal,
        value: u64,
        payload: Vec<u8>,
    ) -> Result<TxId, WalletError> {
        let id = self.next_id;
        let next = id.next().ok_or(WalletError::IdsExhausted)?;
        self.entries
            .insert(id, Transaction::new(id, destination, value, payload));
        self.next_id = next;
        Ok(id)
    }

    pub fn get(&self, id: TxId) -> Option<&Transaction> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TxId) -> Option<&mut Transaction> {
        self.entries.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.entries.values()
    }

    pub fn pending_ids(&self) -> Vec<TxId> {
        self.iter()
            .filter(|tx| !tx.is_executed())
            .map(Transaction::id)
            .collect()
    }

    pub fn executed_ids(&self) -> Vec<TxId> {
        self.iter()
            .filter(|tx| tx.is_executed())
            .map(Transaction::id)
            .collect()
    }
}
