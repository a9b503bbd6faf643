//! In-memory transfer backend
use crate::engine::{Transfer, TransferRequest};
use crate::error::TransferError;
use crate::types::Principal;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Credits executed transfers to per-principal balances.
///
/// Destinations marked with [`Ledger::reject`] refuse incoming transfers,
/// which is how a reverting receiver is simulated.
#[derive(Debug, Default)]
pub struct Ledger {
    state: Mutex<LedgerState>,
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<Principal, u64>,
    rejecting: HashSet<Principal>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, principal: &Principal) -> u64 {
        self.lock().balances.get(principal).copied().unwrap_or(0)
    }

    pub fn reject(&self, destination: &Principal) {
        self.lock().rejecting.insert(destination.clone());
    }

    pub fn accept(&self, destination: &Principal) {
        self.lock().rejecting.remove(destination);
    }

    // balances stay consistent even if a holder panicked
    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transfer for Ledger {
    fn transfer(&self, request: &TransferRequest<'_>) -> Result<(), TransferError> {
        let mut state = self.lock();
        if state.rejecting.contains(request.destination) {
            return Err(TransferError::Rejected(request.destination.clone()));
        }

        let balance = state.balances.entry(request.destination.clone()).or_insert(0);
        *balance = balance
            .checked_add(request.value)
            .ok_or(TransferError::Overflow)?;
        Ok(())
    }
}
