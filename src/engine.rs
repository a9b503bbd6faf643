//! Quorum-gated execution of approved transactions.
//!
//! Execution is commit-or-rollback: every check runs and the audit record is
//! prepared before the external transfer is attempted, and the wallet is
//! only mutated after the transfer reports success. A failed transfer leaves
//! the transaction pending with its confirmations intact, so the same id can
//! be executed again once the cause is fixed.
use crate::audit::Event;
use crate::error::{SettingError, TransferError, WalletError};
use crate::types::{Principal, TxId};
use crate::wallet::Wallet;
use std::str::FromStr;

/// Who may call `execute` once quorum is reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum ExecutionAuthorization {
    #[default]
    #[n(0)]
    OwnersOnly,
    #[n(1)]
    Anyone,
}

/// One outgoing transfer handed to the [`Transfer`] collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest<'a> {
    pub tx_id: TxId,
    pub destination: &'a Principal,
    pub value: u64,
    pub payload: &'a [u8],
}

/// The external side of an execution: moves `value` to the destination.
///
/// Implementations must either complete the transfer and return `Ok`, or
/// leave no effect and return an error.
pub trait Transfer {
    fn transfer(&self, request: &TransferRequest<'_>) -> Result<(), TransferError>;
}

impl Wallet {
    /// Executes transaction `id` if it has enough confirmations.
    ///
    /// Checks: the transaction exists, the caller is permitted by the
    /// wallet's [`ExecutionAuthorization`], it has not been executed, and
    /// its confirmation count meets the threshold. A pooled balance below
    /// the value fails the transfer step with `ExecutionFailed`.
    pub fn execute<T>(&mut self, caller: &Principal, id: TxId, transfer: &T) -> Result<(), WalletError>
    where
        T: Transfer + ?Sized,
    {
        if let Err(e) = self.check_execute(caller, id) {
            tracing::warn!(%caller, %id, error = %e, "execute rejected");
            return Err(e);
        }

        let prepared = self.audit.prepare(Event::Executed { tx_id: id })?;

        let tx = self.transaction(id)?;
        let outcome = if tx.value() > self.balance {
            Err(TransferError::InsufficientFunds {
                available: self.balance,
                requested: tx.value(),
            })
        } else {
            transfer.transfer(&TransferRequest {
                tx_id: id,
                destination: tx.destination(),
                value: tx.value(),
                payload: tx.payload(),
            })
        };

        if let Err(reason) = outcome {
            tracing::warn!(%caller, %id, %reason, "transfer failed, transaction stays pending");
            return Err(WalletError::ExecutionFailed { id, reason });
        }

        self.apply(prepared.event())?;
        self.audit.commit(prepared);
        tracing::info!(%caller, %id, balance = self.balance, "transaction executed");
        Ok(())
    }

    /// Whether `execute(id)` would pass its checks right now.
    pub fn is_executable(&self, id: TxId) -> bool {
        self.check_executable(id).is_ok()
    }

    fn check_execute(&self, caller: &Principal, id: TxId) -> Result<(), WalletError> {
        self.transaction(id)?;
        if self.authorization == ExecutionAuthorization::OwnersOnly {
            self.ensure_owner(caller)?;
        }
        self.check_executable(id).map(|_| ())
    }

    /// Returns the value to transfer when `id` exists, is pending and has
    /// quorum.
    pub(crate) fn check_executable(&self, id: TxId) -> Result<u64, WalletError> {
        let tx = self.transaction(id)?;
        if tx.is_executed() {
            return Err(WalletError::AlreadyExecuted(id));
        }
        let actual = tx.confirmation_count();
        let required = self.owners.required();
        if actual < required {
            return Err(WalletError::InsufficientApprovals {
                id,
                required,
                actual,
            });
        }
        Ok(tx.value())
    }
}

impl FromStr for ExecutionAuthorization {
    type Err = SettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owners" | "owners-only" | "owners_only" => Ok(Self::OwnersOnly),
            "anyone" | "any" => Ok(Self::Anyone),
            _ => Err(SettingError::InvalidValue {
                key: "execution authorization",
                value: s.to_string(),
            }),
        }
    }
}
