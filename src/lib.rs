//! Multi-signature custody of pooled funds.
//!
//! A [`Wallet`] holds a fixed set of owners and a confirmation threshold.
//! Owners submit transfers, confirm or revoke them, and once enough owners
//! have confirmed, a permitted caller executes the transfer through a
//! [`Transfer`] backend. Every successful mutation appends one
//! [`AuditRecord`] and the records alone are enough to rebuild the wallet.
//!
//! [`CustodyService`] hosts many wallets, serialises access per wallet and
//! optionally journals audit records to sled.

pub mod approvals;
pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod journal;
pub mod ledger;
pub mod owners;
pub mod service;
pub mod transaction;
pub mod types;
pub mod utils;
pub mod wallet;

pub use audit::{AuditLog, AuditRecord, Event};
pub use config::Config;
pub use engine::{ExecutionAuthorization, Transfer, TransferRequest};
pub use error::{
    ConfigError, JournalError, PrincipalError, ReplayError, ServiceError, SettingError,
    TransferError, WalletError,
};
pub use journal::Journal;
pub use ledger::Ledger;
pub use owners::OwnerSet;
pub use service::CustodyService;
pub use transaction::{Transaction, TransactionLog, TransactionView};
pub use types::{Principal, TxId, WalletId};
pub use wallet::Wallet;
