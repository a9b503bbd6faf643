use crate::types::{Principal, TxId, WalletId};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PrincipalError {
    #[error("Malformed identifier {0}: {1}")]
    Malformed(String, String),
    #[error("Failed to encode identifier: {0}")]
    Encoding(String),
}

/// Raised only while constructing a wallet. The wallet is never created.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: a wallet needs at least one owner")]
    NoOwners,
    #[error("Invalid configuration: {0} is listed more than once")]
    DuplicateOwner(Principal),
    #[error("Invalid configuration: zero identity {0} cannot be an owner")]
    ZeroOwner(Principal),
    #[error("Invalid configuration: {required} required confirmations with {owners} owners")]
    InvalidThreshold { required: usize, owners: usize },
    #[error("Failed to encode genesis record: {0}")]
    Encoding(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Destination {0} rejected the transfer")]
    Rejected(Principal),
    #[error("Pooled balance {available} cannot cover {requested}")]
    InsufficientFunds { available: u64, requested: u64 },
    #[error("Destination balance would overflow")]
    Overflow,
    #[error("Transfer backend unavailable: {0}")]
    Unavailable(String),
}

/// Errors from a single wallet operation. A failed call never mutates the
/// wallet and never emits an audit record.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("{0} is not an owner of this wallet")]
    NotOwner(Principal),
    #[error("Transaction {0} does not exist")]
    NotFound(TxId),
    #[error("Transaction {id} is already confirmed by {owner}")]
    AlreadyConfirmed { id: TxId, owner: Principal },
    #[error("Transaction {0} has already been executed")]
    AlreadyExecuted(TxId),
    #[error("Transaction {id} is not confirmed by {owner}")]
    NotConfirmed { id: TxId, owner: Principal },
    #[error("Transaction {id} has {actual} of {required} required confirmations")]
    InsufficientApprovals {
        id: TxId,
        required: usize,
        actual: usize,
    },
    #[error("Execution of transaction {id} failed: {reason}")]
    ExecutionFailed {
        id: TxId,
        #[source]
        reason: TransferError,
    },
    #[error("Zero identity {0} cannot receive funds")]
    InvalidDestination(Principal),
    #[error("Transaction ids are exhausted")]
    IdsExhausted,
    #[error("Pooled balance would overflow")]
    BalanceOverflow,
    #[error("Failed to encode audit record: {0}")]
    Encoding(String),
}

/// Errors raised while rebuilding a wallet from its audit records.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    #[error("Audit log does not start with a creation record")]
    MissingGenesis,
    #[error("Creation record found again at sequence {0}")]
    UnexpectedGenesis(u64),
    #[error("Expected sequence {expected}, found {found}")]
    SequenceGap { expected: u64, found: u64 },
    #[error("Record {0} does not link to its predecessor")]
    BrokenChain(u64),
    #[error("Submitted record {seq} carries id {found}, expected {expected}")]
    UnexpectedTxId { seq: u64, expected: TxId, found: TxId },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Record {seq} cannot be applied: {source}")]
    Rejected {
        seq: u64,
        #[source]
        source: WalletError,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum JournalError {
    #[error(transparent)]
    Sled(#[from] sled::Error),
    #[error("Failed to encode record: {0}")]
    Encode(String),
    #[error(transparent)]
    Decode(#[from] minicbor::decode::Error),
    #[error("Journal tree name is not a wallet id: {0}")]
    InvalidTree(String),
    #[error("Journal key is not a sequence number: {0}")]
    InvalidKey(String),
    #[error("Wallet {wallet} journal expects record {expected}, got {found}")]
    Gap {
        wallet: WalletId,
        expected: u64,
        found: u64,
    },
    #[error("Wallet {wallet} cannot be rebuilt: {source}")]
    Replay {
        wallet: WalletId,
        #[source]
        source: ReplayError,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum SettingError {
    #[error("Unrecognised value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Errors surfaced by the multi-wallet service.
#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("Wallet {0} does not exist")]
    WalletNotFound(WalletId),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error(transparent)]
    Principal(#[from] PrincipalError),
    #[error(transparent)]
    Journal(#[from] JournalError),
    #[error("Lock for {0} was poisoned by a panicking writer")]
    Poisoned(String),
}
