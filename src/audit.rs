//! Audit records for every wallet state transition.
//!
//! Each successful mutation produces exactly one [`AuditRecord`]. Records are
//! numbered from zero and each one carries the sha256 digest of its
//! predecessor, so the log forms a chain that can be verified and replayed
//! to rebuild the wallet.
use crate::engine::ExecutionAuthorization;
use crate::error::{ReplayError, WalletError};
use crate::types::{Principal, TimeStamp, TxId};
use chrono::Utc;
use std::fmt;

#[derive(Debug, PartialEq, Eq, minicbor::Encode, minicbor::Decode, Clone)]
pub enum Event {
    #[n(0)]
    Created {
        #[n(0)]
        owners: Vec<Principal>,
        #[n(1)]
        required: usize,
        #[n(2)]
        authorization: ExecutionAuthorization,
    },
    #[n(1)]
    Deposited {
        #[n(0)]
        sender: Principal,
        #[n(1)]
        value: u64,
    },
    #[n(2)]
    Submitted {
        #[n(0)]
        tx_id: TxId,
        #[n(1)]
        destination: Principal,
        #[n(2)]
        value: u64,
        #[b(3)]
        payload: Vec<u8>,
    },
    #[n(3)]
    Confirmed {
        #[n(0)]
        owner: Principal,
        #[n(1)]
        tx_id: TxId,
    },
    #[n(4)]
    Revoked {
        #[n(0)]
        owner: Principal,
        #[n(1)]
        tx_id: TxId,
    },
    #[n(5)]
    Executed {
        #[n(0)]
        tx_id: TxId,
    },
}

#[derive(Debug, PartialEq, Eq, minicbor::Encode, minicbor::Decode, Clone)]
pub struct AuditRecord {
    #[n(0)]
    pub seq: u64,
    #[n(1)]
    pub timestamp: TimeStamp<Utc>,
    #[n(2)]
    pub prev: Option<String>, // digest of the previous record, None for genesis
    #[n(3)]
    pub event: Event,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditLog {
    records: Vec<AuditRecord>,
    head: Option<String>,
}

impl AuditRecord {
    pub fn new(seq: u64, prev: Option<String>, event: Event) -> Self {
        Self {
            seq,
            timestamp: TimeStamp::new(),
            prev,
            event,
        }
    }

    /// Encodes the record and returns its digest alongside the encoding.
    pub fn build(&self) -> Result<(String, Vec<u8>), WalletError> {
        let cbor = minicbor::to_vec(self).map_err(|e| WalletError::Encoding(e.to_string()))?;
        let hash = sha256::digest(cbor.as_slice());

        Ok((hash, cbor))
    }
}

/// A record that has been encoded but not yet appended.
#[derive(Debug)]
pub struct PreparedRecord {
    record: AuditRecord,
    digest: String,
}

impl PreparedRecord {
    pub fn event(&self) -> &Event {
        &self.record.event
    }
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the next record without touching the log. Appending happens in
    /// [`AuditLog::commit`] once the wallet has applied the event.
    pub fn prepare(&self, event: Event) -> Result<PreparedRecord, WalletError> {
        let record = AuditRecord::new(self.records.len() as u64, self.head.clone(), event);
        let (digest, _) = record.build()?;

        Ok(PreparedRecord { record, digest })
    }

    pub fn commit(&mut self, prepared: PreparedRecord) -> &AuditRecord {
        self.head = Some(prepared.digest);
        self.records.push(prepared.record);
        &self.records[self.records.len() - 1]
    }

    /// Checks that a stored record continues this log, then wraps it for
    /// [`AuditLog::commit`].
    pub fn verify(&self, record: AuditRecord) -> Result<PreparedRecord, ReplayError> {
        let expected = self.records.len() as u64;
        if record.seq != expected {
            return Err(ReplayError::SequenceGap {
                expected,
                found: record.seq,
            });
        }
        if record.prev != self.head {
            return Err(ReplayError::BrokenChain(record.seq));
        }

        let seq = record.seq;
        let (digest, _) = record
            .build()
            .map_err(|source| ReplayError::Rejected { seq, source })?;

        Ok(PreparedRecord { record, digest })
    }

    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&AuditRecord> {
        self.records.last()
    }

    pub fn head(&self) -> Option<&str> {
        self.head.as_deref()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// One line per record, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| format!("#{} {} {}", r.seq, r.timestamp.to_datetime_utc(), r.event))
            .collect()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Created {
                owners,
                required,
                authorization,
            } => write!(
                f,
                "Created({} of {}, {:?})",
                required,
                owners.len(),
                authorization
            ),
            Event::Deposited { sender, value } => write!(f, "Deposited({sender}, {value})"),
            Event::Submitted {
                tx_id,
                destination,
                value,
                payload,
            } => write!(
                f,
                "Submitted({tx_id}, {destination}, {value}, 0x{})",
                hex::encode(payload)
            ),
            Event::Confirmed { owner, tx_id } => write!(f, "Confirmed({owner}, {tx_id})"),
            Event::Revoked { owner, tx_id } => write!(f, "Revoked({owner}, {tx_id})"),
            Event::Executed { tx_id } => write!(f, "Executed({tx_id})"),
        }
    }
}
