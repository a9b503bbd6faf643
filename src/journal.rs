//! Durable audit journal backed by sled.
//!
//! One tree per wallet, named by the wallet id. Keys are big-endian record
//! sequence numbers so a tree iterates in append order; values are the
//! CBOR-encoded [`AuditRecord`]s. Wallets are rebuilt by replaying their
//! tree.
use crate::audit::AuditRecord;
use crate::error::JournalError;
use crate::types::WalletId;
use crate::wallet::Wallet;
use sled::{Batch, Db, Tree};
use std::path::Path;
use std::sync::Arc;

const DEFAULT_TREE: &[u8] = b"__sled__default";

#[derive(Clone)]
pub struct Journal {
    instance: Arc<Db>,
}

impl Journal {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let db = sled::open(path)?;
        Ok(Self::new(Arc::new(db)))
    }

    pub fn new(instance: Arc<Db>) -> Self {
        Self { instance }
    }

    /// Writes every record the tree does not hold yet, in a single batch.
    ///
    /// `records` is the wallet's full history (or any slice of it that
    /// reaches past the persisted tail). Records below the persisted high
    /// water mark are skipped, so a write that failed earlier is backfilled
    /// by the next call. Returns the number of records written.
    pub fn sync(&self, wallet: &WalletId, records: &[AuditRecord]) -> Result<usize, JournalError> {
        let tree = self.tree(wallet)?;
        let persisted = next_seq(&tree)?;

        let pending: Vec<&AuditRecord> = records.iter().filter(|r| r.seq >= persisted).collect();
        match pending.first() {
            None => return Ok(0),
            Some(first) if first.seq != persisted => {
                return Err(JournalError::Gap {
                    wallet: wallet.clone(),
                    expected: persisted,
                    found: first.seq,
                });
            }
            Some(_) => {}
        }

        let mut batch = Batch::default();
        for record in &pending {
            let cbor = minicbor::to_vec(*record).map_err(|e| JournalError::Encode(e.to_string()))?;
            batch.insert(record.seq.to_be_bytes().to_vec(), cbor);
        }
        tree.apply_batch(batch)?;
        tree.flush()?;

        Ok(pending.len())
    }

    /// Sequence number the next stored record must carry.
    pub fn persisted(&self, wallet: &WalletId) -> Result<u64, JournalError> {
        next_seq(&self.tree(wallet)?)
    }

    pub(crate) fn tree(&self, wallet: &WalletId) -> Result<Tree, JournalError> {
        Ok(self.instance.open_tree(wallet.as_str())?)
    }

    pub fn load(&self, wallet: &WalletId) -> Result<Vec<AuditRecord>, JournalError> {
        let tree = self.tree(wallet)?;

        let mut records = Vec::with_capacity(tree.len());
        for entry in tree.iter() {
            let (_, value) = entry?;
            let record: AuditRecord = minicbor::decode(value.as_ref())?;
            records.push(record);
        }
        Ok(records)
    }

    pub fn wallet_ids(&self) -> Result<Vec<WalletId>, JournalError> {
        let mut ids = Vec::new();
        for name in self.instance.tree_names() {
            if name.as_ref() == DEFAULT_TREE {
                continue;
            }
            let name = String::from_utf8_lossy(name.as_ref()).into_owned();
            let id = WalletId::parse(&name).map_err(|_| JournalError::InvalidTree(name))?;
            ids.push(id);
        }
        Ok(ids)
    }

    /// Replays every wallet stored in the journal.
    pub fn restore(&self) -> Result<Vec<(WalletId, Wallet)>, JournalError> {
        let mut wallets = Vec::new();
        for id in self.wallet_ids()? {
            let records = self.load(&id)?;
            if records.is_empty() {
                // a creation whose first write never landed
                tracing::debug!(wallet = %id, "skipping empty journal tree");
                continue;
            }
            let wallet = Wallet::replay(records).map_err(|source| JournalError::Replay {
                wallet: id.clone(),
                source,
            })?;
            tracing::debug!(wallet = %id, records = wallet.events().len(), "wallet restored");
            wallets.push((id, wallet));
        }
        Ok(wallets)
    }
}

fn next_seq(tree: &Tree) -> Result<u64, JournalError> {
    let Some((key, _)) = tree.last()? else {
        return Ok(0);
    };
    let bytes: [u8; 8] = key
        .as_ref()
        .try_into()
        .map_err(|_| JournalError::InvalidKey(hex::encode(key.as_ref())))?;
    u64::from_be_bytes(bytes)
        .checked_add(1)
        .ok_or_else(|| JournalError::InvalidKey(hex::encode(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ExecutionAuthorization;
    use crate::types::Principal;
    use tempfile::tempdir;

    fn owner(n: u8) -> Principal {
        Principal::from_bytes("owner", &[n; 16]).unwrap()
    }

    #[test]
    fn sync_then_load_preserves_order() -> anyhow::Result<()> {
        // Each test gets its own database since sled locks the directory.
        let temp_dir = tempdir()?;
        let journal = Journal::open(temp_dir.path().join("append_then_load.db"))?;

        let mut wallet = Wallet::new(vec![owner(1), owner(2)], 1, ExecutionAuthorization::OwnersOnly)?;
        for value in [10, 20, 30] {
            wallet.deposit(&owner(3), value)?;
        }
        let id = WalletId::generate()?;
        assert_eq!(journal.sync(&id, wallet.events())?, 4);

        assert_eq!(journal.load(&id)?, wallet.events());
        assert_eq!(journal.persisted(&id)?, 4);
        assert_eq!(journal.wallet_ids()?, vec![id]);
        Ok(())
    }

    #[test]
    fn restore_rebuilds_wallets() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let journal = Journal::open(temp_dir.path().join("restore.db"))?;

        let mut wallet = Wallet::new(vec![owner(1)], 1, ExecutionAuthorization::Anyone)?;
        wallet.deposit(&owner(2), 99)?;
        let id = WalletId::generate()?;
        journal.sync(&id, &wallet.events()[..1])?;
        journal.sync(&id, &wallet.events()[1..])?;

        let restored = journal.restore()?;
        assert_eq!(restored, vec![(id, wallet)]);
        Ok(())
    }

    #[test]
    fn missed_write_is_backfilled_by_next_sync() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let journal = Journal::open(temp_dir.path().join("backfill.db"))?;

        let mut wallet = Wallet::new(vec![owner(1)], 1, ExecutionAuthorization::OwnersOnly)?;
        let id = WalletId::generate()?;
        journal.sync(&id, wallet.events())?;

        // the write for this deposit is lost
        wallet.deposit(&owner(2), 5)?;
        wallet.deposit(&owner(2), 7)?;
        assert_eq!(journal.persisted(&id)?, 1);

        assert_eq!(journal.sync(&id, wallet.events())?, 2);
        assert_eq!(journal.sync(&id, wallet.events())?, 0);
        assert_eq!(journal.restore()?, vec![(id, wallet)]);
        Ok(())
    }

    #[test]
    fn sync_refuses_to_leave_a_hole() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let journal = Journal::open(temp_dir.path().join("hole.db"))?;

        let mut wallet = Wallet::new(vec![owner(1)], 1, ExecutionAuthorization::OwnersOnly)?;
        wallet.deposit(&owner(2), 5)?;
        wallet.deposit(&owner(2), 7)?;
        let id = WalletId::generate()?;
        journal.sync(&id, &wallet.events()[..1])?;

        assert!(matches!(
            journal.sync(&id, &wallet.events()[2..]),
            Err(JournalError::Gap { expected: 1, found: 2, .. })
        ));
        assert_eq!(journal.load(&id)?.len(), 1);
        Ok(())
    }

    #[test]
    fn empty_trees_are_not_wallets() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let journal = Journal::open(temp_dir.path().join("empty.db"))?;
        let id = WalletId::generate()?;
        journal.tree(&id)?;

        assert_eq!(journal.wallet_ids()?, vec![id]);
        assert!(journal.restore()?.is_empty());
        Ok(())
    }

    #[test]
    fn foreign_tree_names_are_reported() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let db = Arc::new(sled::open(temp_dir.path().join("foreign.db"))?);
        db.open_tree("not-a-wallet")?;

        let journal = Journal::new(db);
        assert!(matches!(
            journal.wallet_ids(),
            Err(JournalError::InvalidTree(name)) if name == "not-a-wallet"
        ));
        Ok(())
    }
}
