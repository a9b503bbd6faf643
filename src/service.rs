//! Service layer API for multisig wallet operations
use crate::audit::AuditRecord;
use crate::config::Config;
use crate::engine::{ExecutionAuthorization, Transfer};
use crate::error::{ServiceError, WalletError};
use crate::journal::Journal;
use crate::transaction::TransactionView;
use crate::types::{Principal, TxId, WalletId};
use crate::wallet::Wallet;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

type SharedTransfer = Arc<dyn Transfer + Send + Sync>;

/// Hosts any number of wallets. Each wallet sits behind its own mutex, so
/// every operation on one wallet is serialised while different wallets
/// proceed independently.
pub struct CustodyService {
    config: Config,
    transfer: SharedTransfer,
    wallets: RwLock<HashMap<WalletId, Arc<Mutex<Wallet>>>>,
    journal: Option<Journal>,
}

impl CustodyService {
    /// Opens the journal named in `config`, if any, and restores its wallets.
    pub fn new(config: Config, transfer: SharedTransfer) -> Result<Self, ServiceError> {
        match config.journal_path.clone() {
            Some(path) => {
                let journal = Journal::open(path)?;
                Self::with_journal(config, transfer, journal)
            }
            None => Ok(Self::in_memory(config, transfer)),
        }
    }

    pub fn in_memory(config: Config, transfer: SharedTransfer) -> Self {
        Self {
            config,
            transfer,
            wallets: RwLock::new(HashMap::new()),
            journal: None,
        }
    }

    pub fn with_journal(
        config: Config,
        transfer: SharedTransfer,
        journal: Journal,
    ) -> Result<Self, ServiceError> {
        let restored = journal.restore()?;
        tracing::info!(wallets = restored.len(), "journal restored");

        let wallets = restored
            .into_iter()
            .map(|(id, wallet)| (id, Arc::new(Mutex::new(wallet))))
            .collect();

        Ok(Self {
            config,
            transfer,
            wallets: RwLock::new(wallets),
            journal: Some(journal),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn journal(&self) -> Option<&Journal> {
        self.journal.as_ref()
    }

    /// Mints a principal with the configured prefix.
    pub fn new_principal(&self) -> Result<Principal, ServiceError> {
        Ok(Principal::generate(&self.config.principal_prefix)?)
    }

    /// Creates a wallet using the configured execution authorization.
    pub fn create_wallet(
        &self,
        owners: Vec<Principal>,
        required: usize,
    ) -> Result<WalletId, ServiceError> {
        self.create_wallet_with(owners, required, self.config.execution_authorization)
    }

    pub fn create_wallet_with(
        &self,
        owners: Vec<Principal>,
        required: usize,
        authorization: ExecutionAuthorization,
    ) -> Result<WalletId, ServiceError> {
        let wallet = match Wallet::new(owners, required, authorization) {
            Ok(wallet) => wallet,
            Err(e) => {
                tracing::warn!(error = %e, "wallet creation rejected");
                return Err(e.into());
            }
        };
        let id = WalletId::generate()?;

        // nothing is registered yet, so a failed first write creates no wallet
        if let Some(journal) = &self.journal {
            journal.sync(&id, wallet.events())?;
        }

        let mut wallets = self
            .wallets
            .write()
            .map_err(|_| ServiceError::Poisoned("wallet registry".into()))?;
        wallets.insert(id.clone(), Arc::new(Mutex::new(wallet)));
        tracing::info!(wallet = %id, required, ?authorization, "wallet created");

        Ok(id)
    }

    pub fn submit(
        &self,
        wallet: &WalletId,
        caller: &Principal,
        destination: Principal,
        value: u64,
        payload: Vec<u8>,
    ) -> Result<TxId, ServiceError> {
        self.mutate(wallet, |w| w.submit(caller, destination, value, payload))
    }

    pub fn confirm(&self, wallet: &WalletId, caller: &Principal, id: TxId) -> Result<(), ServiceError> {
        self.mutate(wallet, |w| w.confirm(caller, id))
    }

    pub fn revoke(&self, wallet: &WalletId, caller: &Principal, id: TxId) -> Result<(), ServiceError> {
        self.mutate(wallet, |w| w.revoke(caller, id))
    }

    pub fn execute(&self, wallet: &WalletId, caller: &Principal, id: TxId) -> Result<(), ServiceError> {
        self.mutate(wallet, |w| w.execute(caller, id, self.transfer.as_ref()))
    }

    pub fn deposit(&self, wallet: &WalletId, caller: &Principal, value: u64) -> Result<(), ServiceError> {
        self.mutate(wallet, |w| w.deposit(caller, value))
    }

    pub fn get_transaction(&self, wallet: &WalletId, id: TxId) -> Result<TransactionView, ServiceError> {
        self.read(wallet, |w| w.get_transaction(id))?
            .map_err(ServiceError::from)
    }

    pub fn get_owners(&self, wallet: &WalletId) -> Result<Vec<Principal>, ServiceError> {
        self.read(wallet, |w| w.owners().to_vec())
    }

    pub fn balance(&self, wallet: &WalletId) -> Result<u64, ServiceError> {
        self.read(wallet, Wallet::balance)
    }

    pub fn pending_transactions(&self, wallet: &WalletId) -> Result<Vec<TxId>, ServiceError> {
        self.read(wallet, |w| w.transactions().pending_ids())
    }

    pub fn events(&self, wallet: &WalletId) -> Result<Vec<AuditRecord>, ServiceError> {
        self.read(wallet, |w| w.events().to_vec())
    }

    pub fn wallet_ids(&self) -> Result<Vec<WalletId>, ServiceError> {
        let wallets = self
            .wallets
            .read()
            .map_err(|_| ServiceError::Poisoned("wallet registry".into()))?;
        Ok(wallets.keys().cloned().collect())
    }

    /// Writes any records of `wallet` the journal is missing. Returns how
    /// many were written; always zero without a journal.
    pub fn sync_journal(&self, wallet: &WalletId) -> Result<usize, ServiceError> {
        let Some(journal) = &self.journal else {
            return Ok(0);
        };
        let handle = self.handle(wallet)?;
        let guard = handle
            .lock()
            .map_err(|_| ServiceError::Poisoned(wallet.to_string()))?;

        let written = journal.sync(wallet, guard.events())?;
        if written > 0 {
            tracing::info!(%wallet, written, "journal caught up");
        }
        Ok(written)
    }

    fn handle(&self, id: &WalletId) -> Result<Arc<Mutex<Wallet>>, ServiceError> {
        let wallets = self
            .wallets
            .read()
            .map_err(|_| ServiceError::Poisoned("wallet registry".into()))?;
        wallets
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::WalletNotFound(id.clone()))
    }

    fn read<R>(&self, id: &WalletId, f: impl FnOnce(&Wallet) -> R) -> Result<R, ServiceError> {
        let handle = self.handle(id)?;
        let wallet = handle
            .lock()
            .map_err(|_| ServiceError::Poisoned(id.to_string()))?;
        Ok(f(&*wallet))
    }

    /// Runs one mutation under the wallet lock and journals its records
    /// before the lock is released.
    ///
    /// Once the wallet has committed, the call has taken effect (for
    /// `execute` the transfer has already happened), so a journal failure is
    /// logged rather than returned. The next sync of the wallet writes the
    /// missing records.
    fn mutate<R>(
        &self,
        id: &WalletId,
        f: impl FnOnce(&mut Wallet) -> Result<R, WalletError>,
    ) -> Result<R, ServiceError> {
        let handle = self.handle(id)?;
        let mut wallet = handle
            .lock()
            .map_err(|_| ServiceError::Poisoned(id.to_string()))?;

        let out = f(&mut *wallet)?;

        if let Some(journal) = &self.journal {
            if let Err(e) = journal.sync(id, wallet.events()) {
                tracing::error!(wallet = %id, error = %e, "journal is behind committed records");
            }
        }

        Ok(out)
    }
}
