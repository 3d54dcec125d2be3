use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use kestrel_core::{
    error::TransportError, CommitResult, Identifier, Key, LookupResponse, MutationBatch, Query, QueryResults, Transport,
};
use kestrel_proto::{EntityWire, MutationResultWire, MutationWire, TransactionId};
use sled::Config;
use tokio::task;
use tracing::{debug, info};

use crate::{
    database::{decode_entity, encode_key, Database},
    error::SledTransportError,
    scan,
};

/// Keys answered per lookup request; the rest come back deferred
pub const MAX_LOOKUP_KEYS: usize = 300;

/// Entities returned per query batch before the batch is cut short with `NotFinished`
pub const MAX_QUERY_BATCH: usize = 500;

/// A [`Transport`] over a local Sled database.
///
/// Each commit is applied as one atomic Sled batch. Transactions are tracked so that commits,
/// rollbacks and reads against an unknown or finished transaction are refused, but reads are
/// not isolated: they see whatever has been committed so far.
#[derive(Clone)]
pub struct SledTransport {
    pub database: Arc<Database>,
    open_transactions: Arc<Mutex<HashSet<TransactionId>>>,
}

impl SledTransport {
    pub fn with_homedir_folder(folder_name: &str) -> anyhow::Result<Self> {
        let dir = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Failed to get home directory"))?.join(folder_name);

        Self::with_path(dir)
    }

    pub fn with_path(path: PathBuf) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&path)?;
        let dbpath = path.join("sled");
        let db = sled::open(&dbpath)?;
        Ok(Self::from_database(Database::open(db)?))
    }

    pub fn new() -> anyhow::Result<Self> { Self::with_homedir_folder(".kestrel") }

    /// A throwaway database that is removed when dropped
    pub fn new_test() -> anyhow::Result<Self> {
        let db = Config::new().temporary(true).flush_every_ms(None).open()?;
        Ok(Self::from_database(Database::open(db)?))
    }

    fn from_database(database: Database) -> Self {
        Self { database: Arc::new(database), open_transactions: Arc::new(Mutex::new(HashSet::new())) }
    }

    /// Number of transactions begun and not yet committed or rolled back
    pub fn open_transaction_count(&self) -> usize { self.transactions().len() }

    fn transactions(&self) -> MutexGuard<'_, HashSet<TransactionId>> { self.open_transactions.lock().unwrap_or_else(PoisonError::into_inner) }

    fn check_transaction(&self, transaction: Option<&TransactionId>) -> Result<(), TransportError> {
        match transaction {
            Some(id) if !self.transactions().contains(id) => Err(TransportError::TransactionNotFound(id.clone())),
            _ => Ok(()),
        }
    }

    fn next_id(&self) -> Result<i64, SledTransportError> {
        // sled starts counting at zero; stored ids start at one
        Ok(self.database.db.generate_id()? as i64 + 1)
    }

    /// Apply `mutation` and close `transaction`. Runs to completion even if the caller stops
    /// waiting for it.
    fn commit_blocking(&self, transaction: Option<TransactionId>, mutation: MutationWire) -> Result<MutationResultWire, SledTransportError> {
        let mut batch = sled::Batch::default();
        let mut result = MutationResultWire::default();

        for mut entity in mutation.insert_auto_id {
            let mut key = entity.key.take().ok_or(SledTransportError::MissingKey)?;
            if let Some(leaf) = key.path.last_mut() {
                leaf.id = Some(self.next_id()?);
            }
            batch.insert(encode_key(&key)?, bincode::serialize(&EntityWire { key: Some(key.clone()), ..entity })?);
            result.insert_auto_id_keys.push(key);
            result.index_updates += 1;
        }
        for entity in mutation.upsert {
            let key = entity.key.as_ref().ok_or(SledTransportError::MissingKey)?;
            batch.insert(encode_key(key)?, bincode::serialize(&entity)?);
            result.index_updates += 1;
        }
        for key in mutation.delete {
            batch.remove(encode_key(&key)?);
            result.index_updates += 1;
        }

        self.database.entities_tree.apply_batch(batch)?;
        if let Some(id) = transaction {
            self.transactions().remove(&id);
        }
        Ok(result)
    }

    fn lookup_blocking(&self, mut keys: Vec<Key>) -> Result<LookupResponse, SledTransportError> {
        let deferred = keys.split_off(keys.len().min(MAX_LOOKUP_KEYS));
        let mut response = LookupResponse { deferred, ..Default::default() };
        for key in keys {
            match self.database.entities_tree.get(encode_key(&key.to_wire())?)? {
                Some(bytes) => response.found.push(decode_entity(&bytes)?),
                None => response.missing.push(key),
            }
        }
        Ok(response)
    }

    fn allocate_blocking(&self, template: Key, count: usize) -> Result<Vec<Key>, SledTransportError> {
        (0..count).map(|_| self.next_id().map(|id| template.complete_with(Identifier::Id(id)))).collect()
    }
}

fn join_error(err: task::JoinError) -> TransportError { SledTransportError::Join(err).into() }

#[async_trait]
impl Transport for SledTransport {
    async fn begin_transaction(&self) -> Result<TransactionId, TransportError> {
        let id = TransactionId::new();
        self.transactions().insert(id.clone());
        debug!("SledTransport.begin_transaction {}", id);
        Ok(id)
    }

    async fn commit(&self, transaction: Option<&TransactionId>, batch: &MutationBatch) -> Result<CommitResult, TransportError> {
        self.check_transaction(transaction)?;
        let mutation = batch.to_wire();
        debug!("SledTransport.commit {} {}", transaction.map(ToString::to_string).unwrap_or_default(), mutation);

        let me = self.clone();
        let transaction = transaction.cloned();
        let result = task::spawn_blocking(move || me.commit_blocking(transaction, mutation)).await.map_err(join_error)??;
        info!("SledTransport committed {} changes", result.index_updates);
        Ok(CommitResult::from_wire(&result)?)
    }

    async fn rollback(&self, transaction: &TransactionId) -> Result<(), TransportError> {
        if !self.transactions().remove(transaction) {
            return Err(TransportError::TransactionNotFound(transaction.clone()));
        }
        debug!("SledTransport.rollback {}", transaction);
        Ok(())
    }

    async fn lookup(&self, keys: &[Key], transaction: Option<&TransactionId>) -> Result<LookupResponse, TransportError> {
        self.check_transaction(transaction)?;
        let me = self.clone();
        let keys = keys.to_vec();
        Ok(task::spawn_blocking(move || me.lookup_blocking(keys)).await.map_err(join_error)??)
    }

    async fn allocate_ids(&self, template: &Key, count: usize) -> Result<Vec<Key>, TransportError> {
        let me = self.clone();
        let template = template.clone();
        Ok(task::spawn_blocking(move || me.allocate_blocking(template, count)).await.map_err(join_error)??)
    }

    async fn run_query(&self, query: &Query, transaction: Option<&TransactionId>) -> Result<QueryResults, TransportError> {
        self.check_transaction(transaction)?;
        let me = self.clone();
        let query = query.clone();
        Ok(task::spawn_blocking(move || scan::run_query(&me.database, &query, MAX_QUERY_BATCH)).await.map_err(join_error)??)
    }
}
