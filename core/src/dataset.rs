use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::{
    autoid::AutoIdTracker,
    batch::MutationBatch,
    config::DatasetConfig,
    entity::Entity,
    error::{MutationError, RetrievalError, TransactionError, UsageError},
    key::{Identifier, Key},
    lookup::{lookup_all, LookupResults},
    query::{Query, QueryResults},
    transaction::{Transaction, TransactionState},
    transport::Transport,
};

/// Client for one dataset: saves, deletes, lookups, queries, id allocation and transactions
/// over a [`Transport`].
#[derive(Clone)]
pub struct Dataset {
    transport: Arc<dyn Transport>,
    config: Arc<DatasetConfig>,
}

impl Dataset {
    /// A dataset configured from the environment (see [`DatasetConfig::from_env`])
    pub fn new(transport: Arc<dyn Transport>) -> Self { Self::with_config(transport, DatasetConfig::from_env()) }

    pub fn with_config(transport: Arc<dyn Transport>, config: DatasetConfig) -> Self { Self { transport, config: Arc::new(config) } }

    pub fn config(&self) -> &DatasetConfig { &self.config }

    pub fn dataset_id(&self) -> &str { &self.config.dataset_id }

    /// A complete key in the configured namespace
    pub fn key(&self, kind: impl Into<String>, identifier: impl Into<Identifier>) -> Key {
        Key::new(kind, Some(identifier.into())).with_namespace(self.config.namespace.clone())
    }

    /// An incomplete key in the configured namespace
    pub fn incomplete_key(&self, kind: impl Into<String>) -> Key { Key::incomplete(kind).with_namespace(self.config.namespace.clone()) }

    /// A new entity of `kind` that will get a generated id when saved
    pub fn entity(&self, kind: impl Into<String>) -> Entity { Entity::new(self.incomplete_key(kind)) }

    /// A query over `kind` in the configured namespace
    pub fn query(&self, kind: impl Into<String>) -> Query { Query::new(kind).namespace(self.config.namespace.clone()) }

    /// Write `entities` in a single commit.
    ///
    /// Entities whose keys are incomplete are inserted with generated ids, and those ids are
    /// written back onto the very entities passed in. The returned handles are those same
    /// entities.
    #[instrument(skip_all, fields(dataset = %self.config.dataset_id, count = entities.len()))]
    pub async fn save(&self, entities: &[Entity]) -> Result<Vec<Entity>, MutationError> {
        let mut batch = MutationBatch::new();
        let mut tracker = AutoIdTracker::new();
        batch.save(entities.iter().cloned(), &mut tracker);
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Dataset.save {}", batch);
        let result = self.transport.commit(None, &batch).await?;
        tracker.reconcile(result.generated_ids)?;
        Ok(entities.to_vec())
    }

    /// Delete the given keys (or entities' keys) in a single commit
    #[instrument(skip_all, fields(dataset = %self.config.dataset_id))]
    pub async fn delete<I, K>(&self, keys: I) -> Result<bool, MutationError>
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        let keys: Vec<Key> = keys.into_iter().map(Into::into).collect();
        if let Some(key) = keys.iter().find(|key| !key.is_complete()) {
            return Err(UsageError::IncompleteKey(key.clone()).into());
        }
        if keys.is_empty() {
            return Ok(true);
        }

        let mut batch = MutationBatch::new();
        batch.delete(keys);
        debug!("Dataset.delete {}", batch);
        self.transport.commit(None, &batch).await?;
        Ok(true)
    }

    /// Fetch one entity. Accepts a [`Key`], or a `(kind, id)` / `(kind, name)` pair in the
    /// default namespace.
    pub async fn find(&self, key: impl Into<Key>) -> Result<Option<Entity>, RetrievalError> {
        let results = self.find_all([key.into()]).await?;
        Ok(results.found.into_iter().next())
    }

    #[instrument(skip_all, fields(dataset = %self.config.dataset_id))]
    pub async fn find_all<I, K>(&self, keys: I) -> Result<LookupResults, RetrievalError>
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        let keys: Vec<Key> = keys.into_iter().map(Into::into).collect();
        lookup_all(self.transport.as_ref(), keys, None, self.config.max_lookup_batch).await
    }

    #[instrument(skip_all, fields(dataset = %self.config.dataset_id, query = %query))]
    pub async fn run(&self, query: &Query) -> Result<QueryResults, RetrievalError> { Ok(self.transport.run_query(query, None).await?) }

    /// Reserve `count` ids for keys shaped like `template`, which must be incomplete
    #[instrument(skip_all, fields(dataset = %self.config.dataset_id, template = %template, count = count))]
    pub async fn allocate_ids(&self, template: &Key, count: usize) -> Result<Vec<Key>, MutationError> {
        if template.is_complete() {
            return Err(UsageError::CompleteKey(template.clone()).into());
        }
        if count == 0 {
            return Ok(Vec::new());
        }

        let keys = self.transport.allocate_ids(template, count).await?;
        if keys.len() != count {
            return Err(MutationError::ProtocolConsistency { requested: count, returned: keys.len() });
        }
        if let Some(key) = keys.iter().find(|key| !key.is_complete()) {
            return Err(MutationError::IncompleteAllocation(key.clone()));
        }
        Ok(keys)
    }

    /// Reserve a single id
    pub async fn allocate_id(&self, template: &Key) -> Result<Key, MutationError> {
        let mut keys = self.allocate_ids(template, 1).await?;
        keys.pop().ok_or(MutationError::ProtocolConsistency { requested: 1, returned: 0 })
    }

    /// Start a transaction whose lifecycle the caller manages with `commit` / `rollback`
    pub async fn begin_transaction(&self) -> Result<Transaction, MutationError> {
        let id = self.transport.begin_transaction().await?;
        info!("Transaction {} begun on {}", id, self.config.dataset_id);
        Ok(Transaction::new(id, self.transport.clone(), self.config.max_lookup_batch))
    }

    /// Run `block` inside a transaction.
    ///
    /// If the block returns `Ok`, the staged mutations are committed and its value returned.
    /// If it returns `Err`, the transaction is rolled back without committing and the block's
    /// error comes back as [`TransactionError::Aborted`], with any rollback failure attached.
    /// A commit that was applied is never reported as [`TransactionError::CommitFailed`].
    ///
    /// ```no_run
    /// # use kestrel_core::{Dataset, Entity, Key, error::{MutationError, TransactionError}};
    /// # async fn example(dataset: Dataset) -> Result<(), TransactionError<MutationError>> {
    /// let task = Entity::new(Key::incomplete("Task")).with("done", false);
    /// dataset
    ///     .transaction(|trx| {
    ///         let task = task.clone();
    ///         async move {
    ///             trx.save(&[task])?;
    ///             Ok::<_, MutationError>(())
    ///         }
    ///     })
    ///     .await?;
    /// assert!(task.is_persisted());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn transaction<F, Fut, T, E>(&self, block: F) -> Result<T, TransactionError<E>>
    where
        F: FnOnce(Transaction) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let trx = self.begin_transaction().await.map_err(TransactionError::Begin)?;
        match block(trx.clone()).await {
            Ok(value) => match trx.commit_reporting_rollback().await {
                Ok(_) => Ok(value),
                Err((cause, _)) if trx.state() == TransactionState::Committed => Err(TransactionError::Committed(cause)),
                Err((cause, rollback)) => Err(TransactionError::CommitFailed { cause, rollback }),
            },
            Err(cause) => {
                // the block may already have ended the transaction itself
                let rollback = match trx.state() {
                    TransactionState::Open => trx.rollback().await.err(),
                    _ => None,
                };
                Err(TransactionError::Aborted { cause, rollback })
            }
        }
    }
}

impl std::fmt::Debug for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.debug_struct("Dataset").field("config", &self.config).finish() }
}
