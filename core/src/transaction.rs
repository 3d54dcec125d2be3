use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use kestrel_proto::TransactionId;
use tracing::{debug, info, warn};

use crate::{
    autoid::AutoIdTracker,
    batch::MutationBatch,
    entity::Entity,
    error::{MutationError, RetrievalError, UsageError},
    key::Key,
    lookup::{lookup_all, LookupResults},
    query::{Query, QueryResults},
    transport::Transport,
};

/// Lifecycle of a [`Transaction`]. `Committed` and `RolledBack` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Open,
    /// A commit request is in flight
    Committing,
    Committed,
    RolledBack,
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TransactionState::Open => "open",
            TransactionState::Committing => "committing",
            TransactionState::Committed => "committed",
            TransactionState::RolledBack => "rolled back",
        };
        write!(f, "{}", name)
    }
}

/// Mutations staged since the transaction began
struct Scope {
    state: TransactionState,
    batch: MutationBatch,
    tracker: AutoIdTracker,
}

struct TransactionInner {
    id: TransactionId,
    transport: Arc<dyn Transport>,
    max_lookup_batch: usize,
    scope: Mutex<Scope>,
}

/// An all-or-nothing scope over one server-side transaction.
///
/// Saves and deletes are staged locally and sent in a single commit. Reads go straight to the
/// transport under the transaction id and do not see staged writes. Once committed or rolled
/// back, every further call fails with [`UsageError::TransactionClosed`].
///
/// `Transaction` is a handle; clones share the same scope. A scope is meant to be driven by one
/// caller at a time: staging order is what ties generated ids back to entities.
#[derive(Clone)]
pub struct Transaction(Arc<TransactionInner>);

impl Transaction {
    pub(crate) fn new(id: TransactionId, transport: Arc<dyn Transport>, max_lookup_batch: usize) -> Self {
        Self(Arc::new(TransactionInner {
            id,
            transport,
            max_lookup_batch,
            scope: Mutex::new(Scope { state: TransactionState::Open, batch: MutationBatch::new(), tracker: AutoIdTracker::new() }),
        }))
    }

    pub fn id(&self) -> &TransactionId { &self.0.id }

    pub fn state(&self) -> TransactionState { self.scope().state }

    /// Number of mutations staged so far
    pub fn staged(&self) -> usize { self.scope().batch.len() }

    fn scope(&self) -> MutexGuard<'_, Scope> { self.0.scope.lock().unwrap_or_else(PoisonError::into_inner) }

    fn check_open(&self, scope: &Scope) -> Result<(), UsageError> {
        match scope.state {
            TransactionState::Open => Ok(()),
            state => Err(UsageError::TransactionClosed { id: self.0.id.clone(), state }),
        }
    }

    pub async fn find(&self, key: impl Into<Key>) -> Result<Option<Entity>, RetrievalError> {
        let results = self.find_all([key.into()]).await?;
        Ok(results.found.into_iter().next())
    }

    pub async fn find_all<I, K>(&self, keys: I) -> Result<LookupResults, RetrievalError>
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        let keys: Vec<Key> = keys.into_iter().map(Into::into).collect();
        self.check_open(&self.scope())?;
        lookup_all(self.0.transport.as_ref(), keys, Some(&self.0.id), self.0.max_lookup_batch).await
    }

    pub async fn run(&self, query: &Query) -> Result<QueryResults, RetrievalError> {
        self.check_open(&self.scope())?;
        Ok(self.0.transport.run_query(query, Some(&self.0.id)).await?)
    }

    /// Stage `entities` to be written at commit. Nothing is sent to the transport.
    ///
    /// Entities with incomplete keys receive their generated key in place when the commit
    /// succeeds; the returned handles are the same records that were passed in.
    pub fn save(&self, entities: &[Entity]) -> Result<Vec<Entity>, MutationError> {
        let mut scope = self.scope();
        self.check_open(&scope)?;
        let Scope { batch, tracker, .. } = &mut *scope;
        batch.save(entities.iter().cloned(), tracker);
        debug!("Transaction {} staged {}", self.0.id, batch);
        Ok(entities.to_vec())
    }

    /// Stage removal of the given keys (or entities' keys)
    pub fn delete<I, K>(&self, keys: I) -> Result<bool, MutationError>
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        let keys: Vec<Key> = keys.into_iter().map(Into::into).collect();
        let mut scope = self.scope();
        self.check_open(&scope)?;
        if let Some(key) = keys.iter().find(|key| !key.is_complete()) {
            return Err(UsageError::IncompleteKey(key.clone()).into());
        }
        scope.batch.delete(keys);
        Ok(true)
    }

    /// Send every staged mutation in one commit and resolve auto-id entities.
    ///
    /// Returns the generated keys in staging order. If the transport rejects the commit, a
    /// best-effort rollback is sent and the transaction ends up rolled back.
    pub async fn commit(&self) -> Result<Vec<Key>, MutationError> { self.commit_reporting_rollback().await.map_err(|(cause, _)| cause) }

    /// Like [`Transaction::commit`], but also hands back the rollback failure, if any, that
    /// followed a failed commit
    pub(crate) async fn commit_reporting_rollback(&self) -> Result<Vec<Key>, (MutationError, Option<MutationError>)> {
        let (batch, tracker) = {
            let mut scope = self.scope();
            if let Err(err) = self.check_open(&scope) {
                return Err((err.into(), None));
            }
            scope.state = TransactionState::Committing;
            (std::mem::take(&mut scope.batch), std::mem::take(&mut scope.tracker))
        };

        info!("Transaction {} committing {}", self.0.id, batch);
        match self.0.transport.commit(Some(&self.0.id), &batch).await {
            Ok(result) => {
                self.scope().state = TransactionState::Committed;
                tracker.reconcile(result.generated_ids).map_err(|err| (err, None))
            }
            Err(err) => {
                warn!("Transaction {} commit failed: {}", self.0.id, err);
                let rollback = self.0.transport.rollback(&self.0.id).await.err().map(MutationError::from);
                if let Some(rollback_err) = &rollback {
                    warn!("Transaction {} rollback after failed commit also failed: {}", self.0.id, rollback_err);
                }
                self.scope().state = TransactionState::RolledBack;
                Err((err.into(), rollback))
            }
        }
    }

    /// Discard every staged mutation and release the server-side transaction
    pub async fn rollback(&self) -> Result<(), MutationError> {
        {
            let mut scope = self.scope();
            self.check_open(&scope)?;
            scope.state = TransactionState::RolledBack;
            scope.batch = MutationBatch::new();
            scope.tracker = AutoIdTracker::new();
        }
        info!("Transaction {} rolling back", self.0.id);
        self.0.transport.rollback(&self.0.id).await?;
        Ok(())
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let scope = self.scope();
        f.debug_struct("Transaction").field("id", &self.0.id).field("state", &scope.state).field("staged", &scope.batch.len()).finish()
    }
}

impl Drop for TransactionInner {
    fn drop(&mut self) {
        let scope = self.scope.get_mut().unwrap_or_else(PoisonError::into_inner);
        match scope.state {
            TransactionState::Open => {
                warn!("Transaction {} dropped while open; discarding {} staged mutations", self.id, scope.batch.len())
            }
            // a commit future abandoned mid-flight; its outcome is unknown
            TransactionState::Committing => warn!("Transaction {} dropped while committing", self.id),
            TransactionState::Committed | TransactionState::RolledBack => return,
        }

        // Release the server-side transaction if there is a runtime to do it on
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let transport = self.transport.clone();
            let id = self.id.clone();
            handle.spawn(async move {
                if let Err(err) = transport.rollback(&id).await {
                    warn!("Transaction {} rollback on drop failed: {}", id, err);
                }
            });
        }
    }
}
