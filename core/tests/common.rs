use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use kestrel_core::{
    error::TransportError,
    proto::{MoreResults, TransactionId},
    CommitResult, Dataset, DatasetConfig, Entity, Identifier, Key, LookupResponse, MutationBatch, Query, QueryResults, Transport,
};
use tracing::Level;

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() {
    // if LOG_LEVEL env var is set, use it
    if let Ok(level) = std::env::var("LOG_LEVEL") {
        tracing_subscriber::fmt().with_max_level(Level::from_str(&level).unwrap()).with_test_writer().init();
    } else {
        tracing_subscriber::fmt().with_max_level(Level::INFO).with_test_writer().init();
    }
}

/// What one commit call carried
#[derive(Debug, Clone)]
pub struct RecordedCommit {
    pub transaction: Option<TransactionId>,
    pub inserts: Vec<Entity>,
    pub upserts: Vec<Entity>,
    pub deletes: Vec<Key>,
}

#[derive(Debug, Default)]
pub struct MockState {
    pub stored: BTreeMap<Key, Entity>,
    pub next_id: i64,
    pub begun: Vec<TransactionId>,
    pub commits: Vec<RecordedCommit>,
    pub rollbacks: Vec<TransactionId>,
    pub lookups: Vec<(Vec<Key>, Option<TransactionId>)>,
    pub allocations: usize,
    pub queries: Vec<Option<TransactionId>>,
    /// Answer commits with only this many generated ids
    pub truncate_ids: Option<usize>,
    pub fail_commit: bool,
    /// Never answer commits
    pub stall_commit: bool,
    pub fail_rollback: bool,
    /// Defer this many keys (from the end of the request) on the next lookup
    pub defer_next_lookup: usize,
    /// Answer the next allocation with exactly these keys
    pub next_allocation: Option<Vec<Key>>,
}

/// In-memory transport that records every call it receives
#[derive(Default)]
pub struct MockTransport {
    pub state: Mutex<MockState>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> { Arc::new(Self { state: Mutex::new(MockState { next_id: 1, ..Default::default() }) }) }

    pub fn state(&self) -> std::sync::MutexGuard<'_, MockState> { self.state.lock().unwrap() }

    pub fn commit_count(&self) -> usize { self.state().commits.len() }

    pub fn rollback_count(&self) -> usize { self.state().rollbacks.len() }

    pub fn calls(&self) -> usize {
        let state = self.state();
        state.begun.len() + state.commits.len() + state.rollbacks.len() + state.lookups.len() + state.allocations + state.queries.len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn begin_transaction(&self) -> Result<TransactionId, TransportError> {
        let id = TransactionId::new();
        self.state().begun.push(id.clone());
        Ok(id)
    }

    async fn commit(&self, transaction: Option<&TransactionId>, batch: &MutationBatch) -> Result<CommitResult, TransportError> {
        let stall = self.state().stall_commit;
        if stall {
            std::future::pending::<()>().await;
        }
        let mut state = self.state();
        state.commits.push(RecordedCommit {
            transaction: transaction.cloned(),
            inserts: batch.inserts_with_generated_id().to_vec(),
            upserts: batch.upserts().to_vec(),
            deletes: batch.deletes().to_vec(),
        });
        if state.fail_commit {
            return Err(TransportError::Rejected("commit refused".into()));
        }

        let mut generated_ids = Vec::new();
        for entity in batch.inserts_with_generated_id() {
            let id = Identifier::Id(state.next_id);
            state.next_id += 1;
            let copy = entity.detached();
            copy.set_key(entity.key().complete_with(id.clone()));
            state.stored.insert(copy.key(), copy);
            generated_ids.push(id);
        }
        for entity in batch.upserts() {
            state.stored.insert(entity.key(), entity.detached());
        }
        for key in batch.deletes() {
            state.stored.remove(key);
        }
        if let Some(n) = state.truncate_ids {
            generated_ids.truncate(n);
        }
        Ok(CommitResult { generated_ids })
    }

    async fn rollback(&self, transaction: &TransactionId) -> Result<(), TransportError> {
        let mut state = self.state();
        state.rollbacks.push(transaction.clone());
        if state.fail_rollback {
            return Err(TransportError::Unavailable);
        }
        Ok(())
    }

    async fn lookup(&self, keys: &[Key], transaction: Option<&TransactionId>) -> Result<LookupResponse, TransportError> {
        let mut state = self.state();
        state.lookups.push((keys.to_vec(), transaction.cloned()));
        let defer = std::mem::take(&mut state.defer_next_lookup).min(keys.len());
        let (answer, deferred) = keys.split_at(keys.len() - defer);

        let mut response = LookupResponse { deferred: deferred.to_vec(), ..Default::default() };
        for key in answer {
            match state.stored.get(key) {
                Some(entity) => response.found.push(entity.detached()),
                None => response.missing.push(key.clone()),
            }
        }
        Ok(response)
    }

    async fn allocate_ids(&self, template: &Key, count: usize) -> Result<Vec<Key>, TransportError> {
        let mut state = self.state();
        state.allocations += 1;
        if let Some(keys) = state.next_allocation.take() {
            return Ok(keys);
        }
        let start = state.next_id;
        state.next_id += count as i64;
        Ok((start..start + count as i64).map(|id| template.complete_with(Identifier::Id(id))).collect())
    }

    async fn run_query(&self, query: &Query, transaction: Option<&TransactionId>) -> Result<QueryResults, TransportError> {
        let mut state = self.state();
        state.queries.push(transaction.cloned());
        let mut entities: Vec<Entity> = state.stored.values().filter(|e| query.matches(e)).map(Entity::detached).collect();
        entities.sort_by(|a, b| query.compare(a, b));
        Ok(QueryResults { entities, cursor: None, more_results: MoreResults::NoMoreResults })
    }
}

#[allow(unused)]
pub fn dataset() -> (Dataset, Arc<MockTransport>) {
    let transport = MockTransport::new();
    let dataset = Dataset::with_config(transport.clone(), DatasetConfig::default().with_dataset_id("test"));
    (dataset, transport)
}

#[allow(unused)]
pub fn task(key: Key, title: &str) -> Entity { Entity::new(key).with("title", title) }

#[allow(unused)]
pub fn titles(entities: &[Entity]) -> Vec<String> {
    entities.iter().map(|e| e.get("title").and_then(|v| v.as_str().map(str::to_owned)).unwrap_or_default()).collect()
}
