use async_trait::async_trait;
use kestrel_proto::{DecodeError, MutationResultWire, TransactionId};

use crate::{
    batch::MutationBatch,
    entity::Entity,
    error::TransportError,
    key::{Identifier, Key},
    query::{Query, QueryResults},
};

/// The remote (or embedded) datastore that actually executes requests.
///
/// Implementations receive validated domain values and own everything about the wire: encoding,
/// connections, retries and timeouts. Each call is a single request with no partial results.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn begin_transaction(&self) -> Result<TransactionId, TransportError>;

    /// Apply `batch` atomically, inside `transaction` if given. The response lists one generated
    /// identifier per entry of `batch.inserts_with_generated_id()`, in the same order.
    async fn commit(&self, transaction: Option<&TransactionId>, batch: &MutationBatch) -> Result<CommitResult, TransportError>;

    async fn rollback(&self, transaction: &TransactionId) -> Result<(), TransportError>;

    async fn lookup(&self, keys: &[Key], transaction: Option<&TransactionId>) -> Result<LookupResponse, TransportError>;

    /// Reserve `count` complete keys shaped like the incomplete `template`
    async fn allocate_ids(&self, template: &Key, count: usize) -> Result<Vec<Key>, TransportError>;

    async fn run_query(&self, query: &Query, transaction: Option<&TransactionId>) -> Result<QueryResults, TransportError>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitResult {
    pub generated_ids: Vec<Identifier>,
}

impl CommitResult {
    /// Read the generated identifiers out of a wire response. Every returned key must be complete.
    pub fn from_wire(wire: &MutationResultWire) -> Result<Self, DecodeError> {
        let generated_ids = wire
            .insert_auto_id_keys
            .iter()
            .map(|key| Key::from_wire(key)?.identifier().cloned().ok_or_else(|| DecodeError::IncompleteKey(key.to_string())))
            .collect::<Result<_, _>>()?;
        Ok(Self { generated_ids })
    }
}

/// One lookup round trip. Keys the transport chose not to answer yet come back as `deferred`.
#[derive(Debug, Default)]
pub struct LookupResponse {
    pub found: Vec<Entity>,
    pub missing: Vec<Key>,
    pub deferred: Vec<Key>,
}
