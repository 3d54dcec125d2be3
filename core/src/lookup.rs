use kestrel_proto::TransactionId;
use tracing::debug;

use crate::{
    entity::Entity,
    error::{RetrievalError, TransportError, UsageError},
    key::Key,
    transport::Transport,
};

/// Entities found by a lookup, plus the keys that have no stored entity
#[derive(Debug, Default)]
pub struct LookupResults {
    pub found: Vec<Entity>,
    pub missing: Vec<Key>,
}

impl std::ops::Deref for LookupResults {
    type Target = Vec<Entity>;
    fn deref(&self) -> &Self::Target { &self.found }
}

impl IntoIterator for LookupResults {
    type Item = Entity;
    type IntoIter = std::vec::IntoIter<Entity>;
    fn into_iter(self) -> Self::IntoIter { self.found.into_iter() }
}

/// Look up `keys` in requests of at most `chunk` keys, re-requesting deferred keys until the
/// transport has answered for all of them. A round that answers nothing at all is treated as a
/// transport failure rather than retried forever.
pub(crate) async fn lookup_all(
    transport: &dyn Transport,
    keys: Vec<Key>,
    transaction: Option<&TransactionId>,
    chunk: usize,
) -> Result<LookupResults, RetrievalError> {
    if let Some(key) = keys.iter().find(|key| !key.is_complete()) {
        return Err(UsageError::IncompleteKey(key.clone()).into());
    }

    let mut results = LookupResults::default();
    let mut remaining = keys;
    while !remaining.is_empty() {
        let rest = remaining.split_off(remaining.len().min(chunk.max(1)));
        let response = transport.lookup(&remaining, transaction).await?;
        debug!(
            "lookup_all: requested {} found {} missing {} deferred {}",
            remaining.len(),
            response.found.len(),
            response.missing.len(),
            response.deferred.len()
        );
        if response.found.is_empty() && response.missing.is_empty() && response.deferred.len() >= remaining.len() {
            return Err(TransportError::Rejected(format!("lookup deferred all {} keys", remaining.len())).into());
        }
        results.found.extend(response.found);
        results.missing.extend(response.missing);

        let mut next = response.deferred;
        next.extend(rest);
        remaining = next;
    }
    Ok(results)
}
