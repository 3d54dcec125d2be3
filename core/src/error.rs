//! Error types for Kestrel.
//!
//! Every failure is a distinct variant so callers can decide between retrying, surfacing or
//! ignoring it. Nothing in this crate retries on its own.

use kestrel_proto::{DecodeError, TransactionId};
use thiserror::Error;

use crate::{key::Key, transaction::TransactionState};

/// The API was used in a way its contract forbids
#[derive(Debug, Error)]
pub enum UsageError {
    /// The transaction already reached a terminal state (or is mid-commit)
    #[error("transaction {id} is {state}")]
    TransactionClosed { id: TransactionId, state: TransactionState },

    /// Ids can only be allocated from an incomplete key
    #[error("key {0} is already complete")]
    CompleteKey(Key),

    /// Lookups and deletes need the record's full key
    #[error("key {0} is incomplete")]
    IncompleteKey(Key),
}

/// Failure reported by the transport collaborator, passed through unchanged
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport unavailable")]
    Unavailable,

    #[error("rejected: {0}")]
    Rejected(String),

    #[error("transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("backend error: {0}")]
    Backend(Box<dyn std::error::Error + Send + Sync + 'static>),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Error type for mutation operations.
///
/// Returned from: `Dataset::save`, `delete`, `allocate_ids`, `begin_transaction`;
/// `Transaction::save`, `delete`, `commit`, `rollback`
#[derive(Debug, Error)]
pub enum MutationError {
    #[error("usage error: {0}")]
    Usage(#[from] UsageError),

    /// The transport answered with a different number of generated keys than were requested.
    /// Entities covered by the overlapping prefix were still resolved.
    #[error("transport returned {returned} generated keys for {requested} requested")]
    ProtocolConsistency { requested: usize, returned: usize },

    /// The transport allocated a key that is still missing its id
    #[error("transport allocated incomplete key {0}")]
    IncompleteAllocation(Key),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Error type for retrieval operations.
///
/// Returned from: `Dataset::find`, `find_all`, `run`; `Transaction::find`, `find_all`, `run`
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("usage error: {0}")]
    Usage(#[from] UsageError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Error returned by the block form of `Dataset::transaction`.
///
/// `E` is whatever error type the caller's block returns; it is handed back untouched.
#[derive(Debug)]
pub enum TransactionError<E> {
    /// The transaction could not be started; the block never ran
    Begin(MutationError),

    /// The block failed and the transaction was rolled back. `rollback` carries the
    /// secondary failure if the rollback itself could not be delivered.
    Aborted { cause: E, rollback: Option<MutationError> },

    /// The block succeeded but the commit did not; nothing was written
    CommitFailed { cause: MutationError, rollback: Option<MutationError> },

    /// The commit was applied, but its generated keys could not all be written back onto the
    /// saved entities. Retrying would write the auto-id entities a second time.
    Committed(MutationError),
}

impl<E> TransactionError<E> {
    /// The error returned by the caller's block, if that is what ended the transaction
    pub fn cause(&self) -> Option<&E> {
        match self {
            TransactionError::Aborted { cause, .. } => Some(cause),
            _ => None,
        }
    }

    pub fn into_cause(self) -> Option<E> {
        match self {
            TransactionError::Aborted { cause, .. } => Some(cause),
            _ => None,
        }
    }

    pub fn rollback_error(&self) -> Option<&MutationError> {
        match self {
            TransactionError::Aborted { rollback, .. } | TransactionError::CommitFailed { rollback, .. } => rollback.as_ref(),
            TransactionError::Begin(_) | TransactionError::Committed(_) => None,
        }
    }
}

impl<E: std::fmt::Display> std::fmt::Display for TransactionError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionError::Begin(e) => write!(f, "failed to begin transaction: {}", e),
            TransactionError::Aborted { cause, rollback: None } => write!(f, "transaction rolled back: {}", cause),
            TransactionError::Aborted { cause, rollback: Some(r) } => {
                write!(f, "transaction rolled back: {} (rollback also failed: {})", cause, r)
            }
            TransactionError::CommitFailed { cause, rollback: None } => write!(f, "transaction failed to commit: {}", cause),
            TransactionError::CommitFailed { cause, rollback: Some(r) } => {
                write!(f, "transaction failed to commit: {} (rollback also failed: {})", cause, r)
            }
            TransactionError::Committed(e) => write!(f, "transaction committed but not fully resolved: {}", e),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for TransactionError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransactionError::Begin(e) => Some(e),
            TransactionError::Aborted { cause, .. } => Some(cause),
            TransactionError::CommitFailed { cause, .. } => Some(cause),
            TransactionError::Committed(e) => Some(e),
        }
    }
}
