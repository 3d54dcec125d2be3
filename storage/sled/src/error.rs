use kestrel_core::error::TransportError;
use kestrel_proto::DecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SledTransportError {
    #[error("Storage error: {0}")]
    StorageError(#[from] sled::Error),
    #[error("Bincode error: {0}")]
    BincodeError(#[from] bincode::Error),
    #[error("Decode error: {0}")]
    DecodeError(#[from] DecodeError),
    #[error("Stored entity has no key")]
    MissingKey,
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<SledTransportError> for TransportError {
    fn from(err: SledTransportError) -> Self {
        match err {
            SledTransportError::DecodeError(e) => TransportError::Decode(e),
            other => TransportError::Backend(Box::new(other)),
        }
    }
}
