//! # Kestrel
//!
//! Kestrel is a client for entity datastores. It builds keys, stages saves and deletes into
//! batches, looks entities up, runs queries and wraps all of it in transactions, while a
//! pluggable [`Transport`] does the actual talking to the store.
//!
//! ## Core Concepts
//!
//! - **Key**: the path identifying an entity, optionally under a parent and a namespace. A key
//!   without an id or name is *incomplete*; the store generates its id on insert.
//! - **Entity**: a keyed bag of properties. Entities are handles, so a generated key written back
//!   after a save is visible through every clone the caller holds.
//! - **Dataset**: the entry point. Saves and deletes issued directly on it are committed at once.
//! - **Transaction**: stages saves and deletes and sends them in a single commit, or none at all.
//!
//! ## Example
//!
//! ```rust
//! # use kestrel::{Dataset, DatasetConfig, Entity, error::MutationError};
//! # use kestrel_storage_sled::SledTransport;
//! # use std::sync::Arc;
//! #
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dataset = Dataset::with_config(Arc::new(SledTransport::new_test()?), DatasetConfig::default());
//!
//!     // Stage two albums and commit them together
//!     let album = dataset.entity("Album").with("name", "Origin of Symmetry").with("year", 2001);
//!     dataset
//!         .transaction(|trx| {
//!             let album = album.clone();
//!             async move {
//!                 trx.save(&[album])?;
//!                 Ok::<_, MutationError>(())
//!             }
//!         })
//!         .await?;
//!
//!     // The generated key is already on the entity we kept
//!     let found = dataset.find(album.key()).await?.expect("album was committed");
//!     println!("Saved {}", found);
//!
//!     Ok(())
//! # }
//! ```

pub use kestrel_core as core;
pub use kestrel_proto as proto;
#[cfg(feature = "sled")]
pub use kestrel_storage_sled as sled;

// Re-export commonly used types
pub use kestrel_core::{
    error,
    query::{Filter, Order, KEY_PROPERTY},
    AutoIdTracker, CommitResult, Dataset, DatasetConfig, Direction, Entity, Identifier, Key, LookupResponse, LookupResults,
    MutationBatch, Operator, Query, QueryResults, Transaction, TransactionState, Transport, Value,
};
pub use kestrel_proto::{Cursor, MoreResults, TransactionId};
