pub mod autoid;
pub mod batch;
pub mod config;
pub mod dataset;
pub mod entity;
pub mod error;
pub mod key;
pub mod lookup;
pub mod query;
pub mod transaction;
pub mod transport;
pub mod value;

pub use autoid::AutoIdTracker;
pub use batch::MutationBatch;
pub use config::DatasetConfig;
pub use dataset::Dataset;
pub use entity::Entity;
pub use key::{Identifier, Key};
pub use lookup::LookupResults;
pub use query::{Direction, Operator, Query, QueryResults};
pub use transaction::{Transaction, TransactionState};
pub use transport::{CommitResult, LookupResponse, Transport};
pub use value::Value;

pub use kestrel_proto as proto;
