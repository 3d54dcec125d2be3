//! An embedded [`Transport`](kestrel_core::Transport) that keeps entities in a local Sled
//! database. Useful for tests, tools and single-process deployments.

mod database;
mod engine;
pub mod error;
mod scan;

pub use database::Database;
pub use engine::{SledTransport, MAX_LOOKUP_KEYS, MAX_QUERY_BATCH};
