//! Wire representation for Kestrel.
//!
//! These types are what a transport actually moves or persists. The domain types in
//! `kestrel-core` convert to and from them with `to_wire` / `from_wire`; nothing in here
//! knows about transactions, batching or auto-id reconciliation.

pub mod data;
pub mod error;
pub mod key;
pub mod mutation;
pub mod query;
pub mod transaction;

pub use data::*;
pub use error::*;
pub use key::*;
pub use mutation::*;
pub use query::*;
pub use transaction::*;
