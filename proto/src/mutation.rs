use serde::{Deserialize, Serialize};

use crate::{data::EntityWire, key::KeyWire};

/// The mutations of one commit, already partitioned by the client.
///
/// `insert_auto_id` is positional: the server answers with one generated key per element, in
/// the same order, in [`MutationResultWire::insert_auto_id_keys`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationWire {
    pub insert_auto_id: Vec<EntityWire>,
    pub upsert: Vec<EntityWire>,
    pub delete: Vec<KeyWire>,
}

impl MutationWire {
    pub fn is_empty(&self) -> bool { self.insert_auto_id.is_empty() && self.upsert.is_empty() && self.delete.is_empty() }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationResultWire {
    pub index_updates: u32,
    pub insert_auto_id_keys: Vec<KeyWire>,
}

impl std::fmt::Display for MutationWire {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Mutation(insert_auto_id {} upsert {} delete {})", self.insert_auto_id.len(), self.upsert.len(), self.delete.len())
    }
}
