use kestrel_proto::MutationWire;
use tracing::debug;

use crate::{autoid::AutoIdTracker, entity::Entity, key::Key};

/// The inserts, upserts and deletes accumulated for a single commit.
///
/// A batch is built fresh for each save call or transaction and is never reused.
#[derive(Debug, Default)]
pub struct MutationBatch {
    inserts_with_generated_id: Vec<Entity>,
    upserts: Vec<Entity>,
    deletes: Vec<Key>,
}

impl MutationBatch {
    pub fn new() -> Self { Self::default() }

    /// Stage `entities` for saving, in the order given.
    ///
    /// An entity whose key is incomplete goes to the generated-id inserts and is registered
    /// with `tracker` in the same step; everything else is an upsert. Staging the same entity
    /// handle twice has no further effect.
    pub fn save(&mut self, entities: impl IntoIterator<Item = Entity>, tracker: &mut AutoIdTracker) {
        for entity in entities {
            if self.contains(&entity) {
                debug!("MutationBatch.save: {} already staged", entity.key());
                continue;
            }
            if entity.key().is_complete() {
                self.upserts.push(entity);
            } else {
                tracker.register(entity.clone());
                self.inserts_with_generated_id.push(entity);
            }
        }
    }

    /// Stage removal of `keys`
    pub fn delete(&mut self, keys: impl IntoIterator<Item = Key>) {
        for key in keys {
            if !self.deletes.contains(&key) {
                self.deletes.push(key);
            }
        }
    }

    fn contains(&self, entity: &Entity) -> bool {
        self.inserts_with_generated_id.iter().chain(self.upserts.iter()).any(|staged| staged.same_entity(entity))
    }

    pub fn inserts_with_generated_id(&self) -> &[Entity] { &self.inserts_with_generated_id }

    pub fn upserts(&self) -> &[Entity] { &self.upserts }

    pub fn deletes(&self) -> &[Key] { &self.deletes }

    pub fn len(&self) -> usize { self.inserts_with_generated_id.len() + self.upserts.len() + self.deletes.len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn to_wire(&self) -> MutationWire {
        MutationWire {
            insert_auto_id: self.inserts_with_generated_id.iter().map(Entity::to_wire).collect(),
            upsert: self.upserts.iter().map(Entity::to_wire).collect(),
            delete: self.deletes.iter().map(Key::to_wire).collect(),
        }
    }
}

impl std::fmt::Display for MutationBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MutationBatch(insert {} upsert {} delete {})", self.inserts_with_generated_id.len(), self.upserts.len(), self.deletes.len())
    }
}
