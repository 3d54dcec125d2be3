use kestrel_core::Entity;
use kestrel_proto::{EntityWire, KeyWire};
use sled::Db;

use crate::error::SledTransportError;

pub struct Database {
    pub db: Db,
    /// Encoded entities keyed by their encoded key
    pub(crate) entities_tree: sled::Tree,
}

impl Database {
    pub fn open(db: Db) -> anyhow::Result<Self> {
        let entities_tree = db.open_tree("entities")?;
        Ok(Self { db, entities_tree })
    }

    /// Number of stored entities
    pub fn len(&self) -> usize { self.entities_tree.len() }

    pub fn is_empty(&self) -> bool { self.entities_tree.is_empty() }
}

pub(crate) fn encode_key(key: &KeyWire) -> Result<Vec<u8>, SledTransportError> { Ok(key.to_bytes()?) }

pub(crate) fn decode_entity(bytes: &[u8]) -> Result<Entity, SledTransportError> {
    let wire: EntityWire = bincode::deserialize(bytes)?;
    Ok(Entity::from_wire(&wire)?)
}
