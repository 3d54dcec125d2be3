use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use kestrel_proto::{DecodeError, EntityWire, PropertyWire};

use crate::key::Key;
use crate::value::Value;

#[derive(Debug, Clone)]
struct EntityState {
    key: Key,
    properties: BTreeMap<String, Value>,
    unindexed: BTreeSet<String>,
}

/// A record with a [`Key`] and named properties.
///
/// `Entity` is a handle: clones refer to the same record. This is what lets a save hand the
/// caller's entity to the auto-id machinery and have the generated key show up on the caller's
/// own object after the commit. Use [`Entity::detached`] for an independent copy.
#[derive(Clone)]
pub struct Entity(Arc<RwLock<EntityState>>);

impl Entity {
    pub fn new(key: Key) -> Self { Self(Arc::new(RwLock::new(EntityState { key, properties: BTreeMap::new(), unindexed: BTreeSet::new() }))) }

    fn read(&self) -> RwLockReadGuard<'_, EntityState> { self.0.read().unwrap_or_else(PoisonError::into_inner) }

    fn write(&self) -> RwLockWriteGuard<'_, EntityState> { self.0.write().unwrap_or_else(PoisonError::into_inner) }

    pub fn key(&self) -> Key { self.read().key.clone() }

    pub fn kind(&self) -> String { self.read().key.kind().to_owned() }

    /// Replace this entity's key. The previous key value is left untouched for anyone else holding it.
    pub fn set_key(&self, key: Key) { self.write().key = key; }

    /// An entity is considered persisted once its key is complete
    pub fn is_persisted(&self) -> bool { self.read().key.is_complete() }

    pub fn get(&self, name: &str) -> Option<Value> { self.read().properties.get(name).cloned() }

    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) { self.write().properties.insert(name.into(), value.into()); }

    /// Builder form of [`Entity::set`]
    pub fn with(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        let mut state = self.write();
        state.unindexed.remove(name);
        state.properties.remove(name)
    }

    pub fn properties(&self) -> BTreeMap<String, Value> { self.read().properties.clone() }

    pub fn property_names(&self) -> Vec<String> { self.read().properties.keys().cloned().collect() }

    pub fn exclude_from_indexes(&self, name: impl Into<String>) { self.write().unindexed.insert(name.into()); }

    pub fn include_in_indexes(&self, name: &str) { self.write().unindexed.remove(name); }

    pub fn is_excluded_from_indexes(&self, name: &str) -> bool { self.read().unindexed.contains(name) }

    /// Whether `other` is a handle to the same record (not merely an equal one)
    pub fn same_entity(&self, other: &Entity) -> bool { Arc::ptr_eq(&self.0, &other.0) }

    /// A copy that shares nothing with this entity
    pub fn detached(&self) -> Entity { Entity(Arc::new(RwLock::new(self.read().clone()))) }

    /// A detached copy holding only the named properties
    pub fn project(&self, names: &[String]) -> Entity {
        let state = self.read();
        let properties = state.properties.iter().filter(|(name, _)| names.contains(name)).map(|(n, v)| (n.clone(), v.clone())).collect();
        let unindexed = state.unindexed.iter().filter(|name| names.contains(name)).cloned().collect();
        Entity(Arc::new(RwLock::new(EntityState { key: state.key.clone(), properties, unindexed })))
    }

    pub fn to_wire(&self) -> EntityWire {
        let state = self.read();
        EntityWire {
            key: Some(state.key.to_wire()),
            properties: state
                .properties
                .iter()
                .map(|(name, value)| PropertyWire { name: name.clone(), value: value.to_wire(), indexed: !state.unindexed.contains(name) })
                .collect(),
        }
    }

    pub fn from_wire(wire: &EntityWire) -> Result<Self, DecodeError> {
        let key = Key::from_wire(wire.key.as_ref().ok_or(DecodeError::MissingKey)?)?;
        let mut properties = BTreeMap::new();
        let mut unindexed = BTreeSet::new();
        for property in &wire.properties {
            properties.insert(property.name.clone(), Value::from_wire(&property.value)?);
            if !property.indexed {
                unindexed.insert(property.name.clone());
            }
        }
        Ok(Entity(Arc::new(RwLock::new(EntityState { key, properties, unindexed }))))
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("Entity").field("key", &state.key).field("properties", &state.properties).finish()
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        write!(f, "Entity({}) = {{", state.key)?;
        for (i, (name, value)) in state.properties.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        write!(f, "}}")
    }
}

impl From<&Entity> for Key {
    fn from(entity: &Entity) -> Self { entity.key() }
}

impl From<Entity> for Key {
    fn from(entity: Entity) -> Self { entity.key() }
}
