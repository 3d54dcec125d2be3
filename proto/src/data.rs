use serde::{Deserialize, Serialize};

use crate::key::KeyWire;

/// A property value on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueWire {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    /// Microseconds since the unix epoch, UTC
    Timestamp(i64),
    String(String),
    Blob(Vec<u8>),
    Key(KeyWire),
    List(Vec<ValueWire>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyWire {
    pub name: String,
    pub value: ValueWire,
    pub indexed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityWire {
    pub key: Option<KeyWire>,
    pub properties: Vec<PropertyWire>,
}

impl EntityWire {
    pub fn property(&self, name: &str) -> Option<&PropertyWire> { self.properties.iter().find(|p| p.name == name) }
}

impl std::fmt::Display for EntityWire {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.key {
            Some(key) => write!(f, "EntityWire({}", key)?,
            None => write!(f, "EntityWire(<no key>")?,
        }
        write!(f, " {})", self.properties.iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(","))
    }
}
