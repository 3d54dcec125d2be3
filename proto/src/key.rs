use serde::{Deserialize, Serialize};

/// Partition a key lives in. An absent namespace is the default namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionId {
    pub namespace: Option<String>,
}

/// One step of a key path. At most one of `id` / `name` is set; neither means the element
/// is still waiting for the server to assign an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PathElement {
    pub kind: String,
    pub id: Option<i64>,
    pub name: Option<String>,
}

impl PathElement {
    pub fn is_complete(&self) -> bool { self.id.is_some() || self.name.is_some() }
}

/// A key as it goes over the wire: a partition plus a root-first path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyWire {
    pub partition: PartitionId,
    pub path: Vec<PathElement>,
}

impl KeyWire {
    /// The last path element, which names the keyed record itself
    pub fn leaf(&self) -> Option<&PathElement> { self.path.last() }

    pub fn is_complete(&self) -> bool { self.leaf().map(PathElement::is_complete).unwrap_or(false) }

    /// Bytes used by storage engines to index this key. Only meaningful for complete keys.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> { bincode::serialize(self) }
}

impl std::fmt::Display for KeyWire {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ns) = &self.partition.namespace {
            write!(f, "[{}]", ns)?;
        }
        for (i, element) in self.path.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            match (&element.id, &element.name) {
                (Some(id), _) => write!(f, "{}:{}", element.kind, id)?,
                (None, Some(name)) => write!(f, "{}:{:?}", element.kind, name)?,
                (None, None) => write!(f, "{}:?", element.kind)?,
            }
        }
        Ok(())
    }
}
