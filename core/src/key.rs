use std::cmp::Ordering;

use kestrel_proto::{DecodeError, KeyWire, PartitionId, PathElement};

/// The identifying component of a key: a server-assigned or caller-chosen numeric id, or a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Identifier {
    Id(i64),
    Name(String),
}

impl Identifier {
    pub fn as_id(&self) -> Option<i64> {
        match self {
            Identifier::Id(id) => Some(*id),
            Identifier::Name(_) => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Identifier::Id(_) => None,
            Identifier::Name(name) => Some(name),
        }
    }
}

impl From<i64> for Identifier {
    fn from(id: i64) -> Self { Identifier::Id(id) }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self { Identifier::Name(name.to_owned()) }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self { Identifier::Name(name) }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Identifier::Id(id) => write!(f, "{}", id),
            Identifier::Name(name) => write!(f, "{:?}", name),
        }
    }
}

/// Identifies a stored record.
///
/// A key is *complete* once it has an [`Identifier`]; an incomplete key names only a kind and is
/// used either as a template for id allocation or as the key of an entity awaiting an
/// auto-generated id. Keys are plain values: two keys are equal when their namespace and whole
/// parent path are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    kind: String,
    identifier: Option<Identifier>,
    parent: Option<Box<Key>>,
    namespace: Option<String>,
}

impl Key {
    pub fn new(kind: impl Into<String>, identifier: Option<Identifier>) -> Self {
        Self { kind: kind.into(), identifier, parent: None, namespace: None }
    }

    pub fn incomplete(kind: impl Into<String>) -> Self { Self::new(kind, None) }

    pub fn with_id(kind: impl Into<String>, id: i64) -> Self { Self::new(kind, Some(Identifier::Id(id))) }

    pub fn with_name(kind: impl Into<String>, name: impl Into<String>) -> Self { Self::new(kind, Some(Identifier::Name(name.into()))) }

    /// Place this key under `parent`. The key moves into the parent's namespace.
    pub fn with_parent(mut self, parent: Key) -> Self {
        self.namespace = parent.namespace.clone();
        self.parent = Some(Box::new(parent));
        self
    }

    /// Build a child of this key
    pub fn child(&self, kind: impl Into<String>, identifier: Option<Identifier>) -> Key { Key::new(kind, identifier).with_parent(self.clone()) }

    /// Move this key, and its whole parent chain, into `namespace`
    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        if let Some(parent) = self.parent.take() {
            self.parent = Some(Box::new(parent.with_namespace(namespace.clone())));
        }
        self.namespace = namespace;
        self
    }

    pub fn kind(&self) -> &str { &self.kind }

    pub fn identifier(&self) -> Option<&Identifier> { self.identifier.as_ref() }

    pub fn id(&self) -> Option<i64> { self.identifier.as_ref().and_then(Identifier::as_id) }

    pub fn name(&self) -> Option<&str> { self.identifier.as_ref().and_then(Identifier::as_name) }

    pub fn parent(&self) -> Option<&Key> { self.parent.as_deref() }

    pub fn namespace(&self) -> Option<&str> { self.namespace.as_deref() }

    pub fn is_complete(&self) -> bool { self.identifier.is_some() }

    /// A new key equal to this one but carrying `identifier`.
    ///
    /// This never touches `self`: an incomplete key may be shared as a template by many
    /// entities, so resolving one of them must produce a fresh value.
    pub fn complete_with(&self, identifier: Identifier) -> Key {
        Key { kind: self.kind.clone(), identifier: Some(identifier), parent: self.parent.clone(), namespace: self.namespace.clone() }
    }

    /// `(kind, identifier)` pairs from the root ancestor down to this key
    pub fn path(&self) -> Vec<(&str, Option<&Identifier>)> {
        let mut path = match &self.parent {
            Some(parent) => parent.path(),
            None => Vec::new(),
        };
        path.push((self.kind.as_str(), self.identifier.as_ref()));
        path
    }

    /// True if `ancestor` is this key or one of its parents
    pub fn descends_from(&self, ancestor: &Key) -> bool {
        let mut current = Some(self);
        while let Some(key) = current {
            if key == ancestor {
                return true;
            }
            current = key.parent();
        }
        false
    }

    pub fn to_wire(&self) -> KeyWire {
        let path = self
            .path()
            .into_iter()
            .map(|(kind, identifier)| PathElement {
                kind: kind.to_owned(),
                id: identifier.and_then(Identifier::as_id),
                name: identifier.and_then(Identifier::as_name).map(str::to_owned),
            })
            .collect();
        KeyWire { partition: PartitionId { namespace: self.namespace.clone() }, path }
    }

    pub fn from_wire(wire: &KeyWire) -> Result<Self, DecodeError> {
        let last = wire.path.len().checked_sub(1).ok_or(DecodeError::EmptyPath)?;
        let mut key: Option<Key> = None;
        for (i, element) in wire.path.iter().enumerate() {
            let identifier = match (element.id, &element.name) {
                (Some(_), Some(_)) => return Err(DecodeError::AmbiguousIdentifier { kind: element.kind.clone() }),
                (Some(id), None) => Some(Identifier::Id(id)),
                (None, Some(name)) => Some(Identifier::Name(name.clone())),
                (None, None) if i < last => return Err(DecodeError::IncompleteAncestor { kind: element.kind.clone() }),
                (None, None) => None,
            };
            let next = Key {
                kind: element.kind.clone(),
                identifier,
                parent: key.take().map(Box::new),
                namespace: wire.partition.namespace.clone(),
            };
            key = Some(next);
        }
        key.ok_or(DecodeError::EmptyPath)
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

/// Namespace first, then path element by element from the root, ancestors before descendants.
impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.namespace.cmp(&other.namespace).then_with(|| self.path().cmp(&other.path()))
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.to_wire()) }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self { key.clone() }
}

impl From<(&str, i64)> for Key {
    fn from((kind, id): (&str, i64)) -> Self { Key::with_id(kind, id) }
}

impl From<(&str, &str)> for Key {
    fn from((kind, name): (&str, &str)) -> Self { Key::with_name(kind, name) }
}
