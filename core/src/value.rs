use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use kestrel_proto::{DecodeError, ValueWire};

use crate::key::Key;

/// A dynamically typed property value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Timestamp(DateTime<Utc>),
    String(String),
    Blob(Vec<u8>),
    Key(Key),
    List(Vec<Value>),
}

impl Value {
    /// Position of this value's type in the cross-type sort order
    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Integer(_) => 2,
            Value::Double(_) => 3,
            Value::Timestamp(_) => 4,
            Value::String(_) => 5,
            Value::Blob(_) => 6,
            Value::Key(_) => 7,
            Value::List(_) => 8,
        }
    }

    pub fn same_type(&self, other: &Value) -> bool { self.rank() == other.rank() }

    /// Total order over all values: by type first, then by value within a type.
    /// Doubles use IEEE total ordering, so NaN sorts after every other double.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Double(a), Value::Double(b)) => a.total_cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Blob(a), Value::Blob(b)) => a.cmp(b),
            (Value::Key(a), Value::Key(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.total_cmp(y) {
                        Ordering::Equal => continue,
                        other => return other,
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => self.rank().cmp(&other.rank()),
        }
    }

    pub fn is_null(&self) -> bool { matches!(self, Value::Null) }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_key(&self) -> Option<&Key> {
        match self {
            Value::Key(k) => Some(k),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn to_wire(&self) -> ValueWire {
        match self {
            Value::Null => ValueWire::Null,
            Value::Boolean(b) => ValueWire::Boolean(*b),
            Value::Integer(i) => ValueWire::Integer(*i),
            Value::Double(d) => ValueWire::Double(*d),
            Value::Timestamp(t) => ValueWire::Timestamp(t.timestamp_micros()),
            Value::String(s) => ValueWire::String(s.clone()),
            Value::Blob(b) => ValueWire::Blob(b.clone()),
            Value::Key(k) => ValueWire::Key(k.to_wire()),
            Value::List(items) => ValueWire::List(items.iter().map(Value::to_wire).collect()),
        }
    }

    pub fn from_wire(wire: &ValueWire) -> Result<Self, DecodeError> {
        Ok(match wire {
            ValueWire::Null => Value::Null,
            ValueWire::Boolean(b) => Value::Boolean(*b),
            ValueWire::Integer(i) => Value::Integer(*i),
            ValueWire::Double(d) => Value::Double(*d),
            ValueWire::Timestamp(micros) => {
                Value::Timestamp(DateTime::from_timestamp_micros(*micros).ok_or(DecodeError::InvalidTimestamp(*micros))?)
            }
            ValueWire::String(s) => Value::String(s.clone()),
            ValueWire::Blob(b) => Value::Blob(b.clone()),
            ValueWire::Key(k) => Value::Key(Key::from_wire(k)?),
            ValueWire::List(items) => Value::List(items.iter().map(Value::from_wire).collect::<Result<_, _>>()?),
        })
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Double(d) => write!(f, "{}", d),
            Value::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
            Value::Key(k) => write!(f, "{}", k),
            Value::List(items) => write!(f, "[{}]", items.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self { Value::Boolean(b) }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self { Value::Integer(i) }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self { Value::Integer(i as i64) }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self { Value::Double(d) }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::String(s.to_owned()) }
}

impl From<String> for Value {
    fn from(s: String) -> Self { Value::String(s) }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self { Value::Blob(b) }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self { Value::Timestamp(t) }
}

impl From<Key> for Value {
    fn from(k: Key) -> Self { Value::Key(k) }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self { Value::List(items) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self { value.map(Into::into).unwrap_or(Value::Null) }
}
