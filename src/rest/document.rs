//! Document model shared by the datastore and the core.
//!
//! A [`Document`] is an ordered mapping of field names to [`Value`]s. Values
//! carry the two things plain JSON cannot: timestamps (with or without an
//! offset, since a store may hand back either) and datastore identifiers.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

pub type Document = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Offset-naive timestamp, always UTC.
    DateTime(NaiveDateTime),
    /// Offset-aware timestamp as returned by some stores.
    ZonedDateTime(DateTime<FixedOffset>),
    ObjectId(ObjectId),
    Array(Vec<Value>),
    Object(Document),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Equality used by lookups: an identifier matches its hex form, and
    /// integers match floats of the same magnitude.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::ObjectId(id), Value::String(s)) | (Value::String(s), Value::ObjectId(id)) => {
                id.to_hex() == *s
            }
            (Value::Int(i), Value::Float(f)) | (Value::Float(f), Value::Int(i)) => (*i as f64) == *f,
            (Value::DateTime(a), Value::ZonedDateTime(b))
            | (Value::ZonedDateTime(b), Value::DateTime(a)) => *a == b.naive_utc(),
            _ => self == other,
        }
    }

    /// Ordering used when sorting query results. Values of unrelated kinds
    /// compare equal so the sort stays stable for them.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).total_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.total_cmp(&(*b as f64)),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::ObjectId(a), Value::ObjectId(b)) => a.cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
            (Value::ZonedDateTime(a), Value::ZonedDateTime(b)) => a.cmp(b),
            (Value::DateTime(a), Value::ZonedDateTime(b)) => a.cmp(&b.naive_utc()),
            (Value::ZonedDateTime(a), Value::DateTime(b)) => a.naive_utc().cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(document_from_json(map)),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::DateTime(value)
    }
}

impl From<ObjectId> for Value {
    fn from(value: ObjectId) -> Self {
        Value::ObjectId(value)
    }
}

pub fn document_from_json(map: serde_json::Map<String, serde_json::Value>) -> Document {
    map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
}

/// A 12-byte datastore identifier: 4 bytes of seconds since the epoch, then
/// 4 bytes of process id, then 4 bytes of process-local counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; 12]);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid object id: {0:?}")]
pub struct InvalidObjectId(pub String);

static OBJECT_ID_COUNTER: AtomicU32 = AtomicU32::new(0);

impl ObjectId {
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub fn generate() -> Self {
        let secs = Utc::now().timestamp() as u32;
        let count = OBJECT_ID_COUNTER.fetch_add(1, AtomicOrdering::Relaxed);
        let salt = std::process::id();

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..8].copy_from_slice(&salt.to_be_bytes());
        bytes[8..].copy_from_slice(&count.to_be_bytes());
        Self(bytes)
    }

    /// Canonical form: 24 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = InvalidObjectId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| InvalidObjectId(s.to_string()))?;
        Ok(Self(bytes))
    }
}
