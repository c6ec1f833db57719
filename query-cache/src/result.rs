//! Result shapes and the cache payload codec

use crate::error::{CacheError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A plain stored record, keyed by field name
pub type Record = Map<String, Value>;

/// Current payload format version
pub const PAYLOAD_VERSION: u32 = 1;

/// Raw result of the real execution path
///
/// The shape tag is part of the serialized form, so a sequence holding one
/// record never comes back as a single record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "data", rename_all = "lowercase")]
pub enum RawResult {
    One(Record),
    Many(Vec<Record>),
}

impl RawResult {
    /// Number of records
    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_many(&self) -> bool {
        matches!(self, Self::Many(_))
    }

    /// Build a raw result from any serializable value.
    ///
    /// Objects become [`RawResult::One`], arrays of objects become
    /// [`RawResult::Many`]; anything else is a serialization error.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(record) => Ok(Self::One(record)),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(record) => Ok(record),
                    other => Err(not_a_record(&other)),
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::Many),
            other => Err(not_a_record(&other)),
        }
    }
}

fn not_a_record(value: &Value) -> CacheError {
    CacheError::Serialization(<serde_json::Error as serde::ser::Error>::custom(format!(
        "expected a record, got {}",
        value
    )))
}

#[derive(Serialize)]
struct PayloadRef<'a> {
    v: u32,
    result: &'a RawResult,
}

#[derive(Deserialize)]
struct PayloadOwned {
    v: u32,
    result: RawResult,
}

/// Encode a raw result into cache payload bytes
pub fn encode_payload(result: &RawResult) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&PayloadRef {
        v: PAYLOAD_VERSION,
        result,
    })?)
}

/// Decode cache payload bytes.
///
/// Any payload that is not a current-version tagged result is reported as
/// [`CacheError::StaleDeserialization`].
pub fn decode_payload(bytes: &[u8]) -> Result<RawResult> {
    let payload: PayloadOwned = serde_json::from_slice(bytes)
        .map_err(|e| CacheError::StaleDeserialization(e.to_string()))?;

    if payload.v != PAYLOAD_VERSION {
        return Err(CacheError::StaleDeserialization(format!(
            "unsupported payload version {}",
            payload.v
        )));
    }
    Ok(payload.result)
}

/// Rehydrated result handed back to callers
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Fetched<T> {
    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The single object, if this is a single-record result
    pub fn into_one(self) -> Option<T> {
        match self {
            Self::One(item) => Some(item),
            Self::Many(_) => None,
        }
    }

    /// The sequence, if this is a multi-record result
    pub fn into_many(self) -> Option<Vec<T>> {
        match self {
            Self::One(_) => None,
            Self::Many(items) => Some(items),
        }
    }

    /// Flatten into a vector regardless of shape
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, mut f: F) -> Fetched<U> {
        match self {
            Self::One(item) => Fetched::One(f(item)),
            Self::Many(items) => Fetched::Many(items.into_iter().map(f).collect()),
        }
    }
}
