//! Rehydration of plain records into domain objects

use crate::error::{CacheError, Result};
use crate::result::Record;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;

/// Turns a plain stored record into a domain object.
///
/// Implementations must be deterministic and free of side effects: the same
/// record is rehydrated again on every cache hit.
pub trait Rehydrate: Send + Sync {
    type Output;

    fn rehydrate(&self, record: Record) -> Result<Self::Output>;
}

impl<T, F> Rehydrate for F
where
    F: Fn(Record) -> Result<T> + Send + Sync,
{
    type Output = T;

    fn rehydrate(&self, record: Record) -> Result<T> {
        self(record)
    }
}

/// Rehydrates through `serde::Deserialize`
pub struct SerdeModel<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> SerdeModel<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for SerdeModel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SerdeModel<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> Rehydrate for SerdeModel<T> {
    type Output = T;

    fn rehydrate(&self, record: Record) -> Result<T> {
        serde_json::from_value(Value::Object(record))
            .map_err(|e| CacheError::Rehydration(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Blog {
        #[serde(rename = "_id")]
        id: u64,
        title: String,
    }

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_serde_model() {
        let model = SerdeModel::<Blog>::new();
        let blog = model
            .rehydrate(record(json!({"_id": 42, "title": "X"})))
            .unwrap();
        assert_eq!(
            blog,
            Blog {
                id: 42,
                title: "X".to_string()
            }
        );
    }

    #[test]
    fn test_serde_model_rejects_bad_record() {
        let model = SerdeModel::<Blog>::new();
        let err = model.rehydrate(record(json!({"_id": "nope"}))).unwrap_err();
        assert!(matches!(err, CacheError::Rehydration(_)));
    }

    #[test]
    fn test_closure_model() {
        let model = |record: Record| -> Result<String> {
            record
                .get("title")
                .and_then(|v| v.as_str())
                .map(String::from)
                .ok_or_else(|| CacheError::Rehydration("missing title".to_string()))
        };
        assert_eq!(model.rehydrate(record(json!({"title": "X"}))).unwrap(), "X");
        assert!(model.rehydrate(Record::new()).is_err());
    }
}
