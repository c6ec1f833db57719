//! Group identifiers
//!
//! A group is the outer key under which field keys are filed. Every entry in a
//! group is purged together by [`QueryCache::invalidate`](crate::QueryCache::invalidate).

use crate::key::canonical_json;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Caller-chosen group identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupId {
    Text(String),
    Number(Number),
    Structured(Value),
}

impl Default for GroupId {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl GroupId {
    /// Encode as canonical JSON text.
    ///
    /// Text and numbers stay distinct: `"42"` encodes as `"\"42\""`, `42` as `"42"`.
    pub fn encode(&self) -> String {
        match self {
            Self::Text(s) => Value::String(s.clone()).to_string(),
            Self::Number(n) => n.to_string(),
            Self::Structured(v) => canonical_json(v),
        }
    }

    /// Store key for this group, optionally prefixed with a namespace
    pub fn store_key(&self, namespace: Option<&str>) -> String {
        match namespace {
            Some(ns) => format!("{}:{}", ns, self.encode()),
            None => self.encode(),
        }
    }
}

impl From<&str> for GroupId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for GroupId {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for GroupId {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<u64> for GroupId {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl From<Value> for GroupId {
    /// Scalars collapse onto their dedicated variants so that
    /// `json!("x")` and `"x"` name the same group.
    fn from(v: Value) -> Self {
        match v {
            Value::String(s) => Self::Text(s),
            Value::Number(n) => Self::Number(n),
            other => Self::Structured(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_is_empty_text() {
        assert_eq!(GroupId::default(), GroupId::Text(String::new()));
        assert_eq!(GroupId::default().encode(), "\"\"");
    }

    #[test]
    fn test_text_and_number_do_not_alias() {
        let text = GroupId::from("42");
        let number = GroupId::from(42i64);
        assert_eq!(text.encode(), "\"42\"");
        assert_eq!(number.encode(), "42");
        assert_ne!(text.encode(), number.encode());
    }

    #[test]
    fn test_structured_is_canonical() {
        let a = GroupId::from(json!({"user": 7, "kind": "blog"}));
        let b = GroupId::from(json!({"kind": "blog", "user": 7}));
        assert_eq!(a.encode(), b.encode());
        assert_eq!(a.encode(), r#"{"kind":"blog","user":7}"#);
    }

    #[test]
    fn test_scalar_values_collapse() {
        assert_eq!(GroupId::from(json!("blog-42")), GroupId::from("blog-42"));
        assert_eq!(GroupId::from(json!(42)), GroupId::from(42u64));
    }

    #[test]
    fn test_store_key_namespace() {
        let group = GroupId::from("blog-42");
        assert_eq!(group.store_key(None), "\"blog-42\"");
        assert_eq!(group.store_key(Some("app")), "app:\"blog-42\"");
    }
}
