//! Field key derivation
//!
//! A field key is the canonical JSON text of `{"collection": .., "filter": ..}`.
//! Object keys are written in sorted order at every depth, so the key does not
//! depend on the order in which filter fields were added.

use serde_json::{Map, Value};
use std::fmt;
use tracing::trace;

/// Inner key of a cache entry within its group
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldKey(String);

impl FieldKey {
    /// Derive the key for a filter applied to a collection
    pub fn derive(filter: &Map<String, Value>, collection: &str) -> Self {
        let mut out = String::with_capacity(64);
        out.push_str("{\"collection\":");
        write_string(&mut out, collection);
        out.push_str(",\"filter\":");
        write_object(&mut out, filter);
        out.push('}');

        trace!("derived field key {}", out);
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FieldKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Serialize a value with object keys sorted at every depth
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => write_object(out, map),
    }
}

fn write_object(out: &mut String, map: &Map<String, Value>) {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

    out.push('{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_string(out, key);
        out.push(':');
        write_value(out, value);
    }
    out.push('}');
}

fn write_string(out: &mut String, s: &str) {
    // Serializing a str into JSON cannot fail
    out.push_str(&Value::String(s.to_owned()).to_string());
}
