//! Read query descriptors

use crate::group::GroupId;
use crate::key::FieldKey;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;

/// Caching instructions attached to a query
#[derive(Debug, Clone, PartialEq)]
pub struct CacheDirective {
    /// Group the entry is filed under
    pub group: GroupId,
    /// Per-query TTL; falls back to the cache's default when `None`
    pub ttl: Option<Duration>,
}

/// A read query against one collection
///
/// Queries are uncached unless [`cache`](Self::cache) or
/// [`cache_in`](Self::cache_in) is called.
///
/// ```
/// use query_cache::Query;
///
/// let query = Query::new("blogs")
///     .filter("_user", "u1")
///     .cache_in("u1");
/// assert!(query.is_cacheable());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    collection: String,
    filter: Map<String, Value>,
    directive: Option<CacheDirective>,
}

impl Query {
    /// Start a query against `collection` with an empty filter
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filter: Map::new(),
            directive: None,
        }
    }

    /// Add a filter condition
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter.insert(field.into(), value.into());
        self
    }

    /// Merge a whole filter object
    pub fn with_filter(mut self, filter: Map<String, Value>) -> Self {
        self.filter.extend(filter);
        self
    }

    /// Merge any serializable filter value. Non-object values are rejected.
    pub fn with_filter_value<T: Serialize>(self, filter: &T) -> crate::Result<Self> {
        match serde_json::to_value(filter)? {
            Value::Object(map) => Ok(self.with_filter(map)),
            other => Err(crate::CacheError::Serialization(
                <serde_json::Error as serde::ser::Error>::custom(format!(
                    "filter must be an object, got {}",
                    other
                )),
            )),
        }
    }

    /// Consult the cache under the default group
    pub fn cache(self) -> Self {
        self.cache_in(GroupId::default())
    }

    /// Consult the cache and file the entry under `group`
    pub fn cache_in(mut self, group: impl Into<GroupId>) -> Self {
        self.mark_cacheable(group);
        self
    }

    /// Override the TTL for this query's entry. Marks the query cacheable
    /// under the default group if it was not already.
    ///
    /// A zero TTL is rejected when the query is executed.
    pub fn cache_for(mut self, ttl: Duration) -> Self {
        self.directive
            .get_or_insert_with(|| CacheDirective {
                group: GroupId::default(),
                ttl: None,
            })
            .ttl = Some(ttl);
        self
    }

    /// Drop any caching instructions
    pub fn no_cache(mut self) -> Self {
        self.directive = None;
        self
    }

    /// In-place form of [`cache_in`](Self::cache_in). Keeps an existing TTL override.
    pub fn mark_cacheable(&mut self, group: impl Into<GroupId>) -> &mut Self {
        let ttl = self.directive.as_ref().and_then(|d| d.ttl);
        self.directive = Some(CacheDirective {
            group: group.into(),
            ttl,
        });
        self
    }

    pub fn is_cacheable(&self) -> bool {
        self.directive.is_some()
    }

    pub fn directive(&self) -> Option<&CacheDirective> {
        self.directive.as_ref()
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn filter_ref(&self) -> &Map<String, Value> {
        &self.filter
    }

    /// Owned plain copy of the filter
    pub fn filter_snapshot(&self) -> Map<String, Value> {
        self.filter.clone()
    }

    /// Field key for this query's current filter and collection
    pub fn field_key(&self) -> FieldKey {
        FieldKey::derive(&self.filter, &self.collection)
    }
}
