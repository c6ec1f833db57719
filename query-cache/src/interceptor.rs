//! Read-through query cache
//!
//! ```text
//! execute(query)
//!   ├─ not cacheable ──────────────► real execution ─► result
//!   └─ cacheable
//!        ├─ store.get(group, field) ─ hit ─► decode ─► result
//!        └─ miss / stale / store down
//!             └─ real execution ─► store.set(.., ttl) ─► result
//! ```
//!
//! Store failures never fail a read: the real execution path stays the source
//! of truth. Concurrent misses on the same key both execute and both write.

use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::executor::QueryExecutor;
use crate::group::GroupId;
use crate::model::Rehydrate;
use crate::query::Query;
use crate::result::{Fetched, RawResult, decode_payload, encode_payload};
use crate::stats::{CacheStats, CacheStatsSnapshot};
use crate::store::CacheStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Cache-aware wrapper around a query executor
#[derive(Clone)]
pub struct QueryCache<E, S> {
    executor: E,
    store: S,
    config: CacheConfig,
    stats: Arc<CacheStats>,
}

impl<E, S> QueryCache<E, S>
where
    E: QueryExecutor,
    S: CacheStore,
{
    /// Create a cache with the default configuration
    pub fn new(executor: E, store: S) -> Self {
        Self {
            executor,
            store,
            config: CacheConfig::default(),
            stats: Arc::new(CacheStats::new()),
        }
    }

    /// Create a cache with a validated configuration
    pub fn with_config(executor: E, store: S, config: CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            executor,
            store,
            config,
            stats: Arc::new(CacheStats::new()),
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    /// Run a query and rehydrate every record through `model`
    pub async fn execute<R: Rehydrate>(
        &self,
        query: &Query,
        model: &R,
    ) -> Result<Fetched<R::Output>> {
        let raw = self.execute_raw(query).await?;
        rehydrate(raw, model)
    }

    /// Run a query, returning plain records
    pub async fn execute_raw(&self, query: &Query) -> Result<RawResult> {
        let Some(directive) = query.directive() else {
            self.stats.record_passthrough();
            debug!(collection = query.collection(), "uncached query");
            return self.execute_real(query).await;
        };

        let ttl = directive.ttl.unwrap_or(self.config.default_ttl);
        if ttl.is_zero() {
            return Err(CacheError::Config("ttl must be non-zero".to_string()));
        }

        // Derived before any await: later changes to the builder cannot move this entry.
        let field = query.field_key();
        let group = directive.group.store_key(self.config.namespace.as_deref());
        let mut stale = false;

        match self.store.get(&group, field.as_str()).await {
            Ok(Some(bytes)) if bytes.is_empty() => {}
            Ok(Some(bytes)) => match decode_payload(&bytes) {
                Ok(result) => {
                    self.stats.record_hit();
                    debug!(group = %group, field = %field, "cache hit");
                    return Ok(result);
                }
                Err(e) => {
                    self.stats.record_stale();
                    warn!(group = %group, field = %field, error = %e, "discarding cached payload");
                    stale = true;
                }
            },
            Ok(None) => {}
            Err(e) if e.is_store_unavailable() => {
                self.stats.record_store_error();
                warn!(group = %group, error = %e, "cache read failed, executing query");
            }
            Err(e) => {
                self.stats.record_stale();
                warn!(group = %group, field = %field, error = %e, "unreadable cache entry");
                stale = true;
            }
        }

        self.stats.record_miss();
        debug!(group = %group, field = %field, "cache miss");

        let result = self.execute_real(query).await?;

        if stale && !self.config.overwrite_stale {
            return Ok(result);
        }

        let payload = encode_payload(&result)?;

        match self.store.set(&group, field.as_str(), payload, ttl).await {
            Ok(()) => self.stats.record_populated(),
            Err(e) => {
                self.stats.record_store_error();
                warn!(group = %group, error = %e, "cache population failed");
            }
        }

        Ok(result)
    }

    /// Purge every entry filed under `group`.
    ///
    /// Unlike reads, a store failure here is returned: the caller's write
    /// path needs to know the purge did not happen.
    pub async fn invalidate(&self, group: impl Into<GroupId>) -> Result<()> {
        let group = group.into().store_key(self.config.namespace.as_deref());
        self.store.delete(&group).await?;
        self.stats.record_invalidation();
        debug!(group = %group, "invalidated");
        Ok(())
    }

    /// Purge several groups, stopping at the first store failure
    pub async fn invalidate_many<I, G>(&self, groups: I) -> Result<()>
    where
        I: IntoIterator<Item = G>,
        G: Into<GroupId>,
    {
        for group in groups {
            self.invalidate(group).await?;
        }
        Ok(())
    }

    async fn execute_real(&self, query: &Query) -> Result<RawResult> {
        self.executor
            .execute(query)
            .await
            .map_err(CacheError::Execution)
    }
}

fn rehydrate<R: Rehydrate>(raw: RawResult, model: &R) -> Result<Fetched<R::Output>> {
    match raw {
        RawResult::One(record) => model.rehydrate(record).map(Fetched::One),
        RawResult::Many(records) => records
            .into_iter()
            .map(|record| model.rehydrate(record))
            .collect::<Result<Vec<_>>>()
            .map(Fetched::Many),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::time::Duration;

    struct Fixed(Value);

    #[async_trait]
    impl QueryExecutor for Fixed {
        async fn execute(&self, _query: &Query) -> std::result::Result<RawResult, BoxError> {
            Ok(RawResult::from_value(self.0.clone())?)
        }
    }

    #[tokio::test]
    async fn test_namespace_prefixes_group() {
        let store = MemoryStore::new();
        let config = CacheConfig::new().with_namespace("app");
        let cache =
            QueryCache::with_config(Fixed(json!({"_id": 1})), store.clone(), config).unwrap();

        cache
            .execute_raw(&Query::new("blogs").cache_in("g"))
            .await
            .unwrap();

        assert_eq!(store.group_len("app:\"g\""), 1);
        assert_eq!(store.group_len("\"g\""), 0);
    }

    #[tokio::test]
    async fn test_with_config_rejects_zero_ttl() {
        let config = CacheConfig::new().with_default_ttl(Duration::ZERO);
        let result = QueryCache::with_config(Fixed(json!({})), MemoryStore::new(), config);
        assert!(matches!(result, Err(CacheError::Config(_))));
    }

    #[tokio::test]
    async fn test_empty_cached_bytes_are_a_miss() {
        let store = MemoryStore::new();
        let query = Query::new("blogs").cache_in("g");
        store.hset("\"g\"", query.field_key().as_str(), Vec::new(), Duration::from_secs(10));

        let cache = QueryCache::new(Fixed(json!({"_id": 1})), store);
        cache.execute_raw(&query).await.unwrap();

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.stale, 0);
    }

    #[test]
    fn test_rehydrate_preserves_order() {
        let raw = RawResult::from_value(json!([{"n": 1}, {"n": 2}, {"n": 3}])).unwrap();
        let model = |r: crate::Record| -> Result<i64> { Ok(r["n"].as_i64().unwrap_or(0)) };
        assert_eq!(rehydrate(raw, &model).unwrap(), Fetched::Many(vec![1, 2, 3]));
    }
}
