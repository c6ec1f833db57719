//! Common test utilities

use async_trait::async_trait;
use mockito::{Server, ServerGuard};
use query_cache::{
    BoxError, CacheError, CacheStore, Query, QueryExecutor, RawResult, Record, SynapStore,
    SynapStoreConfig,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Blog post domain object
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Blog {
    #[serde(rename = "_id")]
    pub id: u64,
    pub title: String,
    #[serde(rename = "_user")]
    pub user: String,
}

/// In-memory data store that counts every real execution.
///
/// A filter on `_id` returns a single record; any other filter returns the
/// matching sequence in insertion order.
#[allow(dead_code)]
pub struct FakeDb {
    collections: HashMap<String, Vec<Record>>,
    calls: AtomicUsize,
    fail: AtomicBool,
}

#[allow(dead_code)]
impl FakeDb {
    pub fn new() -> Self {
        Self {
            collections: HashMap::new(),
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    pub fn blogs() -> Self {
        Self::new().with_records(
            "blogs",
            vec![
                json!({"_id": 42, "title": "X", "_user": "u1"}),
                json!({"_id": 43, "title": "Y", "_user": "u1"}),
                json!({"_id": 44, "title": "Z", "_user": "u2"}),
            ],
        )
    }

    pub fn with_records(mut self, collection: &str, records: Vec<Value>) -> Self {
        let records = records
            .into_iter()
            .map(|v| match v {
                Value::Object(map) => map,
                other => panic!("not a record: {}", other),
            })
            .collect();
        self.collections.insert(collection.to_string(), records);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl QueryExecutor for FakeDb {
    async fn execute(&self, query: &Query) -> Result<RawResult, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Let concurrent callers interleave
        tokio::task::yield_now().await;

        if self.fail.load(Ordering::SeqCst) {
            return Err("data store fault".into());
        }

        let records = self
            .collections
            .get(query.collection())
            .ok_or_else(|| format!("unknown collection {}", query.collection()))?;

        let matching: Vec<Record> = records
            .iter()
            .filter(|r| {
                query
                    .filter_ref()
                    .iter()
                    .all(|(k, v)| r.get(k) == Some(v))
            })
            .cloned()
            .collect();

        if query.filter_ref().contains_key("_id") {
            matching
                .into_iter()
                .next()
                .map(RawResult::One)
                .ok_or_else(|| "no record".into())
        } else {
            Ok(RawResult::Many(matching))
        }
    }
}

/// A cache store whose backend is never reachable
#[allow(dead_code)]
#[derive(Default)]
pub struct DownStore {
    pub calls: AtomicUsize,
}

#[async_trait]
impl CacheStore for DownStore {
    async fn get(&self, _group: &str, _field: &str) -> query_cache::Result<Option<Vec<u8>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::StoreUnavailable("connection refused".to_string()))
    }

    async fn set(
        &self,
        _group: &str,
        _field: &str,
        _value: Vec<u8>,
        _ttl: Duration,
    ) -> query_cache::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::StoreUnavailable("connection refused".to_string()))
    }

    async fn delete(&self, _group: &str) -> query_cache::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::StoreUnavailable("connection refused".to_string()))
    }
}

/// Install a test subscriber once; repeated calls are ignored
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Setup a Synap store pointing to a mock server
#[allow(dead_code)]
pub async fn setup_mock_store() -> (SynapStore, ServerGuard) {
    let server = Server::new_async().await;
    let config = SynapStoreConfig::new(server.url()).with_timeout(Duration::from_secs(5));
    let store = SynapStore::new(config).unwrap();
    (store, server)
}
