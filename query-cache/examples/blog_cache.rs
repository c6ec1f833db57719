//! Blog read path with per-post cache groups
//!
//! Runs against the in-memory store by default. Set `SYNAP_URL` to use a
//! running Synap server instead.

use async_trait::async_trait;
use query_cache::{
    BoxError, CacheStore, MemoryStore, Query, QueryCache, QueryExecutor, RawResult, SerdeModel,
    SynapStore, SynapStoreConfig,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

#[derive(Debug, Deserialize)]
struct Blog {
    #[serde(rename = "_id")]
    id: u64,
    title: String,
}

#[derive(Default)]
struct BlogDb {
    queries: AtomicUsize,
}

#[async_trait]
impl QueryExecutor for BlogDb {
    async fn execute(&self, query: &Query) -> Result<RawResult, BoxError> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        let id = query
            .filter_ref()
            .get("_id")
            .and_then(|v| v.as_u64())
            .ok_or("only lookups by _id are supported")?;
        Ok(RawResult::from_value(
            json!({"_id": id, "title": format!("Post {}", id)}),
        )?)
    }
}

async fn run<S: CacheStore>(store: S) -> Result<(), Box<dyn std::error::Error>> {
    let db = Arc::new(BlogDb::default());
    let cache = QueryCache::new(db.clone(), store);
    let model = SerdeModel::<Blog>::new();
    let query = Query::new("blogs").filter("_id", 42).cache_in("blog-42");

    for _ in 0..2 {
        if let Some(blog) = cache.execute(&query, &model).await?.into_one() {
            info!("blog {} {:?}", blog.id, blog.title);
        }
    }
    info!("real queries so far: {}", db.queries.load(Ordering::Relaxed));

    cache.invalidate("blog-42").await?;
    cache.execute(&query, &model).await?;
    info!("real queries after invalidation: {}", db.queries.load(Ordering::Relaxed));
    info!("stats: {:?}", cache.stats());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,query_cache=debug")),
        )
        .init();

    match std::env::var("SYNAP_URL") {
        Ok(url) => run(SynapStore::new(SynapStoreConfig::new(url))?).await,
        Err(_) => run(MemoryStore::new()).await,
    }
}
