//! # Query Cache
//!
//! Read-through cache for query results, backed by Synap hashes.
//!
//! - 🔑 **Deterministic keys**: the field key is the canonical JSON of a query's
//!   filter and collection
//! - 🗂️ **Group invalidation**: entries are filed under a caller-chosen group
//!   and purged together
//! - ⏱️ **TTL**: entries expire after a fixed window (10 s by default)
//! - 🧩 **Shape-preserving**: single-record and multi-record results are tagged
//!   and replayed as the same shape
//!
//! Caching is opt-in per query. Nothing is read from or written to the store
//! unless the query was marked with [`Query::cache`] or [`Query::cache_in`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use query_cache::{
//!     BoxError, MemoryStore, Query, QueryCache, QueryExecutor, RawResult, SerdeModel,
//! };
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Blog {
//!     title: String,
//! }
//!
//! struct Db;
//!
//! #[async_trait::async_trait]
//! impl QueryExecutor for Db {
//!     async fn execute(&self, _query: &Query) -> Result<RawResult, BoxError> {
//!         Ok(RawResult::from_value(serde_json::json!({"_id": 42, "title": "X"}))?)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = QueryCache::new(Db, MemoryStore::new());
//!     let query = Query::new("blogs").filter("_id", 42).cache_in("blog-42");
//!
//!     let blog = cache.execute(&query, &SerdeModel::<Blog>::new()).await?;
//!     println!("{}", blog.into_one().map(|b| b.title).unwrap_or_default());
//!
//!     // After a write touching blog 42
//!     cache.invalidate("blog-42").await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod group;
pub mod interceptor;
pub mod key;
pub mod model;
pub mod query;
pub mod result;
pub mod stats;
pub mod store;

pub use config::{CacheConfig, Settings, SynapStoreConfig};
pub use error::{BoxError, CacheError, Result};
pub use executor::QueryExecutor;
pub use group::GroupId;
pub use interceptor::QueryCache;
pub use key::FieldKey;
pub use model::{Rehydrate, SerdeModel};
pub use query::{CacheDirective, Query};
pub use result::{Fetched, RawResult, Record};
pub use stats::{CacheStats, CacheStatsSnapshot};
pub use store::{CacheStore, MemoryStore, SynapStore};
