//! The real execution path

use crate::error::BoxError;
use crate::query::Query;
use crate::result::RawResult;
use async_trait::async_trait;

/// Executes a read query against the underlying data store.
///
/// This is the source of truth; the cache only ever replays what it returned.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &Query) -> std::result::Result<RawResult, BoxError>;
}

#[async_trait]
impl<E: QueryExecutor + ?Sized> QueryExecutor for std::sync::Arc<E> {
    async fn execute(&self, query: &Query) -> std::result::Result<RawResult, BoxError> {
        (**self).execute(query).await
    }
}
