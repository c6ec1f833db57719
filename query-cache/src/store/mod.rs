//! Cache store adapters
//!
//! A store holds bytes under `(group, field)` with per-entry expiry. Group
//! keys arrive already encoded (see [`GroupId::store_key`](crate::GroupId::store_key)).

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub mod memory;
pub mod synap;

pub use memory::MemoryStore;
pub use synap::SynapStore;

/// Byte-level storage keyed by `(group, field)`.
///
/// Connectivity failures surface as
/// [`CacheError::StoreUnavailable`](crate::CacheError::StoreUnavailable).
/// No retries happen at this layer.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read a field. A missing or expired entry is `Ok(None)`.
    async fn get(&self, group: &str, field: &str) -> Result<Option<Vec<u8>>>;

    /// Write a field, replacing any previous value, expiring after `ttl`
    async fn set(&self, group: &str, field: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    /// Remove every field under `group`. Unknown groups are a no-op.
    async fn delete(&self, group: &str) -> Result<()>;
}

#[async_trait]
impl<S: CacheStore + ?Sized> CacheStore for Arc<S> {
    async fn get(&self, group: &str, field: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(group, field).await
    }

    async fn set(&self, group: &str, field: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        (**self).set(group, field, value, ttl).await
    }

    async fn delete(&self, group: &str) -> Result<()> {
        (**self).delete(group).await
    }
}
