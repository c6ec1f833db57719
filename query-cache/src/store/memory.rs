//! In-process hash store
//!
//! Same layout as a Synap hash, but every field carries its own deadline:
//!
//! ```text
//! MemoryStore
//!   ├─ 16 shards (RwLock<HashMap<group, HashMap<field, Entry>>>)
//!   └─ TTL applies per field; expired fields read as absent
//! ```
//!
//! Deadlines use `tokio::time::Instant`, so paused-clock tests can drive expiry.

use super::CacheStore;
use crate::error::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

const SHARD_COUNT: usize = 16;

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

type Shard = RwLock<HashMap<String, HashMap<String, Entry>>>;

/// Sharded in-memory store with per-field TTL
#[derive(Clone)]
pub struct MemoryStore {
    shards: Arc<Vec<Shard>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let shards = (0..SHARD_COUNT)
            .map(|_| RwLock::new(HashMap::new()))
            .collect();
        Self {
            shards: Arc::new(shards),
        }
    }

    fn shard_for(&self, group: &str) -> &Shard {
        let mut hasher = DefaultHasher::new();
        group.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % SHARD_COUNT]
    }

    /// HGET with lazy expiry
    pub fn hget(&self, group: &str, field: &str) -> Option<Vec<u8>> {
        let now = Instant::now();
        let shard = self.shard_for(group);

        {
            let data = shard.read();
            match data.get(group).and_then(|fields| fields.get(field)) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        let mut data = shard.write();
        if let Some(fields) = data.get_mut(group) {
            if fields.get(field).is_some_and(|e| e.is_expired(now)) {
                fields.remove(field);
                trace!("expired group={} field={}", group, field);
            }
            if fields.is_empty() {
                data.remove(group);
            }
        }
        None
    }

    /// HSET with a per-field deadline. Returns true if the field was created.
    pub fn hset(&self, group: &str, field: &str, value: Vec<u8>, ttl: Duration) -> bool {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        let mut data = self.shard_for(group).write();
        let created = data
            .entry(group.to_string())
            .or_default()
            .insert(field.to_string(), entry)
            .is_none();

        trace!("HSET group={} field={} created={}", group, field, created);
        created
    }

    /// Drop a whole group. Returns true if it existed.
    pub fn del(&self, group: &str) -> bool {
        self.shard_for(group).write().remove(group).is_some()
    }

    /// Number of live fields under `group`
    pub fn group_len(&self, group: &str) -> usize {
        let now = Instant::now();
        self.shard_for(group)
            .read()
            .get(group)
            .map(|fields| fields.values().filter(|e| !e.is_expired(now)).count())
            .unwrap_or(0)
    }

    /// Total live fields across all groups
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.shards
            .iter()
            .map(|shard| {
                shard
                    .read()
                    .values()
                    .flat_map(|fields| fields.values())
                    .filter(|e| !e.is_expired(now))
                    .count()
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every expired field, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut purged = 0;
        for shard in self.shards.iter() {
            let mut data = shard.write();
            data.retain(|_, fields| {
                let before = fields.len();
                fields.retain(|_, e| !e.is_expired(now));
                purged += before - fields.len();
                !fields.is_empty()
            });
        }
        purged
    }

    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.write().clear();
        }
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, group: &str, field: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.hget(group, field))
    }

    async fn set(&self, group: &str, field: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        self.hset(group, field, value, ttl);
        Ok(())
    }

    async fn delete(&self, group: &str) -> Result<()> {
        self.del(group);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(10);

    #[tokio::test]
    async fn test_set_get() {
        let store = MemoryStore::new();
        store.set("g", "f", b"v".to_vec(), TTL).await.unwrap();
        assert_eq!(store.get("g", "f").await.unwrap(), Some(b"v".to_vec()));
        assert_eq!(store.get("g", "other").await.unwrap(), None);
        assert_eq!(store.get("other", "f").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let store = MemoryStore::new();
        assert!(store.hset("g", "f", b"1".to_vec(), TTL));
        assert!(!store.hset("g", "f", b"2".to_vec(), TTL));
        assert_eq!(store.hget("g", "f"), Some(b"2".to_vec()));
        assert_eq!(store.group_len("g"), 1);
    }

    #[tokio::test]
    async fn test_delete_group() {
        let store = MemoryStore::new();
        store.hset("g", "f1", b"1".to_vec(), TTL);
        store.hset("g", "f2", b"2".to_vec(), TTL);
        store.hset("g2", "f1", b"3".to_vec(), TTL);

        store.delete("g").await.unwrap();
        assert_eq!(store.hget("g", "f1"), None);
        assert_eq!(store.hget("g", "f2"), None);
        assert_eq!(store.hget("g2", "f1"), Some(b"3".to_vec()));
    }

    #[tokio::test]
    async fn test_delete_missing_group_is_noop() {
        let store = MemoryStore::new();
        assert!(store.delete("nothing").await.is_ok());
        assert!(!store.del("nothing"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_field_expires() {
        let store = MemoryStore::new();
        store.hset("g", "short", b"1".to_vec(), Duration::from_secs(1));
        store.hset("g", "long", b"2".to_vec(), Duration::from_secs(60));

        tokio::time::advance(Duration::from_millis(999)).await;
        assert_eq!(store.hget("g", "short"), Some(b"1".to_vec()));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(store.hget("g", "short"), None);
        assert_eq!(store.hget("g", "long"), Some(b"2".to_vec()));
        assert_eq!(store.group_len("g"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let store = MemoryStore::new();
        store.hset("a", "f", b"1".to_vec(), Duration::from_secs(1));
        store.hset("b", "f", b"2".to_vec(), Duration::from_secs(1));
        store.hset("b", "g", b"3".to_vec(), Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.purge_expired(), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.purge_expired(), 0);
    }

    #[tokio::test]
    async fn test_clear() {
        let store = MemoryStore::new();
        store.hset("a", "f", b"1".to_vec(), TTL);
        store.hset("b", "f", b"1".to_vec(), TTL);
        assert_eq!(store.len(), 2);
        store.clear();
        assert!(store.is_empty());
    }
}
