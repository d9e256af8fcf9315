//! In-process key-value backend.
//!
//! Used for local development and tests. Expiry is checked lazily: an
//! expired entry is dropped the next time it is read.

use async_trait::async_trait;
use rootcause::Report;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::KvError;
use crate::namespace::KvNamespace;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// A [`KvNamespace`] held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryKv {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KvNamespace for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, Report<KvError>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
            tracing::trace!(key, "Evicted expired entry");
        }
        Ok(None)
    }

    async fn put(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<(), Report<KvError>> {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.entries
            .write()
            .await
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Report<KvError>> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete() {
        let kv = MemoryKv::new();
        kv.put("a", "1".to_string(), None).await.expect("put");
        assert_eq!(kv.get("a").await.expect("get"), Some("1".to_string()));

        kv.delete("a").await.expect("delete");
        assert_eq!(kv.get("a").await.expect("get"), None);
        assert!(kv.is_empty().await);
    }

    #[tokio::test]
    async fn put_replaces_value() {
        let kv = MemoryKv::new();
        kv.put("a", "1".to_string(), None).await.expect("put");
        kv.put("a", "2".to_string(), None).await.expect("put");
        assert_eq!(kv.get("a").await.expect("get"), Some("2".to_string()));
        assert_eq!(kv.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let kv = MemoryKv::new();
        kv.put("a", "1".to_string(), Some(Duration::from_secs(300)))
            .await
            .expect("put");

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(kv.get("a").await.expect("get"), Some("1".to_string()));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(kv.get("a").await.expect("get"), None);
        assert!(kv.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_without_ttl_do_not_expire() {
        let kv = MemoryKv::new();
        kv.put("a", "1".to_string(), None).await.expect("put");

        tokio::time::advance(Duration::from_secs(60 * 60 * 24 * 365)).await;
        assert_eq!(kv.get("a").await.expect("get"), Some("1".to_string()));
    }
}
