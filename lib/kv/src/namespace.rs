//! Key-value namespace abstraction.
//!
//! Backends store opaque strings with an optional TTL; expiry is entirely
//! the backend's business. [`WrappedKvNamespace`] layers JSON encoding on
//! top so callers work with typed values.

use async_trait::async_trait;
use rootcause::Report;
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use std::time::Duration;

use crate::error::KvError;

/// A namespace in a key-value store.
///
/// Treated as eventually consistent and last-write-wins.
#[async_trait]
pub trait KvNamespace: Send + Sync {
    /// Reads a raw value. Expired or missing keys yield `None`.
    async fn get(&self, key: &str) -> Result<Option<String>, Report<KvError>>;

    /// Writes a raw value, replacing any existing one.
    async fn put(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<(), Report<KvError>>;

    /// Removes a key. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), Report<KvError>>;
}

/// Typed JSON view over a [`KvNamespace`].
#[derive(Clone)]
pub struct WrappedKvNamespace {
    inner: Arc<dyn KvNamespace>,
}

impl WrappedKvNamespace {
    /// Wraps a backend.
    #[must_use]
    pub fn new(inner: Arc<dyn KvNamespace>) -> Self {
        Self { inner }
    }

    /// Reads and decodes a value.
    ///
    /// A value that exists but does not decode as `T` is an error rather
    /// than a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, Report<KvError>> {
        let Some(raw) = self.inner.get(key).await? else {
            return Ok(None);
        };

        let value = serde_json::from_str(&raw).map_err(|e| KvError::Serialization {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Some(value))
    }

    /// Encodes and writes a value.
    pub async fn put<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), Report<KvError>> {
        let raw = serde_json::to_string(value).map_err(|e| KvError::Serialization {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        self.inner.put(key, raw, ttl).await
    }

    /// Removes a key.
    pub async fn delete(&self, key: &str) -> Result<(), Report<KvError>> {
        self.inner.delete(key).await
    }
}

impl std::fmt::Debug for WrappedKvNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WrappedKvNamespace").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryKv;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Guild {
        id: String,
        name: String,
    }

    fn wrapped() -> (Arc<MemoryKv>, WrappedKvNamespace) {
        let backend = Arc::new(MemoryKv::new());
        let wrapped = WrappedKvNamespace::new(backend.clone());
        (backend, wrapped)
    }

    #[tokio::test]
    async fn typed_put_then_get() {
        let (_, kv) = wrapped();
        let guild = Guild {
            id: "1".to_string(),
            name: "Roleypoly".to_string(),
        };

        kv.put("guild_1", &guild, None).await.expect("put");
        let read: Option<Guild> = kv.get("guild_1").await.expect("get");
        assert_eq!(read, Some(guild));
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let (_, kv) = wrapped();
        let read: Option<Guild> = kv.get("nope").await.expect("get");
        assert!(read.is_none());
    }

    #[tokio::test]
    async fn undecodable_value_is_error() {
        let (backend, kv) = wrapped();
        backend
            .put("guild_1", "not json".to_string(), None)
            .await
            .expect("raw put");

        let read = kv.get::<Guild>("guild_1").await;
        assert!(read.is_err());
    }

    #[tokio::test]
    async fn delete_removes_value() {
        let (_, kv) = wrapped();
        kv.put("k", &1u32, None).await.expect("put");
        kv.delete("k").await.expect("delete");
        assert_eq!(kv.get::<u32>("k").await.expect("get"), None);
    }
}
