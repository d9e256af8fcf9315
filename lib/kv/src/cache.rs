//! Read-through cache over a key-value namespace.
//!
//! A [`CacheLayer`] memoizes the result of a miss handler (typically a
//! Discord API call) under a key derived from the lookup identity:
//!
//! 1. derive the key from the identity;
//! 2. unless told to skip, return the stored value if there is one;
//! 3. otherwise run the miss handler;
//! 4. a `None` from the handler is returned without touching the store;
//! 5. anything else is written with the layer's TTL and returned.
//!
//! Nothing is retried. By default concurrent misses for the same key each
//! run the handler; [`CacheLayer::single_flight`] makes followers wait for
//! the first caller instead. Coalescing is per process only.

use futures::future::{BoxFuture, FutureExt, Shared};
use rootcause::Report;
use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::error::CacheError;
use crate::namespace::WrappedKvNamespace;

type KeyFactory<I> = Arc<dyn Fn(&I) -> String + Send + Sync>;
type MissHandler<I, D> =
    Arc<dyn Fn(I) -> BoxFuture<'static, Result<Option<D>, CacheError>> + Send + Sync>;
type Fill<D> = BoxFuture<'static, Result<Option<D>, CacheError>>;
type InFlight<D> = Arc<Mutex<HashMap<String, Shared<Fill<D>>>>>;

/// Per-call options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheOptions {
    /// Skip the store read and always run the miss handler.
    pub skip_cache_pull: bool,
}

impl CacheOptions {
    /// Options that force a refresh.
    #[must_use]
    pub fn refresh() -> Self {
        Self {
            skip_cache_pull: true,
        }
    }
}

/// A read-through cache for values of type `D` looked up by identity `I`.
pub struct CacheLayer<I, D> {
    kv: WrappedKvNamespace,
    key_factory: KeyFactory<I>,
    miss_handler: MissHandler<I, D>,
    ttl: Option<Duration>,
    in_flight: Option<InFlight<D>>,
}

impl<I, D> Clone for CacheLayer<I, D> {
    fn clone(&self) -> Self {
        Self {
            kv: self.kv.clone(),
            key_factory: Arc::clone(&self.key_factory),
            miss_handler: Arc::clone(&self.miss_handler),
            ttl: self.ttl,
            in_flight: self.in_flight.clone(),
        }
    }
}

impl<I, D> std::fmt::Debug for CacheLayer<I, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheLayer")
            .field("ttl", &self.ttl)
            .field("single_flight", &self.in_flight.is_some())
            .finish_non_exhaustive()
    }
}

impl<I, D> CacheLayer<I, D>
where
    I: Send + 'static,
    D: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Creates a cache with no TTL and no single-flight coalescing.
    pub fn new<K, F, Fut>(kv: WrappedKvNamespace, key_factory: K, miss_handler: F) -> Self
    where
        K: Fn(&I) -> String + Send + Sync + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<D>, CacheError>> + Send + 'static,
    {
        Self {
            kv,
            key_factory: Arc::new(key_factory),
            miss_handler: Arc::new(move |identity| miss_handler(identity).boxed()),
            ttl: None,
            in_flight: None,
        }
    }

    /// Sets the TTL applied to values written on a miss.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Enables or disables coalescing of concurrent misses for one key.
    #[must_use]
    pub fn single_flight(mut self, enabled: bool) -> Self {
        self.in_flight = enabled.then(|| Arc::new(Mutex::new(HashMap::new())));
        self
    }

    /// Returns the configured TTL.
    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Looks up `identity`, filling the cache on a miss.
    pub async fn get(&self, identity: I) -> Result<Option<D>, Report<CacheError>> {
        self.get_with(identity, CacheOptions::default()).await
    }

    /// Looks up `identity` with explicit options.
    pub async fn get_with(
        &self,
        identity: I,
        options: CacheOptions,
    ) -> Result<Option<D>, Report<CacheError>> {
        let key = (self.key_factory)(&identity);

        if !options.skip_cache_pull {
            let cached = self
                .kv
                .get::<D>(&key)
                .await
                .map_err(|e| CacheError::Store {
                    key: key.clone(),
                    reason: e.to_string(),
                })?;
            if let Some(value) = cached {
                tracing::debug!(key = %key, "Cache hit");
                return Ok(Some(value));
            }
        }

        tracing::debug!(key = %key, skipped_pull = options.skip_cache_pull, "Cache miss");

        let value = match &self.in_flight {
            None => self.fill(key, identity).await?,
            Some(in_flight) => self.fill_coalesced(in_flight, key, identity).await?,
        };
        Ok(value)
    }

    fn fill(&self, key: String, identity: I) -> Fill<D> {
        let kv = self.kv.clone();
        let miss_handler = Arc::clone(&self.miss_handler);
        let ttl = self.ttl;

        async move {
            let Some(value) = miss_handler(identity).await? else {
                return Ok(None);
            };

            kv.put(&key, &value, ttl)
                .await
                .map_err(|e| CacheError::Store {
                    key: key.clone(),
                    reason: e.to_string(),
                })?;

            Ok(Some(value))
        }
        .boxed()
    }

    async fn fill_coalesced(
        &self,
        in_flight: &InFlight<D>,
        key: String,
        identity: I,
    ) -> Result<Option<D>, CacheError> {
        let shared = {
            let mut pending = in_flight.lock().await;
            match pending.get(&key) {
                Some(existing) => {
                    tracing::debug!(key = %key, "Joining in-flight cache fill");
                    existing.clone()
                }
                None => {
                    let fill = self.fill(key.clone(), identity);
                    let registry = Arc::clone(in_flight);
                    let done_key = key.clone();
                    // Whichever waiter drives the fill to completion clears it.
                    let shared = async move {
                        let result = fill.await;
                        registry.lock().await.remove(&done_key);
                        result
                    }
                    .boxed()
                    .shared();
                    pending.insert(key, shared.clone());
                    shared
                }
            }
        };

        shared.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KvError;
    use crate::memory::MemoryKv;
    use crate::namespace::KvNamespace;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    /// Records every write on top of a `MemoryKv`.
    #[derive(Default)]
    struct RecordingKv {
        inner: MemoryKv,
        puts: StdMutex<Vec<(String, Option<Duration>)>>,
    }

    impl RecordingKv {
        fn puts(&self) -> Vec<(String, Option<Duration>)> {
            self.puts.lock().expect("puts lock").clone()
        }
    }

    #[async_trait]
    impl KvNamespace for RecordingKv {
        async fn get(&self, key: &str) -> Result<Option<String>, Report<KvError>> {
            self.inner.get(key).await
        }

        async fn put(
            &self,
            key: &str,
            value: String,
            ttl: Option<Duration>,
        ) -> Result<(), Report<KvError>> {
            self.puts
                .lock()
                .expect("puts lock")
                .push((key.to_string(), ttl));
            self.inner.put(key, value, ttl).await
        }

        async fn delete(&self, key: &str) -> Result<(), Report<KvError>> {
            self.inner.delete(key).await
        }
    }

    struct FailingKv;

    #[async_trait]
    impl KvNamespace for FailingKv {
        async fn get(&self, _key: &str) -> Result<Option<String>, Report<KvError>> {
            Err(KvError::Unavailable {
                reason: "down".to_string(),
            }
            .into())
        }

        async fn put(
            &self,
            _key: &str,
            _value: String,
            _ttl: Option<Duration>,
        ) -> Result<(), Report<KvError>> {
            Err(KvError::Unavailable {
                reason: "down".to_string(),
            }
            .into())
        }

        async fn delete(&self, _key: &str) -> Result<(), Report<KvError>> {
            Ok(())
        }
    }

    const TTL: Duration = Duration::from_secs(7200);

    fn guild_key(id: &String) -> String {
        format!("guild_{id}")
    }

    /// A cache whose miss handler returns `answer` and counts invocations.
    fn layer(
        kv: Arc<RecordingKv>,
        answer: Option<&'static str>,
    ) -> (CacheLayer<String, String>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let layer = CacheLayer::new(WrappedKvNamespace::new(kv), guild_key, move |id: String| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(answer.map(|a| format!("{a}:{id}")))
            }
        })
        .with_ttl(TTL);
        (layer, calls)
    }

    #[tokio::test]
    async fn hit_does_not_invoke_miss_handler() {
        let kv = Arc::new(RecordingKv::default());
        kv.inner
            .put("guild_1", "\"stored\"".to_string(), None)
            .await
            .expect("seed");
        let (layer, calls) = layer(Arc::clone(&kv), Some("fetched"));

        let value = layer.get("1".to_string()).await.expect("get");

        assert_eq!(value.as_deref(), Some("stored"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(kv.puts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn miss_writes_once_with_ttl_and_returns_value() {
        let kv = Arc::new(RecordingKv::default());
        let (layer, calls) = layer(Arc::clone(&kv), Some("fetched"));

        let value = layer.get("1".to_string()).await.expect("get");

        assert_eq!(value.as_deref(), Some("fetched:1"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(kv.puts(), vec![("guild_1".to_string(), Some(TTL))]);

        // Second lookup is served from the store.
        let again = layer.get("1".to_string()).await.expect("get");
        assert_eq!(again.as_deref(), Some("fetched:1"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_handler_result_is_not_stored() {
        let kv = Arc::new(RecordingKv::default());
        let (layer, calls) = layer(Arc::clone(&kv), None);

        let value = layer.get("1".to_string()).await.expect("get");

        assert!(value.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(kv.puts().is_empty());
        assert!(kv.inner.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn skip_cache_pull_always_invokes_handler() {
        let kv = Arc::new(RecordingKv::default());
        kv.inner
            .put("guild_1", "\"stale\"".to_string(), None)
            .await
            .expect("seed");
        let (layer, calls) = layer(Arc::clone(&kv), Some("fresh"));

        let value = layer
            .get_with("1".to_string(), CacheOptions::refresh())
            .await
            .expect("get");

        assert_eq!(value.as_deref(), Some("fresh:1"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(kv.puts().len(), 1);
    }

    #[tokio::test]
    async fn handler_error_propagates_without_write() {
        let kv = Arc::new(RecordingKv::default());
        let layer: CacheLayer<String, String> = CacheLayer::new(
            WrappedKvNamespace::new(kv.clone()),
            guild_key,
            |_id: String| async { Err(CacheError::fetch("discord unreachable")) },
        );

        assert!(layer.get("1".to_string()).await.is_err());
        assert!(kv.puts().is_empty());
    }

    #[tokio::test]
    async fn store_error_propagates() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let layer: CacheLayer<String, String> = CacheLayer::new(
            WrappedKvNamespace::new(Arc::new(FailingKv)),
            guild_key,
            move |_id: String| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok(Some("value".to_string())) }
            },
        );

        assert!(layer.get("1".to_string()).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_misses_each_fetch_by_default() {
        let kv = Arc::new(RecordingKv::default());
        let (layer, calls) = layer(Arc::clone(&kv), Some("fetched"));

        let lookups = (0..5).map(|_| layer.get("1".to_string()));
        let results = futures::future::join_all(lookups).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(kv.puts().len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn single_flight_coalesces_concurrent_misses() {
        let kv = Arc::new(RecordingKv::default());
        let (layer, calls) = layer(Arc::clone(&kv), Some("fetched"));
        let layer = layer.single_flight(true);

        let lookups = (0..5).map(|_| layer.get("1".to_string()));
        let results = futures::future::join_all(lookups).await;

        for result in results {
            assert_eq!(result.expect("get").as_deref(), Some("fetched:1"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(kv.puts().len(), 1);

        // The in-flight entry is cleared, so a forced refresh fetches again.
        layer
            .get_with("1".to_string(), CacheOptions::refresh())
            .await
            .expect("refresh");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn single_flight_keeps_keys_independent() {
        let kv = Arc::new(RecordingKv::default());
        let (layer, calls) = layer(Arc::clone(&kv), Some("fetched"));
        let layer = layer.single_flight(true);

        let (a, b) = tokio::join!(layer.get("1".to_string()), layer.get("2".to_string()));

        assert_eq!(a.expect("a").as_deref(), Some("fetched:1"));
        assert_eq!(b.expect("b").as_deref(), Some("fetched:2"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
