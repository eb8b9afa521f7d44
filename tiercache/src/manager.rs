// Copyright 2026 tiercache Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{
    collections::HashMap,
    fmt::Debug,
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use bytes::Bytes;
use itertools::Itertools;
use parking_lot::Mutex;
use tiercache_common::{
    clock::Clock,
    code::{EntryCodec, Value},
    entry::CacheEntry,
};
use tiercache_memory::MemoryTier;
use tiercache_storage::Store;
use tokio::task::JoinHandle;

use crate::{
    builder::CacheManagerBuilder,
    config::CacheConfig,
    error::{Error, Result},
    namespace::Namespace,
    options::GetOptions,
    quota::{decayed_ttl, QuotaGuard},
    stats::{CacheStats, Statistics},
};

const PROBE: &[u8] = b"probe";

struct Inner<V, S> {
    name: String,
    namespace: Namespace,
    memory: Arc<MemoryTier<V>>,
    store: S,
    /// millis
    default_ttl: AtomicU64,
    clock: Arc<dyn Clock>,
    statistics: Statistics,
    sync: Mutex<Option<JoinHandle<()>>>,
}

impl<V, S> Drop for Inner<V, S> {
    fn drop(&mut self) {
        if let Some(handle) = self.sync.get_mut().take() {
            handle.abort();
        }
    }
}

/// Tiered cache manager: a bounded memory tier in front of a shared persistent tier, in front of a caller supplied
/// loader.
///
/// Entries are namespaced by storage prefix and schema version, and judged fresh against the TTL of each read.
///
/// Cloning is cheap and shares the instance. The background sync task stops when [`CacheManager::close`] is called or
/// the last clone is dropped.
pub struct CacheManager<V, S>
where
    V: Value,
    S: Store,
{
    inner: Arc<Inner<V, S>>,
}

impl<V, S> Debug for CacheManager<V, S>
where
    V: Value,
    S: Store,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("name", &self.inner.name)
            .field("namespace", &self.inner.namespace)
            .field("memory", &self.inner.memory)
            .field("store", &self.inner.store)
            .finish()
    }
}

impl<V, S> Clone for CacheManager<V, S>
where
    V: Value,
    S: Store,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<V, S> CacheManager<V, S>
where
    V: Value,
    S: Store,
{
    /// Open a cache manager with `config` on `store`.
    ///
    /// Shorthand of [`CacheManagerBuilder`] with default name and system clock.
    pub async fn open(config: CacheConfig, store: S) -> Result<Self> {
        CacheManagerBuilder::default().with_config(config).build(store).await
    }

    pub(crate) fn new(
        name: String,
        namespace: Namespace,
        memory: Arc<MemoryTier<V>>,
        store: S,
        default_ttl: Duration,
        clock: Arc<dyn Clock>,
        sync: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                namespace,
                memory,
                store,
                default_ttl: AtomicU64::new(default_ttl.as_millis() as u64),
                clock,
                statistics: Statistics::default(),
                sync: Mutex::new(sync),
            }),
        }
    }

    /// Name of the instance.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Access the memory tier.
    pub fn memory(&self) -> &MemoryTier<V> {
        &self.inner.memory
    }

    /// Access the persistent tier.
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// The key `key` is stored under in both tiers.
    pub fn namespaced_key(&self, key: &str) -> String {
        self.inner.namespace.key(key)
    }

    /// The default TTL in effect. Lowered every time the persistent tier runs out of space.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.inner.default_ttl.load(Ordering::Relaxed))
    }

    /// Get the value of `key`, from the memory tier, then the persistent tier, then `loader`.
    ///
    /// A persisted entry found fresh is promoted into the memory tier. A loaded value is written into both tiers.
    /// Loader failures are returned as [`Error::Loader`] and nothing is written.
    ///
    /// Concurrent misses of the same key each call their own loader.
    pub async fn get_data<F, FU>(&self, key: &str, loader: F, options: GetOptions) -> Result<V>
    where
        F: FnOnce() -> FU,
        FU: Future<Output = anyhow::Result<V>>,
    {
        let ttl = options.ttl.unwrap_or_else(|| self.default_ttl());
        let nkey = self.namespaced_key(key);

        if !options.force_refresh {
            if let Some(data) = self.lookup(key, &nkey, ttl).await {
                return Ok(data);
            }
        }

        self.inner.statistics.record_miss();
        if options.skip_api {
            tracing::debug!("[tiercache]: miss {nkey}, loader skipped");
            return Err(Error::CacheMissSkipped { key: key.to_string() });
        }

        tracing::debug!("[tiercache]: miss {nkey}, call loader");
        self.inner.statistics.record_api_call();
        let data = loader().await.map_err(Error::Loader)?;
        self.populate(key, nkey, data.clone(), ttl).await?;
        Ok(data)
    }

    /// Write `data` into the memory tier only.
    ///
    /// Meant for local changes not yet confirmed by the source. Other instances won't see it until [`Self::set`].
    pub fn set_optimistic(&self, key: &str, data: V, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or_else(|| self.default_ttl());
        let nkey = self.namespaced_key(key);
        let entry = self.entry(key, data, ttl);
        tracing::trace!("[tiercache]: optimistic write {nkey}");
        self.inner.memory.insert(nkey, entry);
    }

    /// Write a confirmed `data` into both tiers without calling any loader.
    pub async fn set(&self, key: &str, data: V) -> Result<()> {
        let nkey = self.namespaced_key(key);
        self.populate(key, nkey, data, self.default_ttl()).await
    }

    /// Get the values of `keys`, calling `batch_loader` once with the keys neither tier could serve.
    ///
    /// Every entry returned by the batch loader is written into both tiers and merged into the result. Keys absent
    /// from both the tiers and the loaded batch are absent from the result.
    pub async fn batch_get<I, K, F, FU>(&self, keys: I, batch_loader: F) -> Result<HashMap<String, V>>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
        F: FnOnce(Vec<String>) -> FU,
        FU: Future<Output = anyhow::Result<HashMap<String, V>>>,
    {
        let ttl = self.default_ttl();
        let mut res = HashMap::new();
        let mut missed = vec![];

        for key in keys.into_iter().map(Into::<String>::into).unique() {
            let nkey = self.namespaced_key(&key);
            match self.lookup(&key, &nkey, ttl).await {
                Some(data) => {
                    res.insert(key, data);
                }
                None => {
                    self.inner.statistics.record_miss();
                    missed.push(key);
                }
            }
        }

        if missed.is_empty() {
            return Ok(res);
        }

        tracing::debug!("[tiercache]: batch miss {} keys, call batch loader", missed.len());
        self.inner.statistics.record_api_call();
        let loaded = batch_loader(missed).await.map_err(Error::Loader)?;
        for (key, data) in loaded {
            let nkey = self.namespaced_key(&key);
            self.populate(&key, nkey, data.clone(), ttl).await?;
            res.insert(key, data);
        }
        Ok(res)
    }

    /// Remove `key` from both tiers.
    pub async fn invalidate(&self, key: &str) -> Result<()> {
        let nkey = self.namespaced_key(key);
        self.inner.memory.remove(&nkey);
        self.inner.store.delete(&nkey).await?;
        Ok(())
    }

    /// Remove from both tiers every entry whose namespaced key contains `pattern`.
    ///
    /// Only entries of this instance's namespace are considered, and the version marker is never removed. Returns
    /// the count of persisted entries deleted.
    pub async fn invalidate_pattern(&self, pattern: &str) -> Result<usize> {
        let namespace = &self.inner.namespace;
        let removed = self
            .inner
            .memory
            .remove_matching(|key| namespace.is_entry(key) && key.contains(pattern));

        let keys = self.inner.store.keys_with_prefix(namespace.prefix()).await?;
        let mut deleted = 0;
        for key in keys
            .into_iter()
            .filter(|key| namespace.is_entry(key) && key.contains(pattern))
        {
            match self.inner.store.delete(&key).await {
                Ok(true) => deleted += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!("[tiercache]: failed to delete {key}, skip, error: {e}"),
            }
        }

        tracing::debug!("[tiercache]: invalidate {pattern:?}, memory: {removed}, storage: {deleted}");
        Ok(deleted)
    }

    /// Remove every entry of this cache from both tiers. The version marker is kept.
    pub async fn clear(&self) -> Result<()> {
        self.inner.memory.clear();
        let namespace = &self.inner.namespace;
        for key in self.inner.store.keys_with_prefix(namespace.prefix()).await? {
            if namespace.is_entry(&key) {
                self.inner.store.delete(&key).await?;
            }
        }
        Ok(())
    }

    /// Snapshot the counters and probe the persistent tier.
    pub async fn stats(&self) -> Result<CacheStats> {
        let namespace = &self.inner.namespace;
        let store = &self.inner.store;

        let mut cache_size = 0;
        for key in store.keys_with_prefix(namespace.prefix()).await? {
            if !namespace.is_entry(&key) {
                continue;
            }
            if let Some(record) = store.get(&key).await? {
                cache_size += key.len() + record.len();
            }
        }

        let storage_full = match store.set(namespace.probe(), Bytes::from_static(PROBE)).await {
            Ok(()) => {
                store.delete(namespace.probe()).await?;
                false
            }
            Err(e) if e.is_quota_exceeded() => true,
            Err(e) => return Err(e.into()),
        };

        Ok(CacheStats::new(
            self.inner.statistics.snapshot(),
            cache_size,
            storage_full,
            self.inner.memory.len(),
            self.default_ttl(),
        ))
    }

    /// Zero the hit, miss and loader counters.
    pub fn reset_stats(&self) {
        self.inner.statistics.reset();
    }

    /// Stop mirroring writes of other instances.
    ///
    /// The tiers stay usable.
    pub async fn close(&self) -> Result<()> {
        let handle = self.inner.sync.lock().take();
        if let Some(handle) = handle {
            handle.abort();
            // Cancellation is the expected outcome.
            let _ = handle.await;
            tracing::debug!("[tiercache]: {} closed", self.inner.name);
        }
        Ok(())
    }

    fn entry(&self, key: &str, data: V, ttl: Duration) -> CacheEntry<V> {
        CacheEntry::new(
            key,
            data,
            self.inner.clock.now_millis(),
            ttl,
            self.inner.namespace.version(),
        )
    }

    /// Serve `key` from either tier if fresh under `ttl`, promoting persisted entries.
    async fn lookup(&self, key: &str, nkey: &str, ttl: Duration) -> Option<V> {
        let now = self.inner.clock.now_millis();

        if let Some(entry) = self.inner.memory.get(nkey) {
            if entry.is_fresh(now, ttl) {
                tracing::trace!("[tiercache]: memory hit {nkey}");
                self.inner.statistics.record_memory_hit();
                return Some(entry.data.clone());
            }
        }

        let record = match self.inner.store.get(nkey).await {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("[tiercache]: failed to read {nkey}, treat as miss, error: {e}");
                return None;
            }
        };

        let entry = match EntryCodec::decode::<V>(&record) {
            Ok(entry) if entry.version == self.inner.namespace.version() && entry.key == key => entry,
            Ok(entry) => {
                tracing::warn!(
                    "[tiercache]: discard {nkey} written for key {:?} of version {:?}",
                    entry.key,
                    entry.version
                );
                self.discard(nkey).await;
                return None;
            }
            Err(e) => {
                tracing::warn!("[tiercache]: discard corrupted {nkey}, error: {e}");
                self.discard(nkey).await;
                return None;
            }
        };

        // Left in place, a more tolerant reader may still accept it.
        if !entry.is_fresh(now, ttl) {
            tracing::trace!("[tiercache]: stale {nkey}");
            return None;
        }

        tracing::trace!("[tiercache]: storage hit {nkey}, promote");
        self.inner.statistics.record_storage_hit();
        let data = entry.data.clone();
        self.inner.memory.insert(nkey, entry);
        Some(data)
    }

    /// Write into both tiers. Persisting is best effort, the memory tier copy serves meanwhile.
    async fn populate(&self, key: &str, nkey: String, data: V, ttl: Duration) -> Result<()> {
        let entry = self.entry(key, data, ttl);
        let record = EntryCodec::encode(&entry)?;
        self.inner.memory.insert(nkey.clone(), entry);

        match self.inner.store.set(&nkey, record).await {
            Ok(()) => {}
            Err(e) if e.is_quota_exceeded() => {
                tracing::warn!("[tiercache]: persistent tier full, {nkey} kept in memory only, error: {e}");
                self.recover_quota().await;
            }
            Err(e) => tracing::warn!("[tiercache]: failed to persist {nkey}, kept in memory only, error: {e}"),
        }
        Ok(())
    }

    async fn recover_quota(&self) {
        match QuotaGuard::new(&self.inner.store, &self.inner.namespace).reclaim().await {
            Ok(deleted) => tracing::info!("[quota guard]: reclaimed {deleted} entries"),
            Err(e) => tracing::warn!("[quota guard]: failed to reclaim entries, error: {e}"),
        }

        let previous = self.default_ttl();
        let ttl = decayed_ttl(previous);
        self.inner.default_ttl.store(ttl.as_millis() as u64, Ordering::Relaxed);
        tracing::info!("[quota guard]: default ttl lowered from {previous:?} to {ttl:?}");
    }

    async fn discard(&self, nkey: &str) {
        if let Err(e) = self.inner.store.delete(nkey).await {
            tracing::warn!("[tiercache]: failed to delete {nkey}, error: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use tiercache_common::clock::ManualClock;
    use tiercache_storage::MemoryStore;

    use super::*;

    const T0: u64 = 1_700_000_000_000;

    async fn never() -> anyhow::Result<String> {
        unreachable!("loader must not be called")
    }

    async fn open(store: MemoryStore, clock: Arc<ManualClock>) -> CacheManager<String, MemoryStore> {
        CacheManagerBuilder::new("test")
            .with_storage_prefix("test_")
            .with_max_size(8)
            .with_clock(clock)
            .build(store)
            .await
            .unwrap()
    }

    #[test_log::test(tokio::test)]
    async fn test_read_path() {
        let clock = Arc::new(ManualClock::new(T0));
        let store = MemoryStore::new();
        let cache = open(store.clone(), clock.clone()).await;

        let v = cache
            .get_data("k", || async { Ok("v".to_string()) }, GetOptions::default())
            .await
            .unwrap();
        assert_eq!(v, "v");
        assert!(store.get("test_v1:k").await.unwrap().is_some());

        // Memory hit.
        let v = cache
            .get_data("k", never, GetOptions::default())
            .await
            .unwrap();
        assert_eq!(v, "v");

        // Storage hit with promotion.
        cache.memory().clear();
        let v = cache
            .get_data("k", never, GetOptions::new().with_skip_api(true))
            .await
            .unwrap();
        assert_eq!(v, "v");
        assert!(cache.memory().contains("test_v1:k"));

        // Forced refresh.
        let v = cache
            .get_data(
                "k",
                || async { Ok("v2".to_string()) },
                GetOptions::new().with_force_refresh(true),
            )
            .await
            .unwrap();
        assert_eq!(v, "v2");

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.memory_hits, 1);
        assert_eq!(stats.storage_hits, 1);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.api_calls, 2);
        assert_eq!(stats.hit_rate, 0.5);
        assert_eq!(stats.memory_entries, 1);
        assert!(!stats.storage_full);
        assert!(stats.cache_size > "test_v1:k".len());

        cache.reset_stats();
        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.hits + stats.misses + stats.api_calls, 0);
        assert_eq!(stats.hit_rate, 0.0);
    }

    #[test_log::test(tokio::test)]
    async fn test_skip_api_miss() {
        let cache = open(MemoryStore::new(), Arc::new(ManualClock::new(T0))).await;
        let e = cache
            .get_data("k", never, GetOptions::new().with_skip_api(true))
            .await
            .unwrap_err();
        assert!(e.is_cache_miss_skipped());
        assert_eq!(cache.stats().await.unwrap().misses, 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_loader_failure_writes_nothing() {
        #[derive(Debug, thiserror::Error)]
        #[error("upstream unavailable")]
        struct Unavailable;

        let store = MemoryStore::new();
        let cache = open(store.clone(), Arc::new(ManualClock::new(T0))).await;

        let e = cache
            .get_data(
                "k",
                || async { Err::<String, _>(anyhow::Error::new(Unavailable)) },
                GetOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(e.downcast::<Unavailable>().is_ok());
        assert!(cache.memory().is_empty());
        assert_eq!(store.keys_with_prefix("test_v1:").await.unwrap(), Vec::<String>::new());
        assert_eq!(cache.stats().await.unwrap().api_calls, 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_corrupted_and_mismatched_records_are_discarded() {
        let store = MemoryStore::new();
        let cache = open(store.clone(), Arc::new(ManualClock::new(T0))).await;
        let skip = GetOptions::new().with_skip_api(true);

        store.set("test_v1:a", Bytes::from_static(b"not a record")).await.unwrap();
        assert!(cache.get_data("a", never, skip).await.is_err());
        assert!(store.get("test_v1:a").await.unwrap().is_none());

        // A record filed under the wrong key.
        let entry = CacheEntry::new("b", "v".to_string(), T0, Duration::from_secs(60), "1");
        store.set("test_v1:c", EntryCodec::encode(&entry).unwrap()).await.unwrap();
        assert!(cache.get_data("c", never, skip).await.is_err());
        assert!(store.get("test_v1:c").await.unwrap().is_none());

        // A record of the wrong value type.
        let entry = CacheEntry::new("d", 42u64, T0, Duration::from_secs(60), "1");
        store.set("test_v1:d", EntryCodec::encode(&entry).unwrap()).await.unwrap();
        assert!(cache.get_data("d", never, skip).await.is_err());
        assert!(store.get("test_v1:d").await.unwrap().is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_stale_record_is_kept() {
        let clock = Arc::new(ManualClock::new(T0));
        let store = MemoryStore::new();
        let cache = open(store.clone(), clock.clone()).await;

        cache.set("k", "v".to_string()).await.unwrap();
        cache.memory().clear();
        clock.advance(Duration::from_secs(10));

        let short = GetOptions::new().with_skip_api(true).with_ttl(Duration::from_secs(5));
        assert!(cache.get_data("k", never, short).await.is_err());
        assert!(store.get("test_v1:k").await.unwrap().is_some());

        let long = GetOptions::new().with_skip_api(true).with_ttl(Duration::from_secs(60));
        let v = cache.get_data("k", never, long).await.unwrap();
        assert_eq!(v, "v");
    }

    #[test_log::test(tokio::test)]
    async fn test_invalidate_and_clear() {
        let store = MemoryStore::new();
        let cache = open(store.clone(), Arc::new(ManualClock::new(T0))).await;
        store.set("unrelated", Bytes::from_static(b"x")).await.unwrap();

        for key in ["a", "b", "c"] {
            cache.set(key, key.to_string()).await.unwrap();
        }

        cache.invalidate("a").await.unwrap();
        assert!(!cache.memory().contains("test_v1:a"));
        assert!(store.get("test_v1:a").await.unwrap().is_none());
        // Invalidating an absent key is fine.
        cache.invalidate("a").await.unwrap();

        cache.clear().await.unwrap();
        assert!(cache.memory().is_empty());
        assert_eq!(store.keys_with_prefix("test_").await.unwrap(), vec!["test___version__"]);
        assert!(store.get("unrelated").await.unwrap().is_some());
    }

    #[test_log::test(tokio::test)]
    async fn test_extended_prefix_is_left_alone() {
        let clock = Arc::new(ManualClock::new(T0));
        let store = MemoryStore::new();
        let cache = open(store.clone(), clock.clone()).await;
        let live: CacheManager<String, _> = CacheManagerBuilder::new("live")
            .with_storage_prefix("test_live_")
            .with_clock(clock)
            .build(store.sibling())
            .await
            .unwrap();

        live.set("k", "live".to_string()).await.unwrap();
        let live_size = live.stats().await.unwrap().cache_size;
        cache.set("k", "v".to_string()).await.unwrap();

        let record = store.get("test_v1:k").await.unwrap().unwrap();
        assert_eq!(cache.stats().await.unwrap().cache_size, "test_v1:k".len() + record.len());
        assert_eq!(cache.invalidate_pattern(":k").await.unwrap(), 1);
        cache.clear().await.unwrap();
        assert!(store.get("test_live_v1:k").await.unwrap().is_some());
        assert_eq!(live.stats().await.unwrap().cache_size, live_size);

        // A version bump of the shorter prefix keeps the other namespace too.
        let bumped: CacheManager<String, _> = CacheManagerBuilder::new("bumped")
            .with_storage_prefix("test_")
            .with_version("2")
            .with_sync(false)
            .build(store.sibling())
            .await
            .unwrap();
        assert_eq!(bumped.namespaced_key("k"), "test_v2:k");
        assert!(store.get("test_live___version__").await.unwrap().is_some());
        assert!(store.get("test_live_v1:k").await.unwrap().is_some());
    }

    #[test_log::test(tokio::test)]
    async fn test_close() {
        let cache = open(MemoryStore::new(), Arc::new(ManualClock::new(T0))).await;
        let clone = cache.clone();
        cache.close().await.unwrap();
        // Closing twice is fine and the tiers stay usable.
        clone.close().await.unwrap();
        clone.set("k", "v".to_string()).await.unwrap();
        assert_eq!(clone.name(), "test");
    }
}
