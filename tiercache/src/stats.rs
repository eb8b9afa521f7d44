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
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

/// Counters of a cache manager instance.
#[derive(Debug, Default)]
pub(crate) struct Statistics {
    memory_hits: AtomicUsize,
    storage_hits: AtomicUsize,
    misses: AtomicUsize,
    api_calls: AtomicUsize,
}

impl Statistics {
    pub(crate) fn record_memory_hit(&self) {
        self.memory_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_storage_hit(&self) {
        self.storage_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_api_call(&self) {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn reset(&self) {
        self.memory_hits.store(0, Ordering::Relaxed);
        self.storage_hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.api_calls.store(0, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> Counters {
        Counters {
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            storage_hits: self.storage_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            api_calls: self.api_calls.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Counters {
    pub(crate) memory_hits: usize,
    pub(crate) storage_hits: usize,
    pub(crate) misses: usize,
    pub(crate) api_calls: usize,
}

/// Point-in-time statistics of a cache manager.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    /// Reads served by either tier.
    pub hits: usize,
    /// Reads served by the memory tier.
    pub memory_hits: usize,
    /// Reads served by the persistent tier.
    pub storage_hits: usize,
    /// Reads neither tier could serve.
    pub misses: usize,
    /// Loader and batch loader invocations.
    pub api_calls: usize,
    /// `hits / (hits + misses)`, or 0 before any read.
    pub hit_rate: f64,
    /// Bytes (key + record) of this namespace in the persistent tier.
    pub cache_size: usize,
    /// Whether a small write to the persistent tier is currently rejected.
    pub storage_full: bool,
    /// Entry count of the memory tier.
    pub memory_entries: usize,
    /// The default TTL in effect.
    pub default_ttl: Duration,
}

impl CacheStats {
    pub(crate) fn new(
        counters: Counters,
        cache_size: usize,
        storage_full: bool,
        memory_entries: usize,
        default_ttl: Duration,
    ) -> Self {
        let hits = counters.memory_hits + counters.storage_hits;
        let hit_rate = match hits + counters.misses {
            0 => 0.0,
            total => hits as f64 / total as f64,
        };
        Self {
            hits,
            memory_hits: counters.memory_hits,
            storage_hits: counters.storage_hits,
            misses: counters.misses,
            api_calls: counters.api_calls,
            hit_rate,
            cache_size,
            storage_full,
            memory_entries,
            default_ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let statistics = Statistics::default();
        let stats = CacheStats::new(statistics.snapshot(), 0, false, 0, Duration::ZERO);
        assert_eq!(stats.hit_rate, 0.0);

        statistics.record_memory_hit();
        statistics.record_memory_hit();
        statistics.record_storage_hit();
        statistics.record_miss();
        statistics.record_api_call();
        let stats = CacheStats::new(statistics.snapshot(), 0, false, 0, Duration::ZERO);
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.api_calls, 1);
        assert_eq!(stats.hit_rate, 0.75);

        statistics.reset();
        let stats = CacheStats::new(statistics.snapshot(), 0, false, 0, Duration::ZERO);
        assert_eq!(stats.hits + stats.misses + stats.api_calls, 0);
    }
}
