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

use std::{sync::Arc, time::Duration};

use tiercache_common::{
    clock::{Clock, SystemClock},
    code::Value,
    event::EventListener,
};
use tiercache_memory::MemoryTier;
use tiercache_storage::Store;

use crate::{
    config::{CacheConfig, Profile},
    error::Result,
    manager::CacheManager,
    namespace::Namespace,
    sync::Syncer,
    version::{gate, Gate},
};

/// Cache manager builder.
pub struct CacheManagerBuilder<V> {
    name: String,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    event_listener: Option<Arc<dyn EventListener<Value = V>>>,
}

impl<V> Default for CacheManagerBuilder<V> {
    fn default() -> Self {
        Self::new("tiercache")
    }
}

impl<V> CacheManagerBuilder<V> {
    /// Create a new cache manager builder.
    ///
    /// The name only shows up in logs and [`CacheManager::name`].
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: CacheConfig::default(),
            clock: Arc::new(SystemClock),
            event_listener: None,
        }
    }

    /// Replace the whole configuration.
    ///
    /// Default: [`CacheConfig::default`].
    pub fn with_config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Apply the capacity, TTL and namespace preset of `profile`.
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.config = self.config.with_profile(profile);
        self
    }

    /// Set the max entry count of the memory tier.
    ///
    /// Default: `100`.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.config.max_size = max_size;
        self
    }

    /// Set the TTL of reads that don't supply their own.
    ///
    /// Default: 5 min.
    pub fn with_default_ttl(mut self, default_ttl: Duration) -> Self {
        self.config.default_ttl = default_ttl;
        self
    }

    /// Set the schema version. Persisted entries of any other version are wiped on build.
    ///
    /// Default: `"1"`.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.config.version = version.into();
        self
    }

    /// Set the namespace of the cache inside the persistent tier.
    ///
    /// Caches whose prefixes extend one another (`app_` and `app_live_`) don't touch each other's keys. A prefix
    /// followed by `v` (`app_` and `app_v`) is ambiguous and must not be shared.
    ///
    /// Default: `"tiercache_"`.
    pub fn with_storage_prefix(mut self, storage_prefix: impl Into<String>) -> Self {
        self.config.storage_prefix = storage_prefix.into();
        self
    }

    /// Enable/disable mirroring of writes made by other instances.
    ///
    /// Default: `true`.
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.config.sync = sync;
        self
    }

    /// Set the clock used to stamp and expire entries.
    ///
    /// Default: [`SystemClock`].
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set event listener, notified when entries leave the memory tier.
    ///
    /// Default: No event listener installed.
    pub fn with_event_listener(mut self, event_listener: Arc<dyn EventListener<Value = V>>) -> Self {
        self.event_listener = Some(event_listener);
        self
    }

    /// Build the cache manager on `store`.
    ///
    /// Validates the configuration, passes the version gate, then starts the sync task on the current tokio runtime
    /// if enabled.
    pub async fn build<S>(self, store: S) -> Result<CacheManager<V, S>>
    where
        V: Value,
        S: Store,
    {
        self.config.validate()?;

        let namespace = Namespace::new(&self.config.storage_prefix, &self.config.version);
        if let Gate::Wiped { deleted } = gate(&store, &namespace).await? {
            tracing::debug!("[tiercache]: {} passed version gate, {deleted} keys wiped", self.name);
        }

        let mut memory = MemoryTier::new(self.config.max_size);
        if let Some(event_listener) = self.event_listener {
            memory = memory.with_event_listener(event_listener);
        }
        let memory = Arc::new(memory);

        let sync = self
            .config
            .sync
            .then(|| Syncer::new(namespace.entries(), memory.clone()).spawn(store.subscribe()));

        tracing::info!(
            "[tiercache]: {} opened, prefix: {:?}, version: {:?}, max size: {}, default ttl: {:?}, sync: {}",
            self.name,
            namespace.prefix(),
            namespace.version(),
            self.config.max_size,
            self.config.default_ttl,
            self.config.sync
        );

        Ok(CacheManager::new(
            self.name,
            namespace,
            memory,
            store,
            self.config.default_ttl,
            self.clock,
            sync,
        ))
    }
}
