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

use std::{collections::BTreeMap, sync::Arc};

use bytes::Bytes;
use parking_lot::Mutex;

use crate::{
    error::{Error, Result},
    notify::{Notification, NotifyBus, SourceId, Subscription},
    store::Store,
};

#[derive(Debug, Default)]
struct Records {
    map: BTreeMap<String, Bytes>,
    used: usize,
}

#[derive(Debug)]
struct Shared {
    records: Mutex<Records>,
    capacity: Option<usize>,
    bus: NotifyBus,
}

/// In-process persistent tier.
///
/// Survives cache instances but not the process. Useful as the shared store of several cache instances in one
/// process, and in tests.
///
/// Cloning returns the same handle. Use [`MemoryStore::sibling`] to model another instance sharing the store.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    shared: Arc<Shared>,
    source: SourceId,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an unbounded store.
    pub fn new() -> Self {
        Self::open(None)
    }

    /// Create a store holding at most `capacity` bytes of keys and records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::open(Some(capacity))
    }

    fn open(capacity: Option<usize>) -> Self {
        let bus = NotifyBus::default();
        let source = bus.register();
        Self {
            shared: Arc::new(Shared {
                records: Mutex::new(Records::default()),
                capacity,
                bus,
            }),
            source,
        }
    }

    /// Create another handle on the same records with its own write identity.
    pub fn sibling(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            source: self.shared.bus.register(),
        }
    }

    /// Record count.
    pub fn len(&self) -> usize {
        self.shared.records.lock().map.len()
    }

    /// Whether the store holds no record.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn publish(&self, key: &str, value: Option<Bytes>) {
        self.shared.bus.publish(Notification {
            key: key.to_string(),
            value,
            source: self.source,
        });
    }
}

impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        Ok(self.shared.records.lock().map.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<()> {
        {
            let mut records = self.shared.records.lock();
            let required = key.len() + value.len();
            let replaced = records.map.get(key).map(|old| key.len() + old.len()).unwrap_or_default();
            let used = records.used - replaced + required;
            if let Some(capacity) = self.shared.capacity {
                if used > capacity {
                    return Err(Error::quota_exceeded(required, capacity, records.used));
                }
            }
            records.map.insert(key.to_string(), value.clone());
            records.used = used;
        }
        self.publish(key, Some(value));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let existed = {
            let mut records = self.shared.records.lock();
            match records.map.remove(key) {
                Some(old) => {
                    records.used -= key.len() + old.len();
                    true
                }
                None => false,
            }
        };
        if existed {
            self.publish(key, None);
        }
        Ok(existed)
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let records = self.shared.records.lock();
        let keys = records
            .map
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();
        Ok(keys)
    }

    fn subscribe(&self) -> Subscription {
        self.shared.bus.subscribe(self.source)
    }

    fn usage(&self) -> usize {
        self.shared.records.lock().used
    }

    fn capacity(&self) -> Option<usize> {
        self.shared.capacity
    }
}
