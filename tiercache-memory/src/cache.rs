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

use std::{fmt::Debug, sync::Arc};

use hashbrown::HashMap;
use parking_lot::Mutex;
use tiercache_common::{
    entry::CacheEntry,
    event::{Event, EventListener},
};

use crate::eviction::{Order, WriteOrder};

struct Slot<V> {
    entry: Arc<CacheEntry<V>>,
    order: Order,
}

struct Inner<V> {
    map: HashMap<String, Slot<V>>,
    order: WriteOrder,
}

type Departures<V> = Vec<(Event, String, Arc<CacheEntry<V>>)>;

/// In-memory tier bounded by entry count.
///
/// All operations are synchronous and atomic with respect to each other.
pub struct MemoryTier<V> {
    capacity: usize,
    inner: Mutex<Inner<V>>,
    event_listener: Option<Arc<dyn EventListener<Value = V>>>,
}

impl<V> Debug for MemoryTier<V>
where
    V: 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTier")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}

impl<V> MemoryTier<V>
where
    V: 'static,
{
    /// Create an in-memory tier holding at most `capacity` entries.
    ///
    /// `capacity` must be greater than 0.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "memory tier capacity must be greater than 0");
        Self {
            capacity,
            inner: Mutex::new(Inner {
                map: HashMap::with_capacity(capacity),
                order: WriteOrder::default(),
            }),
            event_listener: None,
        }
    }

    /// Install an event listener notified whenever an entry leaves the tier.
    pub fn with_event_listener(mut self, event_listener: Arc<dyn EventListener<Value = V>>) -> Self {
        self.event_listener = Some(event_listener);
        self
    }

    /// Max entry count.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current entry count.
    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    /// Whether the tier holds no entry.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the tier holds an entry for `key`, fresh or not.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().map.contains_key(key)
    }

    /// Get the entry of `key`.
    ///
    /// Freshness is left to the caller and the lookup does not affect eviction order.
    pub fn get(&self, key: &str) -> Option<Arc<CacheEntry<V>>> {
        self.inner.lock().map.get(key).map(|slot| slot.entry.clone())
    }

    /// Insert or fully replace the entry of `key`.
    ///
    /// If the tier is full and `key` is new, the entry with the oldest write timestamp is evicted first and
    /// returned. Replacing an existing key never evicts.
    pub fn insert(&self, key: impl Into<String>, entry: CacheEntry<V>) -> Option<Arc<CacheEntry<V>>> {
        let (_, evicted) = self.insert_with(key.into(), entry, |_| true);
        evicted
    }

    /// Insert the entry of `key` unless the resident one was written later.
    ///
    /// The check and the write are atomic. Equal timestamps are replaced. Returns whether `entry` was inserted.
    pub fn insert_if_newer(&self, key: impl Into<String>, entry: CacheEntry<V>) -> bool {
        let timestamp = entry.timestamp;
        let (inserted, _) = self.insert_with(key.into(), entry, |resident| resident.timestamp <= timestamp);
        inserted
    }

    fn insert_with<P>(&self, key: String, entry: CacheEntry<V>, admit: P) -> (bool, Option<Arc<CacheEntry<V>>>)
    where
        P: FnOnce(&CacheEntry<V>) -> bool,
    {
        let entry = Arc::new(entry);
        let mut departures: Departures<V> = vec![];

        {
            let mut guard = self.inner.lock();
            let Inner { map, order } = &mut *guard;

            if let Some(resident) = map.get(&key) {
                if !admit(resident.entry.as_ref()) {
                    tracing::trace!(key = %key, "[memory tier]: keep newer resident");
                    return (false, None);
                }
            }

            if !map.contains_key(&key) && map.len() >= self.capacity {
                if let Some(victim) = order.pop() {
                    if let Some(slot) = map.remove(&victim) {
                        tracing::trace!(key = %victim, timestamp = slot.entry.timestamp, "[memory tier]: evict");
                        departures.push((Event::Evict, victim, slot.entry));
                    }
                }
            }

            let position = order.push(entry.timestamp, key.clone());
            if let Some(old) = map.insert(
                key.clone(),
                Slot {
                    entry,
                    order: position,
                },
            ) {
                order.remove(old.order);
                departures.push((Event::Replace, key, old.entry));
            }
        }

        let evicted = departures
            .iter()
            .find(|(event, _, _)| *event == Event::Evict)
            .map(|(_, _, entry)| entry.clone());
        self.notify(departures);
        (true, evicted)
    }

    /// Remove the entry of `key`.
    pub fn remove(&self, key: &str) -> Option<Arc<CacheEntry<V>>> {
        let removed = {
            let mut guard = self.inner.lock();
            let Inner { map, order } = &mut *guard;
            map.remove(key).map(|slot| {
                order.remove(slot.order);
                slot.entry
            })
        };
        if let Some(entry) = &removed {
            self.notify(vec![(Event::Remove, key.to_string(), entry.clone())]);
        }
        removed
    }

    /// Remove every entry whose key matches `predicate`. Returns the removed count.
    pub fn remove_matching<P>(&self, predicate: P) -> usize
    where
        P: Fn(&str) -> bool,
    {
        let departures: Departures<V> = {
            let mut guard = self.inner.lock();
            let Inner { map, order } = &mut *guard;
            let departures = map
                .extract_if(|key, _| predicate(key.as_str()))
                .map(|(key, slot)| {
                    order.remove(slot.order);
                    (Event::Remove, key, slot.entry)
                })
                .collect();
            departures
        };
        let removed = departures.len();
        self.notify(departures);
        removed
    }

    /// Remove all entries.
    pub fn clear(&self) {
        let departures: Departures<V> = {
            let mut guard = self.inner.lock();
            guard.order.clear();
            let departures = guard
                .map
                .drain()
                .map(|(key, slot)| (Event::Clear, key, slot.entry))
                .collect();
            departures
        };
        self.notify(departures);
    }

    /// Keys currently held, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().map.keys().cloned().collect()
    }

    fn notify(&self, departures: Departures<V>) {
        if let Some(listener) = &self.event_listener {
            for (event, key, entry) in departures {
                listener.on_leave(event, &key, &entry);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use itertools::Itertools;

    use super::*;
    use crate::test_utils::RecordingListener;

    fn entry(key: &str, timestamp: u64) -> CacheEntry<u64> {
        CacheEntry::new(key, timestamp, timestamp, Duration::from_secs(60), "1")
    }

    #[test_log::test]
    fn test_insert_get_remove() {
        let tier = MemoryTier::new(4);
        assert!(tier.insert("a", entry("a", 1)).is_none());
        assert_eq!(tier.get("a").unwrap().data, 1);
        assert!(tier.contains("a"));

        assert_eq!(tier.remove("a").unwrap().data, 1);
        assert!(tier.get("a").is_none());
        assert!(tier.is_empty());
    }

    #[test_log::test]
    fn test_evict_oldest_write_not_oldest_access() {
        let tier = MemoryTier::new(3);
        tier.insert("b", entry("b", 20));
        tier.insert("a", entry("a", 10));
        tier.insert("c", entry("c", 30));

        // Reading "a" does not protect it.
        for _ in 0..8 {
            tier.get("a");
        }

        let evicted = tier.insert("d", entry("d", 40)).unwrap();
        assert_eq!(evicted.key, "a");
        assert_eq!(tier.keys().into_iter().sorted().collect_vec(), vec!["b", "c", "d"]);

        let evicted = tier.insert("e", entry("e", 5)).unwrap();
        assert_eq!(evicted.key, "b");
        // "e" carries the oldest timestamp and goes next.
        let evicted = tier.insert("f", entry("f", 50)).unwrap();
        assert_eq!(evicted.key, "e");
    }

    #[test_log::test]
    fn test_size_never_exceeds_capacity() {
        let tier = MemoryTier::new(8);
        for i in 0..100u64 {
            // Timestamps are deliberately unordered.
            let ts = (i * 37) % 101;
            let key = format!("k{i}");
            let before = tier.keys().into_iter().map(|k| (tier.get(&k).unwrap().timestamp, k)).min();
            let evicted = tier.insert(key.clone(), entry(&key, ts));
            assert!(tier.len() <= 8);
            if let Some(evicted) = evicted {
                assert_eq!(Some(evicted.timestamp), before.map(|(ts, _)| ts));
            }
        }
        assert_eq!(tier.len(), 8);
    }

    #[test_log::test]
    fn test_replace_never_evicts() {
        let tier = MemoryTier::new(2);
        tier.insert("a", entry("a", 1));
        tier.insert("b", entry("b", 2));
        assert!(tier.insert("a", entry("a", 3)).is_none());
        assert_eq!(tier.len(), 2);

        // "a" was rewritten at 3, so "b" is now the oldest write.
        assert_eq!(tier.insert("c", entry("c", 4)).unwrap().key, "b");
    }

    #[test_log::test]
    fn test_insert_if_newer() {
        let listener = Arc::new(RecordingListener::default());
        let tier = MemoryTier::new(2).with_event_listener(listener.clone());

        assert!(tier.insert_if_newer("a", entry("a", 100)));
        assert!(!tier.insert_if_newer("a", entry("a", 90)));
        assert_eq!(tier.get("a").unwrap().timestamp, 100);
        assert!(listener.events().is_empty());

        assert!(tier.insert_if_newer("a", entry("a", 100)));
        assert!(tier.insert_if_newer("a", entry("a", 110)));
        assert_eq!(tier.get("a").unwrap().timestamp, 110);

        // A rejected write leaves eviction order untouched.
        tier.insert("b", entry("b", 120));
        assert!(!tier.insert_if_newer("b", entry("b", 1)));
        assert_eq!(tier.insert("c", entry("c", 130)).unwrap().key, "a");
    }

    #[test_log::test]
    fn test_remove_matching() {
        let tier = MemoryTier::new(8);
        for key in ["list-items:42", "list-items:43", "media:42"] {
            tier.insert(key, entry(key, 1));
        }
        assert_eq!(tier.remove_matching(|key| key.contains("list-items")), 2);
        assert_eq!(tier.keys(), vec!["media:42"]);
    }

    #[test_log::test]
    fn test_leave_events() {
        let listener = Arc::new(RecordingListener::default());
        let tier = MemoryTier::new(2).with_event_listener(listener.clone());

        tier.insert("a", entry("a", 1));
        tier.insert("b", entry("b", 2));
        tier.insert("b", entry("b", 3));
        tier.insert("c", entry("c", 4));
        tier.remove("b");
        tier.clear();

        assert_eq!(
            listener.events(),
            vec![
                (Event::Replace, "b".to_string()),
                (Event::Evict, "a".to_string()),
                (Event::Remove, "b".to_string()),
                (Event::Clear, "c".to_string()),
            ]
        );
        assert!(tier.is_empty());
    }
}
