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

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A cached value together with the metadata needed to judge it.
///
/// The persisted form is produced by [`crate::code::EntryCodec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    /// Write time, epoch millis.
    pub timestamp: u64,
    /// TTL in millis requested by the writer.
    ///
    /// Informational only. Freshness is always judged against the TTL supplied by the reader.
    pub ttl: u64,
    /// Schema version active at write time.
    pub version: String,
    /// Logical key, without namespace.
    pub key: String,
    /// The cached value.
    pub data: V,
}

impl<V> CacheEntry<V> {
    /// Create a new entry written at `timestamp`.
    pub fn new(key: impl Into<String>, data: V, timestamp: u64, ttl: Duration, version: impl Into<String>) -> Self {
        Self {
            timestamp,
            ttl: ttl.as_millis() as u64,
            version: version.into(),
            key: key.into(),
            data,
        }
    }

    /// Age of the entry at `now`. Entries stamped in the future are 0 ms old.
    pub fn age(&self, now: u64) -> Duration {
        Duration::from_millis(now.saturating_sub(self.timestamp))
    }

    /// Whether the entry is fresh for a reader requiring `ttl` at `now`.
    ///
    /// The bound is inclusive: an entry exactly `ttl` old is still fresh.
    pub fn is_fresh(&self, now: u64, ttl: Duration) -> bool {
        self.age(now) <= ttl
    }
}
