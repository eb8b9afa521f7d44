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

use crate::entry::CacheEntry;

/// Event identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Entry evicted on insertion because the tier is full.
    Evict,
    /// Entry replaced by a newer write of the same key.
    Replace,
    /// Entry removed by invalidation.
    Remove,
    /// Tier cleared.
    Clear,
}

/// Trait for the customized event listener.
pub trait EventListener: Send + Sync + 'static {
    /// Associated value type.
    type Value;

    /// Called when an entry leaves the in-memory tier with the reason.
    ///
    /// `key` is the namespaced key. Called outside of the tier lock.
    #[expect(unused_variables)]
    fn on_leave(&self, reason: Event, key: &str, entry: &CacheEntry<Self::Value>) {}
}
