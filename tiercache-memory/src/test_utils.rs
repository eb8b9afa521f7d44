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

//! Utilities for testing.

use std::marker::PhantomData;

use parking_lot::Mutex;
use tiercache_common::{
    entry::CacheEntry,
    event::{Event, EventListener},
};

/// An event listener that records all leave events.
#[derive(Debug)]
pub struct RecordingListener<V> {
    events: Mutex<Vec<(Event, String)>>,
    _marker: PhantomData<fn() -> V>,
}

impl<V> Default for RecordingListener<V> {
    fn default() -> Self {
        Self {
            events: Mutex::new(vec![]),
            _marker: PhantomData,
        }
    }
}

impl<V> RecordingListener<V> {
    /// Get all recorded `(event, key)` pairs.
    pub fn events(&self) -> Vec<(Event, String)> {
        self.events.lock().clone()
    }

    /// Keys that left the tier for the given reason.
    pub fn keys(&self, reason: Event) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|(event, _)| *event == reason)
            .map(|(_, key)| key.clone())
            .collect()
    }
}

impl<V> EventListener for RecordingListener<V>
where
    V: Send + Sync + 'static,
{
    type Value = V;

    fn on_leave(&self, reason: Event, key: &str, _: &CacheEntry<Self::Value>) {
        self.events.lock().push((reason, key.to_string()));
    }
}
