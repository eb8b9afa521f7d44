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

use std::sync::Arc;

use tiercache_common::code::{EntryCodec, Value};
use tiercache_memory::MemoryTier;
use tiercache_storage::{Notification, Subscription};
use tokio::task::JoinHandle;

/// Mirrors writes made by other instances into the memory tier.
///
/// Only keys of the current namespace version are considered. Mirrored entries are inserted as they are, freshness
/// is judged when they are read. Notifications may arrive after a later local write, so an entry is only mirrored
/// over a resident one written no later than it.
pub(crate) struct Syncer<V> {
    entries: String,
    memory: Arc<MemoryTier<V>>,
}

impl<V> Syncer<V>
where
    V: Value,
{
    pub(crate) fn new(entries: impl Into<String>, memory: Arc<MemoryTier<V>>) -> Self {
        Self {
            entries: entries.into(),
            memory,
        }
    }

    /// Run until the subscription closes. The returned handle must be aborted to stop earlier.
    pub(crate) fn spawn(self, mut subscription: Subscription) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(notification) = subscription.recv().await {
                self.apply(notification);
            }
            tracing::debug!("[sync]: subscription closed");
        })
    }

    fn apply(&self, notification: Notification) {
        let Notification { key, value, .. } = notification;
        if !key.starts_with(&self.entries) {
            return;
        }
        match value {
            Some(record) => match EntryCodec::decode::<V>(&record) {
                Ok(entry) => {
                    let timestamp = entry.timestamp;
                    if self.memory.insert_if_newer(key.as_str(), entry) {
                        tracing::trace!("[sync]: mirror {key}");
                    } else {
                        tracing::debug!("[sync]: skip {key} written at {timestamp}, resident entry is newer");
                    }
                }
                Err(e) => tracing::debug!("[sync]: ignore undecodable record of {key}, error: {e}"),
            },
            None => {
                tracing::trace!("[sync]: drop {key}");
                self.memory.remove(&key);
            }
        }
    }
}
