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

use itertools::Itertools;
use tiercache_common::code::EntryCodec;
use tiercache_storage::Store;

use crate::{error::Result, namespace::Namespace};

/// Share of the namespace reclaimed per quota failure, in tenths.
const RECLAIM_TENTHS: usize = 3;
/// Factor applied to the default TTL per quota failure, in tenths.
const TTL_DECAY_TENTHS: u128 = 7;
/// The default TTL is never lowered below this.
pub(crate) const MIN_DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Frees space in the persistent tier after a write was rejected for lack of quota.
#[derive(Debug)]
pub(crate) struct QuotaGuard<'a, S> {
    store: &'a S,
    namespace: &'a Namespace,
}

impl<'a, S> QuotaGuard<'a, S>
where
    S: Store,
{
    pub(crate) fn new(store: &'a S, namespace: &'a Namespace) -> Self {
        Self { store, namespace }
    }

    /// Delete the oldest 30% of the namespace's entries. Returns the deleted count.
    ///
    /// Records that cannot be decoded count as the oldest. Individual delete failures are skipped.
    pub(crate) async fn reclaim(&self) -> Result<usize> {
        let keys = self.store.keys_with_prefix(self.namespace.prefix()).await?;

        let mut aged = Vec::with_capacity(keys.len());
        for key in keys.into_iter().filter(|key| self.namespace.is_entry(key)) {
            let timestamp = match self.store.get(&key).await {
                Ok(Some(record)) => EntryCodec::decode_header(&record)
                    .map(|header| header.timestamp)
                    .unwrap_or_default(),
                // Deleted meanwhile.
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("[quota guard]: failed to read {key}, treat as oldest, error: {e}");
                    0
                }
            };
            aged.push((timestamp, key));
        }

        let count = aged.len() * RECLAIM_TENTHS / 10;
        let mut deleted = 0;
        for (_, key) in aged.into_iter().sorted().take(count) {
            match self.store.delete(&key).await {
                Ok(_) => deleted += 1,
                Err(e) => tracing::warn!("[quota guard]: failed to delete {key}, skip, error: {e}"),
            }
        }
        Ok(deleted)
    }
}

/// The default TTL to use after a quota failure.
pub(crate) fn decayed_ttl(ttl: Duration) -> Duration {
    let decayed = Duration::from_millis((ttl.as_millis() * TTL_DECAY_TENTHS / 10) as u64);
    decayed.max(MIN_DEFAULT_TTL)
}
