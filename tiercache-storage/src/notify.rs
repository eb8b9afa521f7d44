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

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use tokio::sync::broadcast::{self, error::RecvError};

const CHANNEL_CAPACITY: usize = 1024;

/// Identifies the store handle that performed a write.
pub type SourceId = u64;

/// A write observed on the persistent tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// The written key.
    pub key: String,
    /// The new record, or `None` if the key was deleted.
    pub value: Option<Bytes>,
    /// The handle that performed the write.
    pub source: SourceId,
}

/// Fan-out channel for write notifications, shared by all handles of one store.
#[derive(Debug)]
pub struct NotifyBus {
    tx: broadcast::Sender<Notification>,
    sources: AtomicU64,
}

impl Default for NotifyBus {
    fn default() -> Self {
        Self::with_capacity(CHANNEL_CAPACITY)
    }
}

impl NotifyBus {
    /// Create a bus buffering at most `capacity` notifications per slow subscriber.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            sources: AtomicU64::new(0),
        }
    }

    /// Allocate a new handle identity.
    pub fn register(&self) -> SourceId {
        self.sources.fetch_add(1, Ordering::Relaxed)
    }

    /// Publish a notification. It's ok if there are no subscribers.
    pub fn publish(&self, notification: Notification) {
        let _ = self.tx.send(notification);
    }

    /// Subscribe on behalf of `source`. Writes made by `source` itself are filtered out.
    pub fn subscribe(&self, source: SourceId) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
            source,
        }
    }
}

/// Stream of external write notifications.
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<Notification>,
    source: SourceId,
}

impl Subscription {
    /// Receive the next notification written by another handle.
    ///
    /// Returns `None` once the store is gone. Notifications lost to lagging are skipped with a warning.
    pub async fn recv(&mut self) -> Option<Notification> {
        loop {
            match self.rx.recv().await {
                Ok(notification) if notification.source == self.source => continue,
                Ok(notification) => return Some(notification),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("[notify]: subscriber lagged, {skipped} notifications skipped");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
