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

//! Test utils for the persistent tier.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use bytes::Bytes;
use parking_lot::Mutex;

use crate::{
    error::{Error, Result},
    notify::Subscription,
    store::Store,
};

/// A recorded store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// A successful write.
    Set(String),
    /// A delete, whether or not the key existed.
    Delete(String),
    /// A write rejected by the recorder.
    Rejected(String),
}

#[derive(Debug, Default)]
struct Recorder {
    records: Mutex<Vec<Record>>,
    fail_writes: AtomicBool,
}

/// A [`Store`] wrapper that records writes and deletes and can reject writes on demand.
///
/// Clones share the recording.
#[derive(Debug, Clone)]
pub struct RecordingStore<S> {
    inner: S,
    recorder: Arc<Recorder>,
}

impl<S> RecordingStore<S>
where
    S: Store,
{
    /// Wrap `inner`.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            recorder: Arc::default(),
        }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Make every following write fail with [`Error::QuotaExceeded`], or stop doing so.
    pub fn fail_writes(&self, fail: bool) {
        self.recorder.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// All records so far.
    pub fn dump(&self) -> Vec<Record> {
        self.recorder.records.lock().clone()
    }

    /// Keys deleted so far, in order.
    pub fn deleted_keys(&self) -> Vec<String> {
        self.dump()
            .into_iter()
            .filter_map(|record| match record {
                Record::Delete(key) => Some(key),
                _ => None,
            })
            .collect()
    }

    /// Keys written so far, in order.
    pub fn written_keys(&self) -> Vec<String> {
        self.dump()
            .into_iter()
            .filter_map(|record| match record {
                Record::Set(key) => Some(key),
                _ => None,
            })
            .collect()
    }

    /// Forget all records.
    pub fn reset(&self) {
        self.recorder.records.lock().clear();
    }

    fn record(&self, record: Record) {
        self.recorder.records.lock().push(record);
    }
}

impl<S> Store for RecordingStore<S>
where
    S: Store,
{
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<()> {
        if self.recorder.fail_writes.load(Ordering::Relaxed) {
            self.record(Record::Rejected(key.to_string()));
            return Err(Error::quota_exceeded(
                key.len() + value.len(),
                self.inner.usage(),
                self.inner.usage(),
            ));
        }
        self.inner.set(key, value).await?;
        self.record(Record::Set(key.to_string()));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.record(Record::Delete(key.to_string()));
        self.inner.delete(key).await
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        self.inner.keys_with_prefix(prefix).await
    }

    fn subscribe(&self) -> Subscription {
        self.inner.subscribe()
    }

    fn usage(&self) -> usize {
        self.inner.usage()
    }

    fn capacity(&self) -> Option<usize> {
        self.inner.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[test_log::test(tokio::test)]
    async fn test_recording_store() {
        let store = RecordingStore::new(MemoryStore::new());
        store.set("a", Bytes::from_static(b"1")).await.unwrap();
        store.fail_writes(true);
        assert!(store.set("b", Bytes::from_static(b"2")).await.unwrap_err().is_quota_exceeded());
        store.fail_writes(false);
        store.delete("a").await.unwrap();

        assert_eq!(
            store.dump(),
            vec![
                Record::Set("a".to_string()),
                Record::Rejected("b".to_string()),
                Record::Delete("a".to_string()),
            ]
        );
        assert_eq!(store.deleted_keys(), vec!["a"]);
        assert_eq!(store.written_keys(), vec!["a"]);
        assert!(store.inner().is_empty());
    }
}
