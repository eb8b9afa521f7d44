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

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use bytes::Bytes;
use hashbrown::HashMap;
use itertools::Itertools;
use parking_lot::Mutex;

use crate::{
    error::{Error, Result},
    notify::{Notification, NotifyBus, SourceId, Subscription},
    store::Store,
};

const RECORD_EXTENSION: &str = "rec";
const TEMP_EXTENSION: &str = "tmp";

/// Most file systems limit a file name to 255 bytes.
const MAX_FILE_STEM_LEN: usize = 240;

#[derive(Debug, Default)]
struct Index {
    /// key -> record length
    sizes: HashMap<String, usize>,
    used: usize,
}

impl Index {
    fn footprint(&self, key: &str) -> usize {
        self.sizes.get(key).map(|len| key.len() + len).unwrap_or_default()
    }

    fn put(&mut self, key: &str, len: Option<usize>) {
        self.used -= self.footprint(key);
        match len {
            Some(len) => {
                self.used += key.len() + len;
                self.sizes.insert(key.to_string(), len);
            }
            None => {
                self.sizes.remove(key);
            }
        }
    }
}

#[derive(Debug)]
struct Shared {
    dir: PathBuf,
    index: Mutex<Index>,
    capacity: Option<usize>,
    bus: NotifyBus,
}

/// Durable persistent tier backed by a directory, one file per key.
///
/// File names are the hex encoded keys, so keys are limited to 120 bytes. Records are written to a temporary file
/// and renamed into place, so a crash never leaves a torn record behind.
///
/// The key index and the notification bus live in the process. Handles created with [`FsStore::sibling`] see each
/// other's writes immediately, while other processes see them only after reopening the directory.
#[derive(Debug, Clone)]
pub struct FsStore {
    shared: Arc<Shared>,
    source: SourceId,
}

impl FsStore {
    /// Open the store in `dir`, creating the directory if needed.
    ///
    /// Usage is recovered from the records found on disk, and leftovers of interrupted writes are removed.
    pub async fn open(dir: impl AsRef<Path>, capacity: Option<usize>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;

        let mut index = Index::default();
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            match path.extension().and_then(|ext| ext.to_str()) {
                Some(RECORD_EXTENSION) => {}
                Some(TEMP_EXTENSION) => {
                    tracing::debug!("[fs store]: remove leftover {path:?}");
                    if let Err(e) = tokio::fs::remove_file(&path).await {
                        tracing::warn!("[fs store]: failed to remove leftover {path:?}, error: {e}");
                    }
                    continue;
                }
                _ => continue,
            }
            let Some(key) = path.file_stem().and_then(|stem| stem.to_str()).and_then(decode_key) else {
                tracing::warn!("[fs store]: skip record with undecodable name {path:?}");
                continue;
            };
            let len = entry.metadata().await?.len() as usize;
            index.put(&key, Some(len));
        }

        tracing::info!(
            "[fs store]: opened {dir:?}, records: {}, used: {} bytes",
            index.sizes.len(),
            index.used
        );

        let bus = NotifyBus::default();
        let source = bus.register();
        Ok(Self {
            shared: Arc::new(Shared {
                dir,
                index: Mutex::new(index),
                capacity,
                bus,
            }),
            source,
        })
    }

    /// Create another handle on the same directory with its own write identity.
    pub fn sibling(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            source: self.shared.bus.register(),
        }
    }

    /// The backing directory.
    pub fn dir(&self) -> &Path {
        &self.shared.dir
    }

    fn record_path(&self, key: &str) -> Result<PathBuf> {
        let stem = encode_key(key);
        if stem.len() > MAX_FILE_STEM_LEN {
            return Err(Error::InvalidKey(key.to_string()));
        }
        Ok(self.shared.dir.join(format!("{stem}.{RECORD_EXTENSION}")))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.shared
            .dir
            .join(format!("{}.{}.{TEMP_EXTENSION}", encode_key(key), self.source))
    }

    fn publish(&self, key: &str, value: Option<Bytes>) {
        self.shared.bus.publish(Notification {
            key: key.to_string(),
            value,
            source: self.source,
        });
    }
}

impl Store for FsStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let path = self.record_path(key)?;
        match tokio::fs::read(&path).await {
            Ok(buf) => Ok(Some(Bytes::from(buf))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<()> {
        let path = self.record_path(key)?;

        // Reserve the space first so concurrent writers cannot overshoot the capacity together.
        let previous = {
            let mut index = self.shared.index.lock();
            let required = key.len() + value.len();
            if let Some(capacity) = self.shared.capacity {
                let used = index.used - index.footprint(key) + required;
                if used > capacity {
                    return Err(Error::quota_exceeded(required, capacity, index.used));
                }
            }
            let previous = index.sizes.get(key).copied();
            index.put(key, Some(value.len()));
            previous
        };

        let temp = self.temp_path(key);
        let res = async {
            tokio::fs::write(&temp, &value).await?;
            tokio::fs::rename(&temp, &path).await
        }
        .await;
        if let Err(e) = res {
            self.shared.index.lock().put(key, previous);
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }

        self.publish(key, Some(value));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let path = self.record_path(key)?;
        let existed = match tokio::fs::remove_file(&path).await {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        self.shared.index.lock().put(key, None);
        if existed {
            self.publish(key, None);
        }
        Ok(existed)
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let index = self.shared.index.lock();
        let keys = index
            .sizes
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .sorted()
            .collect();
        Ok(keys)
    }

    fn subscribe(&self) -> Subscription {
        self.shared.bus.subscribe(self.source)
    }

    fn usage(&self) -> usize {
        self.shared.index.lock().used
    }

    fn capacity(&self) -> Option<usize> {
        self.shared.capacity
    }
}

fn encode_key(key: &str) -> String {
    hex::encode(key.as_bytes())
}

fn decode_key(stem: &str) -> Option<String> {
    hex::decode(stem).ok().and_then(|buf| String::from_utf8(buf).ok())
}
