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

use std::{fmt::Debug, future::Future};

use bytes::Bytes;

use crate::{error::Result, notify::Subscription};

/// The persistent tier: a durable string-keyed record store, possibly shared by several cache instances.
///
/// Every handle of a store performs writes under its own identity, so that [`Store::subscribe`] only yields writes
/// made by other handles.
///
/// No multi-key atomicity is provided.
pub trait Store: Send + Sync + 'static + Clone + Debug {
    /// Get the record of `key`.
    #[must_use]
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Bytes>>> + Send;

    /// Store the record of `key`, replacing any previous one.
    ///
    /// Fails with [`crate::Error::QuotaExceeded`] if the store cannot hold the record.
    #[must_use]
    fn set(&self, key: &str, value: Bytes) -> impl Future<Output = Result<()>> + Send;

    /// Delete the record of `key`. Returns whether a record existed.
    #[must_use]
    fn delete(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;

    /// List every key starting with `prefix`, in lexicographic order.
    #[must_use]
    fn keys_with_prefix(&self, prefix: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Subscribe to writes performed by other handles of this store.
    fn subscribe(&self) -> Subscription;

    /// Bytes in use (key + record).
    fn usage(&self) -> usize;

    /// Capacity in bytes, or `None` if unbounded.
    fn capacity(&self) -> Option<usize>;
}
