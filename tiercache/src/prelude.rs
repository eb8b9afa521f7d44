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

pub use tiercache_common::{
    clock::{Clock, ManualClock, SystemClock},
    code::{CodeError, CodeResult, EntryCodec, EntryHeader, Value},
    entry::CacheEntry,
    event::{Event, EventListener},
};
pub use tiercache_memory::MemoryTier;
pub use tiercache_storage::{
    Error as StorageError, FsStore, MemoryStore, Notification, NotifyBus, Result as StorageResult, SourceId, Store,
    Subscription,
};

pub use crate::{
    builder::CacheManagerBuilder,
    config::{CacheConfig, Profile},
    error::{Error, Result},
    manager::CacheManager,
    options::GetOptions,
    stats::CacheStats,
};
