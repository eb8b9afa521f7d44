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

//! The persistent tier of tiercache.
//!
//! A [`Store`] is a durable string-keyed record store that may be shared by several cache instances. Writes made
//! through one handle are announced to the subscriptions of every other handle.
//!
//! Two backends are provided: [`MemoryStore`], which lives as long as the process, and [`FsStore`], which keeps one
//! file per key in a directory.

mod error;
mod fs;
mod memory;
mod notify;
mod store;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use error::{Error, Result};
pub use fs::FsStore;
pub use memory::MemoryStore;
pub use notify::{Notification, NotifyBus, SourceId, Subscription};
pub use store::Store;
