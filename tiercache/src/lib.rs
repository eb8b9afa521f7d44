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

//! tiercache - tiered cache manager for Rust.
//!
//! A [`CacheManager`] sits between application code and a slow data source. Reads go through a bounded memory tier,
//! then a shared persistent tier ([`tiercache_storage::Store`]), and only then call the supplied loader. Entries are
//! judged fresh against the TTL of each read, namespaced by storage prefix and schema version, and mirrored between
//! instances sharing one persistent tier.
//!
//! ```no_run
//! use tiercache::prelude::*;
//!
//! # async fn run() -> tiercache::Result<()> {
//! let cache: CacheManager<String, _> = CacheManagerBuilder::new("catalog")
//!     .with_profile(Profile::Reference)
//!     .build(MemoryStore::new())
//!     .await?;
//!
//! let title = cache
//!     .get_data("media:42", || async { Ok("Solaris".to_string()) }, GetOptions::default())
//!     .await?;
//! assert_eq!(title, "Solaris");
//! # Ok(())
//! # }
//! ```

mod builder;
mod config;
mod error;
mod manager;
mod namespace;
mod options;
mod quota;
mod stats;
mod sync;
mod version;

/// The prelude of tiercache, re-exporting the commonly used types of all crates.
pub mod prelude;

pub use crate::{
    builder::CacheManagerBuilder,
    config::{CacheConfig, Profile},
    error::{Error, Result},
    manager::CacheManager,
    options::GetOptions,
    stats::CacheStats,
};
