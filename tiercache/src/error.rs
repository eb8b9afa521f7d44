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

use tiercache_common::code::CodeError;

/// Errors enum for tiercache.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Neither tier could serve the key and the caller asked not to invoke the loader.
    #[error("cache miss for key {key:?} and loader skipped")]
    CacheMissSkipped {
        /// The logical key.
        key: String,
    },
    /// The caller-supplied loader failed. Nothing was written.
    #[error("loader error: {0}")]
    Loader(anyhow::Error),
    /// tiercache persistent tier error.
    #[error("tiercache storage error: {0}")]
    Storage(#[from] tiercache_storage::Error),
    /// Entry coding error.
    #[error("code error: {0}")]
    Code(#[from] CodeError),
    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// Create a config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the error is a cache miss with the loader skipped.
    pub fn is_cache_miss_skipped(&self) -> bool {
        matches!(self, Self::CacheMissSkipped { .. })
    }

    /// Downcast the error returned by the loader to a specific type.
    ///
    /// Any other error, or a loader error of another type, is given back unchanged.
    pub fn downcast<T>(self) -> std::result::Result<T, Self>
    where
        T: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        match self {
            Self::Loader(e) => e.downcast::<T>().map_err(Self::Loader),
            e => Err(e),
        }
    }
}

/// Result type for tiercache.
pub type Result<T> = std::result::Result<T, Error>;
