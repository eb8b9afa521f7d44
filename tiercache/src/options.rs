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

/// Options of a single [`crate::CacheManager::get_data`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetOptions {
    /// Freshness window of this read. Falls back to the current default TTL.
    pub ttl: Option<Duration>,
    /// Bypass both tiers and call the loader.
    pub force_refresh: bool,
    /// Never call the loader; fail with [`crate::Error::CacheMissSkipped`] on a full miss.
    pub skip_api: bool,
}

impl GetOptions {
    /// Default options: default TTL, tiers first, loader on miss.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the freshness window of this read.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Bypass both tiers and call the loader.
    pub fn with_force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }

    /// Serve from the tiers only.
    pub fn with_skip_api(mut self, skip_api: bool) -> Self {
        self.skip_api = skip_api;
        self
    }
}
