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

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Preset tuned for a class of data volatility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Rarely changing reference data: large memory tier, long TTL.
    Reference,
    /// Fast changing collaborative data: small memory tier, short TTL.
    Collaborative,
}

/// Cache manager configuration.
///
/// Durations are (de)serialized as whole milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Max entry count of the memory tier.
    pub max_size: usize,
    /// Freshness window used when a read does not supply its own TTL.
    ///
    /// Lowered at runtime when the persistent tier runs out of space.
    #[serde(with = "duration_millis")]
    pub default_ttl: Duration,
    /// Schema version. Persisted entries written under another version are wiped on open.
    pub version: String,
    /// Namespace of this cache inside the shared persistent tier.
    ///
    /// Must not be another cache's prefix followed by `v`, e.g. `app_v` next to `app_`.
    pub storage_prefix: String,
    /// Whether to mirror writes made by other instances into the memory tier.
    pub sync: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 100,
            default_ttl: Duration::from_secs(5 * 60),
            version: "1".to_string(),
            storage_prefix: "tiercache_".to_string(),
            sync: true,
        }
    }
}

impl CacheConfig {
    /// Create the configuration preset for `profile`.
    pub fn from_profile(profile: Profile) -> Self {
        Self::default().with_profile(profile)
    }

    /// Apply the capacity, TTL and namespace of `profile`, keeping version and sync settings.
    pub fn with_profile(self, profile: Profile) -> Self {
        let (max_size, default_ttl, storage_prefix) = match profile {
            Profile::Reference => (500, Duration::from_secs(30 * 60), "ref_cache_"),
            Profile::Collaborative => (200, Duration::from_secs(2 * 60), "live_cache_"),
        };
        Self {
            max_size,
            default_ttl,
            storage_prefix: storage_prefix.to_string(),
            ..self
        }
    }

    /// Check the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(Error::config("max_size must be greater than 0"));
        }
        if self.storage_prefix.is_empty() {
            return Err(Error::config("storage_prefix must not be empty"));
        }
        Ok(())
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
