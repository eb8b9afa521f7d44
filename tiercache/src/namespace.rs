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

/// Key layout of one cache inside the shared persistent tier.
///
/// ```plain
/// {prefix}v{version}:{key}   entries
/// {prefix}__version__        version marker
/// {prefix}__probe__          storage full probe
/// ```
///
/// Keys under the prefix that fit none of these shapes belong to someone else, e.g. a cache whose prefix extends this
/// one (`app_` and `app_live_`). They are never touched. A prefix must still not be a prefix of another cache's
/// entries prefix (`app_` and `app_v`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Namespace {
    prefix: String,
    version: String,
    entries: String,
    marker: String,
    probe: String,
}

impl Namespace {
    pub(crate) fn new(prefix: &str, version: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            version: version.to_string(),
            entries: format!("{prefix}v{version}:"),
            marker: format!("{prefix}__version__"),
            probe: format!("{prefix}__probe__"),
        }
    }

    pub(crate) fn key(&self, key: &str) -> String {
        format!("{}{key}", self.entries)
    }

    /// Prefix of every key written by this cache, entries of other versions included.
    pub(crate) fn prefix(&self) -> &str {
        &self.prefix
    }

    pub(crate) fn version(&self) -> &str {
        &self.version
    }

    /// Prefix of the entries of the current version.
    pub(crate) fn entries(&self) -> &str {
        &self.entries
    }

    pub(crate) fn marker(&self) -> &str {
        &self.marker
    }

    pub(crate) fn probe(&self) -> &str {
        &self.probe
    }

    /// Whether `key` is bookkeeping rather than an entry.
    pub(crate) fn is_reserved(&self, key: &str) -> bool {
        key == self.marker || key == self.probe
    }

    /// Whether `key` is an entry of this cache, of any version.
    pub(crate) fn is_entry(&self, key: &str) -> bool {
        key.strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix('v'))
            .is_some_and(|rest| rest.contains(':'))
    }

    /// Whether `key` was written by this cache, entries of any version and bookkeeping included.
    pub(crate) fn owns(&self, key: &str) -> bool {
        self.is_reserved(key) || self.is_entry(key)
    }
}
