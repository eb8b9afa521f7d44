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

/// Persistent tier error.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The write would exceed the store capacity.
    #[error("quota exceeded: {required} bytes required, {used}/{capacity} bytes used")]
    QuotaExceeded {
        /// Bytes the rejected write needed.
        required: usize,
        /// Store capacity in bytes.
        capacity: usize,
        /// Bytes in use before the write.
        used: usize,
    },
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid key.
    #[error("invalid key: {0:?}")]
    InvalidKey(String),
}

impl Error {
    /// Create a quota exceeded error.
    pub fn quota_exceeded(required: usize, capacity: usize, used: usize) -> Self {
        Self::QuotaExceeded {
            required,
            capacity,
            used,
        }
    }

    /// Whether the error is a rejected write due to capacity exhaustion.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

/// Persistent tier result.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_exceeded() {
        let e = Error::quota_exceeded(64, 1024, 1000);
        assert!(e.is_quota_exceeded());
        assert_eq!(e.to_string(), "quota exceeded: 64 bytes required, 1000/1024 bytes used");
        assert!(!Error::InvalidKey("k".to_string()).is_quota_exceeded());
    }
}
