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

use std::fmt::Debug;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use twox_hash::XxHash64;

use crate::entry::CacheEntry;

/// Value that can be held by every tier.
///
/// Auto-implemented for all clonable serde types.
pub trait Value: Send + Sync + 'static + Clone + Debug + Serialize + DeserializeOwned {}

impl<T> Value for T where T: Send + Sync + 'static + Clone + Debug + Serialize + DeserializeOwned {}

/// Record coding error.
#[derive(Debug, thiserror::Error)]
pub enum CodeError {
    /// The record is shorter than its checksum header.
    #[error("record truncated: {len} bytes")]
    Truncated {
        /// Record length.
        len: usize,
    },
    /// The payload does not match its checksum.
    #[error("checksum mismatch, checksum: {checksum}, expected: {expected}")]
    ChecksumMismatch {
        /// Checksum of the payload read.
        checksum: u64,
        /// Checksum stored in the record header.
        expected: u64,
    },
    /// The payload failed to encode or decode.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Record coding result.
pub type CodeResult<T> = std::result::Result<T, CodeError>;

const CHECKSUM_LEN: usize = std::mem::size_of::<u64>();

#[derive(Debug)]
struct Checksummer;

impl Checksummer {
    fn checksum64(buf: &[u8]) -> u64 {
        XxHash64::oneshot(0, buf)
    }
}

/// Metadata of a persisted entry, decodable without knowing the value type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntryHeader {
    /// Write time, epoch millis.
    pub timestamp: u64,
    /// TTL in millis requested by the writer.
    pub ttl: u64,
    /// Schema version active at write time.
    pub version: String,
    /// Logical key, without namespace.
    pub key: String,
}

/// Encodes [`CacheEntry`]s into the persisted record format and back.
///
/// Record layout:
///
/// ```plain
/// | checksum (u64, LE) | json(CacheEntry) |
/// ```
///
/// The checksum is the xxh64 of the payload, so a torn or foreign record is detected before the payload is parsed.
/// The payload is self-describing, so values built on `deserialize_any` (e.g. `serde_json::Value`, untagged enums)
/// survive the trip.
#[derive(Debug)]
pub struct EntryCodec;

impl EntryCodec {
    /// Encode an entry into a record.
    pub fn encode<V>(entry: &CacheEntry<V>) -> CodeResult<Bytes>
    where
        V: Serialize,
    {
        let payload = serde_json::to_vec(entry)?;
        let mut buf = BytesMut::with_capacity(CHECKSUM_LEN + payload.len());
        buf.put_u64_le(Checksummer::checksum64(&payload));
        buf.put_slice(&payload);
        Ok(buf.freeze())
    }

    /// Decode a record into an entry.
    pub fn decode<V>(record: &[u8]) -> CodeResult<CacheEntry<V>>
    where
        V: DeserializeOwned,
    {
        let payload = Self::verify(record)?;
        Ok(serde_json::from_slice(payload)?)
    }

    /// Decode only the metadata of a record.
    pub fn decode_header(record: &[u8]) -> CodeResult<EntryHeader> {
        let payload = Self::verify(record)?;
        // Unknown fields are ignored, which skips the value.
        Ok(serde_json::from_slice(payload)?)
    }

    fn verify(record: &[u8]) -> CodeResult<&[u8]> {
        if record.len() < CHECKSUM_LEN {
            return Err(CodeError::Truncated { len: record.len() });
        }
        let (mut head, payload) = record.split_at(CHECKSUM_LEN);
        let expected = head.get_u64_le();
        let checksum = Checksummer::checksum64(payload);
        if checksum != expected {
            return Err(CodeError::ChecksumMismatch { checksum, expected });
        }
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Media {
        id: u64,
        title: String,
        tags: Vec<String>,
    }

    fn media() -> CacheEntry<Media> {
        CacheEntry::new(
            "media:42",
            Media {
                id: 42,
                title: "Solaris".to_string(),
                tags: vec!["film".to_string(), "1972".to_string()],
            },
            1_700_000_000_000,
            Duration::from_secs(300),
            "3",
        )
    }

    #[test]
    fn test_decode_encoded_entry() {
        let entry = media();
        let record = EntryCodec::encode(&entry).unwrap();
        let decoded: CacheEntry<Media> = EntryCodec::decode(&record).unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn test_decode_header_only() {
        let entry = media();
        let record = EntryCodec::encode(&entry).unwrap();
        let header = EntryCodec::decode_header(&record).unwrap();
        assert_eq!(
            header,
            EntryHeader {
                timestamp: 1_700_000_000_000,
                ttl: 300_000,
                version: "3".to_string(),
                key: "media:42".to_string(),
            }
        );
    }

    #[test]
    fn test_corrupted_record() {
        let record = EntryCodec::encode(&media()).unwrap();

        let mut flipped = record.to_vec();
        let last = flipped.len() - 1;
        flipped[last] ^= 0xff;
        assert!(matches!(
            EntryCodec::decode::<Media>(&flipped),
            Err(CodeError::ChecksumMismatch { .. })
        ));

        assert!(matches!(
            EntryCodec::decode_header(&record[..4]),
            Err(CodeError::Truncated { len: 4 })
        ));
    }

    #[test]
    fn test_value_type_mismatch() {
        let record = EntryCodec::encode(&CacheEntry::new("k", 7u8, 0, Duration::ZERO, "1")).unwrap();
        assert!(matches!(
            EntryCodec::decode::<Media>(&record),
            Err(CodeError::Serde(_))
        ));
    }

    #[test]
    fn test_self_describing_value() {
        fn is_value<V: Value>() {}
        is_value::<serde_json::Value>();

        let data = serde_json::json!({ "list": 42, "items": [1, 2, 3], "owner": null });
        let entry = CacheEntry::new("list-items:42", data.clone(), 0, Duration::ZERO, "1");
        let record = EntryCodec::encode(&entry).unwrap();
        let decoded: CacheEntry<serde_json::Value> = EntryCodec::decode(&record).unwrap();
        assert_eq!(decoded.data, data);
    }
}
