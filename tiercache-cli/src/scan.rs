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

use tiercache::prelude::{EntryCodec, EntryHeader, Store};

use crate::error::Result;

/// A persisted record as seen by the cli.
#[derive(Debug)]
pub struct Record {
    pub key: String,
    /// key + record bytes
    pub size: usize,
    /// `None` for version markers and corrupted records.
    pub header: Option<EntryHeader>,
}

/// Read every record under `prefix`, in key order.
pub async fn scan<S>(store: &S, prefix: &str) -> Result<Vec<Record>>
where
    S: Store,
{
    let mut records = vec![];
    for key in store.keys_with_prefix(prefix).await? {
        let Some(buf) = store.get(&key).await? else {
            continue;
        };
        let header = match EntryCodec::decode_header(&buf) {
            Ok(header) => Some(header),
            Err(e) => {
                tracing::debug!("[cli]: {key} is not an entry, error: {e}");
                None
            }
        };
        records.push(Record {
            size: key.len() + buf.len(),
            key,
            header,
        });
    }
    Ok(records)
}
