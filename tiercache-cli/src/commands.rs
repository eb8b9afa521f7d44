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

use std::{collections::BTreeMap, io::Write, time::Duration};

use bytesize::ByteSize;
use tiercache::prelude::{Clock, Store, SystemClock};

use crate::{
    error::{Error, Result},
    scan::scan,
};

fn age(now: u64, timestamp: u64) -> humantime::FormattedDuration {
    // Whole seconds read better than millis in a listing.
    let secs = now.saturating_sub(timestamp) / 1000;
    humantime::format_duration(Duration::from_secs(secs))
}

/// List every record under `prefix` with its size, version and age.
pub async fn inspect<S>(store: &S, prefix: &str, now: u64, out: &mut impl Write) -> Result<()>
where
    S: Store,
{
    for record in scan(store, prefix).await? {
        let size = ByteSize::b(record.size as u64);
        match record.header {
            Some(header) => writeln!(
                out,
                "{}\t{size}\tv{}\t{}",
                record.key,
                header.version,
                age(now, header.timestamp)
            )?,
            None => writeln!(out, "{}\t{size}\t-\t-", record.key)?,
        }
    }
    Ok(())
}

/// Summarize the records under `prefix`.
pub async fn stats<S>(store: &S, prefix: &str, now: u64, out: &mut impl Write) -> Result<()>
where
    S: Store,
{
    let records = scan(store, prefix).await?;

    let total: usize = records.iter().map(|record| record.size).sum();
    let mut versions = BTreeMap::<&str, usize>::new();
    let mut others = 0;
    for record in &records {
        match &record.header {
            Some(header) => *versions.entry(&header.version).or_default() += 1,
            None => others += 1,
        }
    }

    writeln!(out, "records: {}", records.len())?;
    writeln!(out, "size: {}", ByteSize::b(total as u64))?;
    for (version, count) in versions {
        writeln!(out, "entries of v{version}: {count}")?;
    }
    writeln!(out, "other records: {others}")?;

    let timestamps = records
        .iter()
        .filter_map(|record| record.header.as_ref().map(|header| header.timestamp));
    if let Some(oldest) = timestamps.clone().min() {
        writeln!(out, "oldest entry: {}", age(now, oldest))?;
    }
    if let Some(newest) = timestamps.max() {
        writeln!(out, "newest entry: {}", age(now, newest))?;
    }

    if let Some(capacity) = store.capacity() {
        writeln!(out, "store usage: {} / {}", ByteSize::b(store.usage() as u64), ByteSize::b(capacity as u64))?;
    } else {
        writeln!(out, "store usage: {}", ByteSize::b(store.usage() as u64))?;
    }
    Ok(())
}

/// Delete every record under `prefix`. Returns the deleted count.
pub async fn purge<S>(store: &S, prefix: &str, out: &mut impl Write) -> Result<usize>
where
    S: Store,
{
    if prefix.is_empty() {
        return Err(Error::EmptyPrefix);
    }
    let mut deleted = 0;
    for key in store.keys_with_prefix(prefix).await? {
        if store.delete(&key).await? {
            deleted += 1;
        }
    }
    writeln!(out, "{deleted} records deleted under {prefix:?}")?;
    Ok(deleted)
}

/// Current time for age reports.
pub fn now() -> u64 {
    SystemClock.now_millis()
}
