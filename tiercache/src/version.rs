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

use bytes::Bytes;
use tiercache_storage::Store;

use crate::{error::Result, namespace::Namespace};

/// Outcome of [`gate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Gate {
    /// The persisted namespace already matches the current version.
    Current,
    /// The namespace was written by another version (or never) and has been wiped.
    Wiped {
        /// Deleted key count.
        deleted: usize,
    },
}

/// Make sure the persisted namespace only holds entries of the current version.
///
/// Compares the version marker with the current version. On mismatch, every key the namespace owns is deleted and the
/// marker is rewritten. A failed marker write is logged only, the next open will wipe again.
pub(crate) async fn gate<S>(store: &S, namespace: &Namespace) -> Result<Gate>
where
    S: Store,
{
    let marker = store.get(namespace.marker()).await?;
    if marker.as_deref() == Some(namespace.version().as_bytes()) {
        return Ok(Gate::Current);
    }

    let previous = marker.map(|m| String::from_utf8_lossy(&m).into_owned());
    let keys = store.keys_with_prefix(namespace.prefix()).await?;
    let mut deleted = 0;
    for key in keys.into_iter().filter(|key| namespace.owns(key)) {
        match store.delete(&key).await {
            Ok(true) => deleted += 1,
            Ok(false) => {}
            Err(e) => tracing::warn!("[version gate]: failed to delete {key}, skip, error: {e}"),
        }
    }
    tracing::info!(
        "[version gate]: version changed from {previous:?} to {:?}, {deleted} keys wiped under {:?}",
        namespace.version(),
        namespace.prefix()
    );

    if let Err(e) = store
        .set(namespace.marker(), Bytes::from(namespace.version().to_string()))
        .await
    {
        tracing::warn!("[version gate]: failed to write version marker, error: {e}");
    }

    Ok(Gate::Wiped { deleted })
}

#[cfg(test)]
mod tests {
    use tiercache_storage::{test_utils::RecordingStore, MemoryStore};

    use super::*;

    #[test_log::test(tokio::test)]
    async fn test_gate() {
        let store = MemoryStore::new();
        let v1 = Namespace::new("app_", "1");

        assert_eq!(gate(&store, &v1).await.unwrap(), Gate::Wiped { deleted: 0 });
        assert_eq!(store.get(v1.marker()).await.unwrap().unwrap(), Bytes::from_static(b"1"));

        store.set(&v1.key("a"), Bytes::from_static(b"a")).await.unwrap();
        store.set("apq", Bytes::from_static(b"untouched")).await.unwrap();
        store.set("app_live_v1:a", Bytes::from_static(b"untouched")).await.unwrap();
        store.set("app_live___version__", Bytes::from_static(b"1")).await.unwrap();
        assert_eq!(gate(&store, &v1).await.unwrap(), Gate::Current);
        assert!(store.get(&v1.key("a")).await.unwrap().is_some());

        let v2 = Namespace::new("app_", "2");
        // The old marker is deleted with everything else, then rewritten.
        assert_eq!(gate(&store, &v2).await.unwrap(), Gate::Wiped { deleted: 2 });
        assert_eq!(
            store.keys_with_prefix("app_").await.unwrap(),
            vec![v2.marker(), "app_live___version__", "app_live_v1:a"]
        );
        assert_eq!(store.get(v2.marker()).await.unwrap().unwrap(), Bytes::from_static(b"2"));
        assert!(store.get("apq").await.unwrap().is_some());
    }

    #[test_log::test(tokio::test)]
    async fn test_marker_write_failure_is_not_fatal() {
        let store = RecordingStore::new(MemoryStore::new());
        store.fail_writes(true);
        let ns = Namespace::new("app_", "1");
        assert_eq!(gate(&store, &ns).await.unwrap(), Gate::Wiped { deleted: 0 });
        assert!(store.get(ns.marker()).await.unwrap().is_none());
    }
}
