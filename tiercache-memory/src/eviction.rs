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

use std::collections::BTreeMap;

/// Position of an entry in the write order: `(write timestamp, insertion sequence)`.
///
/// The sequence breaks timestamp ties in insertion order.
pub type Order = (u64, u64);

/// Oldest-write eviction order.
///
/// Entries are ranked by their write timestamp only. Accesses are not tracked, so re-reading an old entry does not
/// protect it.
///
/// NOTE: This is not LRU. If access-ordered eviction turns out to be wanted, this is the piece to replace.
#[derive(Debug, Default)]
pub struct WriteOrder {
    index: BTreeMap<Order, String>,
    seq: u64,
}

impl WriteOrder {
    pub fn push(&mut self, timestamp: u64, key: String) -> Order {
        let order = (timestamp, self.seq);
        self.seq += 1;
        self.index.insert(order, key);
        order
    }

    pub fn remove(&mut self, order: Order) {
        self.index.remove(&order);
    }

    /// Pop the key with the smallest write timestamp.
    pub fn pop(&mut self) -> Option<String> {
        self.index.pop_first().map(|(_, key)| key)
    }

    pub fn clear(&mut self) {
        self.index.clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn test_pop_oldest_write() {
        let mut order = WriteOrder::default();
        order.push(30, "c".to_string());
        let b = order.push(20, "b".to_string());
        order.push(10, "a".to_string());
        order.push(10, "a2".to_string());

        order.remove(b);
        assert_eq!(order.len(), 3);

        assert_eq!(order.pop().as_deref(), Some("a"));
        assert_eq!(order.pop().as_deref(), Some("a2"));
        assert_eq!(order.pop().as_deref(), Some("c"));
        assert_eq!(order.pop(), None);
    }
}
