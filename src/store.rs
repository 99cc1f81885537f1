//! Flat key/value store with lazy expiry.
//!
//! Owned exclusively by the executor task; there is no interior locking.
//! Expired entries are removed when a read touches them, which is the only
//! expiry mechanism in the server.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;

use crate::stream::StreamIndex;

/// The kinds of data a key can hold.
///
/// `Integer` exists so INCR can keep a native counter instead of
/// re-serializing a bulk string on every increment; it still reports as
/// `"string"` to TYPE and stringifies on GET.
#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    String(Bytes),
    Integer(i64),
    List(VecDeque<Bytes>),
    Stream(StreamIndex),
}

impl DataType {
    /// The kind name reported by the TYPE command.
    pub fn kind_name(&self) -> &'static str {
        match self {
            DataType::String(_) | DataType::Integer(_) => "string",
            DataType::List(_) => "array",
            DataType::Stream(_) => "stream",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub data: DataType,
    pub expires_at: Option<Instant>,
}

impl Entry {
    pub fn new(data: DataType) -> Self {
        Entry {
            data,
            expires_at: None,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(deadline) if deadline < now)
    }
}

#[derive(Debug, Default)]
pub struct Store {
    entries: HashMap<Bytes, Entry>,
}

impl Store {
    pub fn new() -> Self {
        Store::default()
    }

    /// Returns the live entry for `key`, removing it first if its deadline
    /// has passed.
    pub fn get(&mut self, key: &[u8]) -> Option<&Entry> {
        self.drop_if_expired(key);
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut Entry> {
        self.drop_if_expired(key);
        self.entries.get_mut(key)
    }

    /// Unconditional overwrite. A time-to-live, when present, is converted
    /// to an absolute deadline at insertion time.
    pub fn set(&mut self, key: Bytes, data: DataType, ttl: Option<Duration>) {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.entries.insert(key, Entry { data, expires_at });
    }

    /// Returns the live entry for `key`, inserting `default()` if the key
    /// is absent or expired.
    pub fn get_or_insert_with(
        &mut self,
        key: Bytes,
        default: impl FnOnce() -> DataType,
    ) -> &mut Entry {
        self.drop_if_expired(&key);
        self.entries
            .entry(key)
            .or_insert_with(|| Entry::new(default()))
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<Entry> {
        self.entries.remove(key)
    }

    /// Snapshot of the currently live keys. Expired entries encountered on
    /// the way are dropped, like any other read.
    pub fn live_keys(&mut self) -> Vec<Bytes> {
        let now = Instant::now();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn drop_if_expired(&mut self, key: &[u8]) {
        let now = Instant::now();
        if self
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_expired(now))
        {
            self.entries.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bulk(data: &str) -> Bytes {
        Bytes::copy_from_slice(data.as_bytes())
    }

    #[test]
    fn test_set_and_get() {
        let mut store = Store::new();
        store.set(bulk("k"), DataType::String(bulk("v")), None);

        let entry = store.get(b"k").expect("entry should exist");
        assert_eq!(entry.data, DataType::String(bulk("v")));
        assert_eq!(entry.expires_at, None);

        assert!(store.get(b"missing").is_none());
    }

    #[test]
    fn test_set_overwrites_unconditionally() {
        let mut store = Store::new();
        store.set(bulk("k"), DataType::String(bulk("old")), None);
        store.set(bulk("k"), DataType::Integer(3), None);

        let entry = store.get(b"k").expect("entry should exist");
        assert_eq!(entry.data, DataType::Integer(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_removed_on_read() {
        let mut store = Store::new();
        store.set(
            bulk("k"),
            DataType::String(bulk("v")),
            Some(Duration::from_millis(100)),
        );

        assert!(store.get(b"k").is_some());

        tokio::time::advance(Duration::from_millis(150)).await;

        assert!(store.get(b"k").is_none());
        assert_eq!(store.len(), 0, "expired entry should have been removed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_or_insert_with_replaces_expired_entry() {
        let mut store = Store::new();
        store.set(
            bulk("k"),
            DataType::String(bulk("stale")),
            Some(Duration::from_millis(10)),
        );

        tokio::time::advance(Duration::from_millis(20)).await;

        let entry = store.get_or_insert_with(bulk("k"), || DataType::List(VecDeque::new()));
        assert_eq!(entry.data, DataType::List(VecDeque::new()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_keys_drops_expired() {
        let mut store = Store::new();
        store.set(bulk("a"), DataType::Integer(1), None);
        store.set(
            bulk("b"),
            DataType::Integer(2),
            Some(Duration::from_millis(5)),
        );

        tokio::time::advance(Duration::from_millis(10)).await;

        let keys = store.live_keys();
        assert_eq!(keys, vec![bulk("a")]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(DataType::String(bulk("x")).kind_name(), "string");
        assert_eq!(DataType::Integer(1).kind_name(), "string");
        assert_eq!(DataType::List(VecDeque::new()).kind_name(), "array");
        assert_eq!(DataType::Stream(StreamIndex::new()).kind_name(), "stream");
    }
}
