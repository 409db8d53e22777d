//! In-memory store, for tests and `--ephemeral` runs.

use std::sync::{Mutex, PoisonError};

use serde_json::{Map, Value};
use tokio::sync::broadcast;

use crate::{CHANGE_CHANNEL_CAPACITY, ChangeSet, KvStore, StoreError, apply_entries};

#[derive(Debug)]
pub struct MemoryStore {
    data: Mutex<Map<String, Value>>,
    changes: broadcast::Sender<ChangeSet>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_data(Map::new())
    }

    pub fn with_data(data: Map<String, Value>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            data: Mutex::new(data),
            changes,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, entries: Map<String, Value>) -> Result<ChangeSet, StoreError> {
        let changes = {
            let mut data = self.data.lock().unwrap_or_else(PoisonError::into_inner);
            apply_entries(&mut data, entries)
        };
        if !changes.is_empty() {
            // No subscribers is fine.
            let _ = self.changes.send(changes.clone());
        }
        Ok(changes)
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeSet> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(key: &str, value: Value) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(key.to_owned(), value);
        map
    }

    #[test]
    fn set_then_get() {
        let store = MemoryStore::new();
        store.set(entry("k", json!("v"))).expect("set");
        assert_eq!(store.get("k"), Some(json!("v")));
        assert_eq!(store.get("missing"), None);
    }

    #[test]
    fn subscribers_see_changes_only() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe();
        store.set(entry("k", json!(1))).expect("set");
        store.set(entry("k", json!(1))).expect("set unchanged");
        store.set(entry("k", json!(2))).expect("set");

        let first = rx.try_recv().expect("first change");
        assert_eq!(first["k"].new_value, Some(json!(1)));
        let second = rx.try_recv().expect("second change");
        assert_eq!(second["k"].old_value, Some(json!(1)));
        assert_eq!(second["k"].new_value, Some(json!(2)));
        assert!(rx.try_recv().is_err());
    }
}
