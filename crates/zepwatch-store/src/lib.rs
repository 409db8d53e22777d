//! zepwatch-store: durable key-value namespace for the learned identity and
//! user settings.
//!
//! A flat JSON object per store, read with per-key defaults, written
//! atomically, with change notifications for writes made in-process and for
//! edits made by other processes (detected by polling the file).

pub mod error;
pub mod file;
pub mod memory;
pub mod namespace;

pub use error::StoreError;
pub use file::{FileStore, default_store_path};
pub use memory::MemoryStore;
pub use namespace::SettingsPatch;

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tokio::sync::broadcast;

/// Capacity of the change-notification channel. Slow subscribers see
/// `RecvError::Lagged` and should re-read everything.
pub const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Old and new value of one key. `None` means absent.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChange {
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

/// Keys changed by one write or reload.
pub type ChangeSet = BTreeMap<String, ValueChange>;

/// get / set / observe-changes over a single namespace.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;

    /// Write every entry of `entries`; a `Value::Null` entry removes the key.
    fn set(&self, entries: Map<String, Value>) -> Result<ChangeSet, StoreError>;

    fn subscribe(&self) -> broadcast::Receiver<ChangeSet>;

    /// Pick up edits made outside this process, notifying subscribers.
    /// Stores with no outside writers have nothing to do.
    fn refresh(&self) -> Result<ChangeSet, StoreError> {
        Ok(ChangeSet::new())
    }

    /// Every key, with `defaults` filled in for absent ones.
    fn get_with_defaults(&self, defaults: &Map<String, Value>) -> Map<String, Value> {
        defaults
            .iter()
            .map(|(key, default)| {
                let value = self.get(key).unwrap_or_else(|| default.clone());
                (key.clone(), value)
            })
            .collect()
    }
}

impl<T: KvStore + ?Sized> KvStore for &T {
    fn get(&self, key: &str) -> Option<Value> {
        (**self).get(key)
    }

    fn set(&self, entries: Map<String, Value>) -> Result<ChangeSet, StoreError> {
        (**self).set(entries)
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeSet> {
        (**self).subscribe()
    }

    fn refresh(&self) -> Result<ChangeSet, StoreError> {
        (**self).refresh()
    }
}

impl<T: KvStore + ?Sized> KvStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Option<Value> {
        (**self).get(key)
    }

    fn set(&self, entries: Map<String, Value>) -> Result<ChangeSet, StoreError> {
        (**self).set(entries)
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeSet> {
        (**self).subscribe()
    }

    fn refresh(&self) -> Result<ChangeSet, StoreError> {
        (**self).refresh()
    }
}

/// Apply `entries` to `data`, returning what actually changed.
pub(crate) fn apply_entries(
    data: &mut Map<String, Value>,
    entries: Map<String, Value>,
) -> ChangeSet {
    let mut changes = ChangeSet::new();
    for (key, value) in entries {
        let old_value = data.get(&key).cloned();
        let new_value = (!value.is_null()).then_some(value);
        if old_value == new_value {
            continue;
        }
        match &new_value {
            Some(v) => {
                data.insert(key.clone(), v.clone());
            }
            None => {
                data.remove(&key);
            }
        }
        changes.insert(
            key,
            ValueChange {
                old_value,
                new_value,
            },
        );
    }
    changes
}

/// Per-key difference between two snapshots.
pub(crate) fn diff(old: &Map<String, Value>, new: &Map<String, Value>) -> ChangeSet {
    let mut changes = ChangeSet::new();
    for (key, old_value) in old {
        let new_value = new.get(key);
        if new_value != Some(old_value) {
            changes.insert(
                key.clone(),
                ValueChange {
                    old_value: Some(old_value.clone()),
                    new_value: new_value.cloned(),
                },
            );
        }
    }
    for (key, new_value) in new {
        if !old.contains_key(key) {
            changes.insert(
                key.clone(),
                ValueChange {
                    old_value: None,
                    new_value: Some(new_value.clone()),
                },
            );
        }
    }
    changes
}
