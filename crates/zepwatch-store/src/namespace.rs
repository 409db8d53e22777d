//! Typed accessors for the keys zepwatch keeps in the store.

use serde_json::{Map, Value};
use zepwatch_core::Settings;

use crate::{ChangeSet, KvStore, StoreError};

/// Learned display name of the local user.
pub const MY_NAME_KEY: &str = "myNameAuto";
pub const ONLY_WHEN_PRIVATE_ON_KEY: &str = "onlyWhenPrivateOn";
pub const COOLDOWN_MS_KEY: &str = "cooldownMs";
pub const DEBUG_KEY: &str = "debug";

const SETTINGS_KEYS: [&str; 3] = [ONLY_WHEN_PRIVATE_ON_KEY, COOLDOWN_MS_KEY, DEBUG_KEY];

// ─── Identity ────────────────────────────────────────────────────

/// The persisted name, if any. Non-string and empty values read as absent.
pub fn read_identity(store: &impl KvStore) -> Option<String> {
    match store.get(MY_NAME_KEY) {
        Some(Value::String(name)) if !name.is_empty() => Some(name),
        _ => None,
    }
}

pub fn write_identity(store: &impl KvStore, name: &str) -> Result<ChangeSet, StoreError> {
    let mut entries = Map::new();
    entries.insert(MY_NAME_KEY.to_owned(), Value::String(name.to_owned()));
    store.set(entries)
}

pub fn clear_identity(store: &impl KvStore) -> Result<ChangeSet, StoreError> {
    let mut entries = Map::new();
    entries.insert(MY_NAME_KEY.to_owned(), Value::Null);
    store.set(entries)
}

// ─── Settings ────────────────────────────────────────────────────

/// Settings with per-key defaults for absent keys.
///
/// A stored `null` cooldown disables rate limiting. Values of the wrong
/// type fall back to the default and are logged.
pub fn read_settings(store: &impl KvStore) -> Settings {
    let defaults = Settings::default();
    let cooldown_ms = match store.get(COOLDOWN_MS_KEY) {
        None => defaults.cooldown_ms,
        Some(Value::Null) => 0,
        Some(Value::Number(n)) => match n.as_u64() {
            Some(ms) => ms,
            // Negative means "no limit"; fractional values round down.
            None => n.as_f64().map_or(0, |f| if f > 0.0 { f as u64 } else { 0 }),
        },
        Some(other) => {
            tracing::warn!(key = COOLDOWN_MS_KEY, value = %other, "ignoring non-numeric setting");
            defaults.cooldown_ms
        }
    };
    Settings {
        only_when_private_on: read_bool(
            store,
            ONLY_WHEN_PRIVATE_ON_KEY,
            defaults.only_when_private_on,
        ),
        cooldown_ms,
        debug: read_bool(store, DEBUG_KEY, defaults.debug),
    }
}

fn read_bool(store: &impl KvStore, key: &str, default: bool) -> bool {
    match store.get(key) {
        None => default,
        Some(Value::Bool(b)) => b,
        Some(other) => {
            tracing::warn!(key, value = %other, "ignoring non-boolean setting");
            default
        }
    }
}

/// A partial settings update. `None` fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub only_when_private_on: Option<bool>,
    pub cooldown_ms: Option<u64>,
    pub debug: Option<bool>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.only_when_private_on.is_none() && self.cooldown_ms.is_none() && self.debug.is_none()
    }

    fn into_entries(self) -> Map<String, Value> {
        let mut entries = Map::new();
        if let Some(b) = self.only_when_private_on {
            entries.insert(ONLY_WHEN_PRIVATE_ON_KEY.to_owned(), Value::Bool(b));
        }
        if let Some(ms) = self.cooldown_ms {
            entries.insert(COOLDOWN_MS_KEY.to_owned(), Value::from(ms));
        }
        if let Some(b) = self.debug {
            entries.insert(DEBUG_KEY.to_owned(), Value::Bool(b));
        }
        entries
    }
}

pub fn write_settings(store: &impl KvStore, patch: SettingsPatch) -> Result<ChangeSet, StoreError> {
    if patch.is_empty() {
        return Ok(ChangeSet::new());
    }
    store.set(patch.into_entries())
}

// ─── Change classification ───────────────────────────────────────

pub fn touches_settings(changes: &ChangeSet) -> bool {
    SETTINGS_KEYS.iter().any(|key| changes.contains_key(*key))
}

pub fn touches_identity(changes: &ChangeSet) -> bool {
    changes.contains_key(MY_NAME_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use serde_json::json;

    fn store_with(value: Value) -> MemoryStore {
        match value {
            Value::Object(map) => MemoryStore::with_data(map),
            _ => MemoryStore::new(),
        }
    }

    #[test]
    fn empty_store_reads_defaults() {
        let store = MemoryStore::new();
        assert_eq!(read_settings(&store), Settings::default());
        assert_eq!(read_identity(&store), None);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let store = store_with(json!({
            "onlyWhenPrivateOn": false,
            "cooldownMs": 250,
            "debug": true,
        }));
        let s = read_settings(&store);
        assert!(!s.only_when_private_on);
        assert_eq!(s.cooldown_ms, 250);
        assert!(s.debug);
    }

    #[test]
    fn null_or_negative_cooldown_disables_limit() {
        assert_eq!(read_settings(&store_with(json!({"cooldownMs": null}))).cooldown_ms, 0);
        assert_eq!(read_settings(&store_with(json!({"cooldownMs": -5}))).cooldown_ms, 0);
        assert_eq!(read_settings(&store_with(json!({"cooldownMs": 1200.7}))).cooldown_ms, 1200);
    }

    #[test]
    fn wrong_types_fall_back_to_defaults() {
        let store = store_with(json!({
            "onlyWhenPrivateOn": "yes",
            "cooldownMs": "fast",
            "debug": 1,
        }));
        assert_eq!(read_settings(&store), Settings::default());
    }

    #[test]
    fn identity_write_read_clear() {
        let store = MemoryStore::new();
        let changes = write_identity(&store, "Alice").expect("write");
        assert!(touches_identity(&changes));
        assert!(!touches_settings(&changes));
        assert_eq!(read_identity(&store), Some("Alice".to_owned()));

        clear_identity(&store).expect("clear");
        assert_eq!(read_identity(&store), None);
    }

    #[test]
    fn non_string_identity_reads_absent() {
        assert_eq!(read_identity(&store_with(json!({"myNameAuto": 42}))), None);
        assert_eq!(read_identity(&store_with(json!({"myNameAuto": ""}))), None);
    }

    #[test]
    fn patch_writes_only_given_fields() {
        let store = store_with(json!({"debug": true}));
        let changes = write_settings(
            &store,
            SettingsPatch {
                cooldown_ms: Some(0),
                ..SettingsPatch::default()
            },
        )
        .expect("write");
        assert!(touches_settings(&changes));
        assert_eq!(changes.len(), 1);
        let s = read_settings(&store);
        assert_eq!(s.cooldown_ms, 0);
        assert!(s.debug);
    }

    #[test]
    fn empty_patch_is_noop() {
        let store = MemoryStore::new();
        let changes = write_settings(&store, SettingsPatch::default()).expect("write");
        assert!(changes.is_empty());
    }
}
