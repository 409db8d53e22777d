//! JSON-file backed store.
//!
//! The whole namespace is one JSON object. Writes go to a sibling temp file
//! which is then renamed over the original, so readers never observe a torn
//! file. Edits made by other processes are picked up by
//! [`FileStore::reload_if_changed`], which the caller polls. Change
//! detection compares file contents, so edits landing within one mtime
//! tick are not missed.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde_json::{Map, Value};
use tokio::sync::broadcast;

use crate::{CHANGE_CHANNEL_CAPACITY, ChangeSet, KvStore, StoreError, apply_entries, diff};

/// `$XDG_CONFIG_HOME/zepwatch/storage.json` (or the platform equivalent).
pub fn default_store_path() -> Result<PathBuf, StoreError> {
    dirs::config_dir()
        .map(|dir| dir.join("zepwatch").join("storage.json"))
        .ok_or(StoreError::NoConfigDir)
}

#[derive(Debug)]
struct FileState {
    data: Map<String, Value>,
    /// File bytes as last read or written by us; `None` when absent.
    raw: Option<Vec<u8>>,
}

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    state: Mutex<FileState>,
    changes: broadcast::Sender<ChangeSet>,
}

impl FileStore {
    /// Open the store at `path`. A missing or empty file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let raw = read_raw(&path)?;
        let data = parse(&path, raw.as_deref())?;
        tracing::debug!(path = %path.display(), keys = data.len(), "store opened");
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            path,
            state: Mutex::new(FileState { data, raw }),
            changes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file if another process modified it since we last saw it.
    ///
    /// Returns the keys that changed (empty when nothing did) and notifies
    /// subscribers.
    pub fn reload_if_changed(&self) -> Result<ChangeSet, StoreError> {
        let raw = read_raw(&self.path)?;
        let changes = {
            let mut state = self.lock();
            if raw == state.raw {
                return Ok(ChangeSet::new());
            }
            let data = parse(&self.path, raw.as_deref())?;
            let changes = diff(&state.data, &data);
            state.data = data;
            state.raw = raw;
            changes
        };
        if !changes.is_empty() {
            tracing::debug!(keys = ?changes.keys().collect::<Vec<_>>(), "store changed on disk");
            let _ = self.changes.send(changes.clone());
        }
        Ok(changes)
    }

    /// Snapshot of every stored key.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.lock().data.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FileState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_file(&self, data: &Map<String, Value>) -> Result<Vec<u8>, StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let body = serde_json::to_vec_pretty(data).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &body).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(body)
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.lock().data.get(key).cloned()
    }

    fn set(&self, entries: Map<String, Value>) -> Result<ChangeSet, StoreError> {
        let changes = {
            let mut state = self.lock();
            let mut next = state.data.clone();
            let changes = apply_entries(&mut next, entries);
            if changes.is_empty() {
                return Ok(changes);
            }
            let raw = self.write_file(&next)?;
            state.data = next;
            state.raw = Some(raw);
            changes
        };
        let _ = self.changes.send(changes.clone());
        Ok(changes)
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeSet> {
        self.changes.subscribe()
    }

    fn refresh(&self) -> Result<ChangeSet, StoreError> {
        self.reload_if_changed()
    }
}

fn read_raw(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
    match fs::read(path) {
        Ok(raw) => Ok(Some(raw)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Io {
            path: path.to_owned(),
            source,
        }),
    }
}

/// Decode file bytes. Absent, empty and whitespace-only files are empty.
fn parse(path: &Path, raw: Option<&[u8]>) -> Result<Map<String, Value>, StoreError> {
    let Some(raw) = raw.filter(|raw| !raw.trim_ascii().is_empty()) else {
        return Ok(Map::new());
    };
    let value: Value = serde_json::from_slice(raw).map_err(|source| StoreError::Json {
        path: path.to_owned(),
        source,
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::NotAnObject(path.to_owned())),
    }
}
