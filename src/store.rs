//! Durable Store - string-keyed persistence that survives restarts
//!
//! This module provides:
//! - The `DurableStore` contract used by the archive and the active session
//! - `FileStore`, one JSON file per key under the local data directory
//! - `MemoryStore`, a process-local map for tests and platforms without a disk

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Key holding the active conversation.
pub const LAST_CHAT_KEY: &str = "lastChat";
/// Key holding the archive of saved conversations.
pub const SAVED_CHATS_KEY: &str = "savedChats";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O failed for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialize value for {key}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Key-value persistence.
///
/// `get` reports a missing or unreadable key as `None`; `set` reports failures
/// so callers can decide whether to log or swallow them.
pub trait DurableStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Move an unreadable value under `key` out of the way so the next `set`
    /// does not destroy it. Stores without a place to keep it do nothing.
    fn set_aside(&self, _key: &str) -> StoreResult<()> {
        Ok(())
    }
}

/// Suffix given to a value moved aside by `DurableStore::set_aside`.
pub const CORRUPT_SUFFIX: &str = "corrupt";

pub type SharedStore = Arc<dyn DurableStore>;

/// Serialize `value` as JSON and write it under `key`.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn DurableStore,
    key: &str,
    value: &T,
) -> StoreResult<()> {
    let raw = serde_json::to_string(value).map_err(|source| StoreError::Serialization {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw)
}

/// Read and decode the JSON value under `key`.
///
/// Absent keys and undecodable values both come back as `None`. An undecodable
/// value is logged and set aside so a corrupt snapshot never blocks startup and
/// is still there to recover by hand.
pub fn load_json<T: DeserializeOwned>(store: &dyn DurableStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(key, error = %err, "unreadable stored value, setting it aside");
            if let Err(err) = store.set_aside(key) {
                tracing::warn!(key, error = %err, "failed to set aside unreadable value");
            }
            None
        }
    }
}

// ============================================
// File-backed store (native platforms)
// ============================================

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }
}

pub fn default_data_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        return data_dir.join("kestrel");
    }

    PathBuf::from("cache").join("kestrel")
}

impl DurableStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let io_err = |source| StoreError::Io {
            key: key.to_string(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let path = self.path_for(key);
        // Write next to the target and rename so a crash never leaves half a file.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)?;
        tracing::debug!(key, bytes = value.len(), "stored value");
        Ok(())
    }

    fn set_aside(&self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key);
        let aside = path.with_extension(format!("json.{CORRUPT_SUFFIX}"));
        fs::rename(&path, &aside).map_err(|source| StoreError::Io {
            key: key.to_string(),
            source,
        })?;
        tracing::info!(key, path = %aside.display(), "moved unreadable value aside");
        Ok(())
    }
}

// ============================================
// In-memory store
// ============================================

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().ok()?;
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn set_aside(&self, key: &str) -> StoreResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        if let Some(value) = entries.remove(key) {
            entries.insert(format!("{key}.{CORRUPT_SUFFIX}"), value);
        }
        Ok(())
    }
}

/// Sanitize storage key for filesystem use
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("lastChat"), "lastChat");
        assert_eq!(sanitize_key("user:preferences"), "user_preferences");
        assert_eq!(sanitize_key("../escape"), "___escape");
    }

    #[test]
    fn test_memory_store_get_and_set() {
        let store = MemoryStore::new();
        assert_eq!(store.get("missing"), None);

        store.set("key", "value").unwrap();
        assert_eq!(store.get("key"), Some("value".to_string()));

        store.set("key", "other").unwrap();
        assert_eq!(store.get("key"), Some("other".to_string()));
    }

    #[test]
    fn test_load_json_sets_corrupt_values_aside() {
        let store = MemoryStore::new();
        store.set(LAST_CHAT_KEY, "{not json").unwrap();

        let loaded: Option<Vec<String>> = load_json(&store, LAST_CHAT_KEY);
        assert!(loaded.is_none());
        assert_eq!(store.get(LAST_CHAT_KEY), None);
        assert_eq!(store.get("lastChat.corrupt"), Some("{not json".to_string()));
    }

    #[test]
    fn test_save_json_round_trip() {
        let store = MemoryStore::new();
        save_json(&store, "numbers", &vec![1, 2, 3]).unwrap();

        let loaded: Option<Vec<u32>> = load_json(&store, "numbers");
        assert_eq!(loaded, Some(vec![1, 2, 3]));
    }
}
