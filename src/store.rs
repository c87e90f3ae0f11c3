//! Key-value preference storage.
//!
//! Exactly two logical keys are used: the biometric preference and the
//! last-session record. [`Preferences`] is the typed facade the rest of the
//! crate goes through.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::models::SessionRecord;

pub const BIOMETRIC_ENABLED_KEY: &str = "biometric_enabled";
pub const LAST_SESSION_KEY: &str = "last_session";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed preference file: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Preference store lock poisoned")]
    Poisoned,

    #[error("Preference store unavailable: {0}")]
    Unavailable(String),
}

/// Minimal string key-value store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Returns whether a value was present.
    fn remove(&self, key: &str) -> Result<bool, StoreError>;
}

/// Process-local store; contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.remove(key).is_some())
    }
}

/// JSON object on disk, written through on every change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    /// Opens `path`, starting empty if the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                Map::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            Map::new()
        };
        tracing::debug!(path = %path.display(), keys = entries.len(), "Opened preference file");
        Ok(JsonFileStore {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn flush(&self, entries: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(entries)?;
        // Write to a sibling then rename so a crash never leaves half a file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).and_then(Value::as_str).map(str::to_string))
    }

    // The cached map only changes once the file write has succeeded
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        let mut updated = entries.clone();
        updated.insert(key.to_string(), Value::String(value.to_string()));
        self.flush(&updated)?;
        *entries = updated;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        if !entries.contains_key(key) {
            return Ok(false);
        }
        let mut updated = entries.clone();
        updated.remove(key);
        self.flush(&updated)?;
        *entries = updated;
        Ok(true)
    }
}

/// Typed access to the two preference keys.
///
/// Reads never fail: a store error on the biometric key reads as disabled and
/// an unreadable last-session record reads as absent. Writes return the error
/// so callers can surface a warning.
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Preferences { store }
    }

    pub fn in_memory() -> Self {
        Preferences::new(Arc::new(MemoryStore::new()))
    }

    pub fn biometric_enabled(&self) -> bool {
        match self.store.get(BIOMETRIC_ENABLED_KEY) {
            Ok(Some(value)) => value.trim().eq_ignore_ascii_case("true"),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read biometric preference, treating as disabled");
                false
            }
        }
    }

    pub fn set_biometric_enabled(&self, enabled: bool) -> Result<(), StoreError> {
        self.store
            .set(BIOMETRIC_ENABLED_KEY, if enabled { "true" } else { "false" })
    }

    pub fn clear_biometric_preference(&self) -> Result<(), StoreError> {
        self.store.remove(BIOMETRIC_ENABLED_KEY).map(|_| ())
    }

    pub fn last_session(&self) -> Option<SessionRecord> {
        let raw = match self.store.get(LAST_SESSION_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read last-session record");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable last-session record");
                None
            }
        }
    }

    pub fn has_last_session(&self) -> bool {
        self.last_session().is_some()
    }

    pub fn save_last_session(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let raw = serde_json::to_string(record)?;
        self.store.set(LAST_SESSION_KEY, &raw)
    }

    pub fn clear_last_session(&self) -> Result<(), StoreError> {
        self.store.remove(LAST_SESSION_KEY).map(|_| ())
    }
}

impl std::fmt::Debug for Preferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preferences").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, Ordering};

    // Store whose reads and writes can be switched to fail
    #[derive(Default)]
    pub(crate) struct FlakyStore {
        pub inner: MemoryStore,
        pub fail_reads: AtomicBool,
        pub fail_writes: AtomicBool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("read refused".to_string()));
            }
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("write refused".to_string()));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<bool, StoreError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("write refused".to_string()));
            }
            self.inner.remove(key)
        }
    }

    fn record() -> SessionRecord {
        SessionRecord {
            user_id: "u-42".to_string(),
            display_name: "Wanjiru".to_string(),
            email: Some("wanjiru@example.com".to_string()),
            role: Role::Renter,
            signed_in_at: Utc::now(),
        }
    }

    #[test]
    fn biometric_preference_defaults_to_disabled() {
        let prefs = Preferences::in_memory();
        assert!(!prefs.biometric_enabled());
        prefs.set_biometric_enabled(true).unwrap();
        assert!(prefs.biometric_enabled());
        prefs.clear_biometric_preference().unwrap();
        assert!(!prefs.biometric_enabled());
    }

    #[test]
    fn read_failure_reads_as_disabled() {
        let store = Arc::new(FlakyStore::default());
        store.inner.set(BIOMETRIC_ENABLED_KEY, "true").unwrap();
        let prefs = Preferences::new(store.clone());
        assert!(prefs.biometric_enabled());

        store.fail_reads.store(true, Ordering::SeqCst);
        assert!(!prefs.biometric_enabled());
    }

    #[test]
    fn last_session_round_trips_and_clears() {
        let prefs = Preferences::in_memory();
        assert!(prefs.last_session().is_none());
        let record = record();
        prefs.save_last_session(&record).unwrap();
        assert_eq!(prefs.last_session(), Some(record));
        prefs.clear_last_session().unwrap();
        assert!(!prefs.has_last_session());
    }

    #[test]
    fn garbage_last_session_reads_as_absent() {
        let store = Arc::new(MemoryStore::new());
        store.set(LAST_SESSION_KEY, "{not json").unwrap();
        let prefs = Preferences::new(store);
        assert!(prefs.last_session().is_none());
    }

    #[test]
    fn json_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs").join("preferences.json");

        let store = JsonFileStore::open(&path).unwrap();
        store.set(BIOMETRIC_ENABLED_KEY, "true").unwrap();
        store.set(LAST_SESSION_KEY, "{}").unwrap();
        assert!(store.remove(LAST_SESSION_KEY).unwrap());
        assert!(!store.remove(LAST_SESSION_KEY).unwrap());
        drop(store);

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get(BIOMETRIC_ENABLED_KEY).unwrap().as_deref(), Some("true"));
        assert_eq!(reopened.get(LAST_SESSION_KEY).unwrap(), None);
    }

    #[test]
    fn json_file_store_keeps_old_values_when_a_write_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        let store = JsonFileStore::open(blocker.join("preferences.json")).unwrap();
        store.set(BIOMETRIC_ENABLED_KEY, "true").unwrap();

        // Parent directory replaced by a plain file: every flush fails
        fs::remove_dir_all(&blocker).unwrap();
        fs::write(&blocker, "not a directory").unwrap();

        assert!(matches!(store.set(BIOMETRIC_ENABLED_KEY, "false"), Err(StoreError::Io(_))));
        assert!(store.set(LAST_SESSION_KEY, "{}").is_err());
        assert!(store.remove(BIOMETRIC_ENABLED_KEY).is_err());
        assert_eq!(store.get(BIOMETRIC_ENABLED_KEY).unwrap().as_deref(), Some("true"));
        assert_eq!(store.get(LAST_SESSION_KEY).unwrap(), None);
        assert!(!store.remove(LAST_SESSION_KEY).unwrap());
    }

    #[test]
    fn json_file_store_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(JsonFileStore::open(&path), Err(StoreError::Malformed(_))));
    }
}
