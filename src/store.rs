// Persistent key-value storage shared by the inventory cache and the order ledger.
// Values are JSON blobs serialized by the caller; every component writes to its
// own fixed keys, so no two components ever contend for the same entry.

use std::io::ErrorKind;
use std::path::PathBuf;

use dashmap::DashMap;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("storage unavailable for key '{key}'")]
pub struct StoreError {
    pub key: String,
    #[source]
    pub source: std::io::Error,
}

// Contract for durable string-keyed storage. No expiry, no quota handling;
// callers treat a failed read like a missing value and absorb failed writes
// rather than let a booking flow die on lost durability.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

// One `<key>.json` file per key under a root directory.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError {
                key: key.to_owned(),
                source: e,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.root)
            .and_then(|_| std::fs::write(self.path_for(key), value))
            .map_err(|e| StoreError {
                key: key.to_owned(),
                source: e,
            })
    }
}

// In-memory store used by tests and benches. Never fails.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}
