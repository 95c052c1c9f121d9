//! Injected key-value store interface.
//!
//! Every collection (records, protocols, manifests) lives wholesale under a
//! single key: reads load the full collection, writes replace it. Two
//! writers racing on the same key means last writer wins; the stores are
//! single-owner by design and make no transactional promise.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};

/// Minimal string key-value interface the repositories are written
/// against, so they are testable without touching a filesystem.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Directory-backed store: one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct DirStore {
    base_dir: PathBuf,
}

impl DirStore {
    /// Open (creating if needed) a store rooted at `base_dir`.
    pub fn open(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).map_err(StoreError::Io)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for DirStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Load a JSON collection from a key, defaulting when the key is absent.
pub(crate) fn load_collection<T, S>(store: &S, key: &str) -> Result<T>
where
    T: serde::de::DeserializeOwned + Default,
    S: KeyValueStore,
{
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            key: key.to_string(),
            source,
        }),
        None => Ok(T::default()),
    }
}

/// Serialize and write back a whole collection under its key.
pub(crate) fn save_collection<T, S>(store: &mut S, key: &str, collection: &T) -> Result<()>
where
    T: serde::Serialize + ?Sized,
    S: KeyValueStore,
{
    let raw = serde_json::to_string(collection).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.put(key, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("k").expect("get"), None);
        store.put("k", "v").expect("put");
        assert_eq!(store.get("k").expect("get").as_deref(), Some("v"));
        store.remove("k").expect("remove");
        assert_eq!(store.get("k").expect("get"), None);
    }

    #[test]
    fn load_collection_defaults_on_missing_key() {
        let store = MemoryStore::new();
        let loaded: Vec<String> = load_collection(&store, "absent").expect("load");
        assert!(loaded.is_empty());
    }

    #[test]
    fn load_collection_reports_corrupt_payloads() {
        let mut store = MemoryStore::new();
        store.put("bad", "{not json").expect("put");
        let result: Result<Vec<String>> = load_collection(&store, "bad");
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn save_collection_reports_encode_failures() {
        let mut store = MemoryStore::new();
        // Non-string map keys cannot be encoded as JSON object keys.
        let unencodable = std::collections::BTreeMap::from([(vec![1u8], "x")]);
        let result = save_collection(&mut store, "records", &unencodable);
        assert!(matches!(result, Err(StoreError::Encode { .. })));
        assert_eq!(store.get("records").expect("get"), None);
    }
}
