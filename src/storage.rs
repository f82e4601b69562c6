use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::Error;

/// Durable string key-value backing for persisted auth state.
///
/// Mirrors the browser storage surface: string keys, string values,
/// synchronous calls. Callers treat every error as "storage unavailable".
pub trait KeyValueStore: Send + Sync + 'static {
    /// Read a value. `Ok(None)` if the key was never written.
    fn get_item(&self, key: &str) -> Result<Option<String>, Error>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), Error>;

    /// Remove a value. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), Error>;
}

/// Process-local store; contents are lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), Error> {
        self.items.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), Error> {
        self.items.lock().remove(key);
        Ok(())
    }
}

/// One file per key inside a directory.
///
/// Keys are restricted to `[A-Za-z0-9._-]` so they map to plain file names.
/// Writes go to a temporary sibling first and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir` as the backing directory, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, Error> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| Error::Storage(format!("create {}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, Error> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && key
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'));
        if !valid {
            return Err(Error::Storage(format!("invalid key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, Error> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(format!("read {}: {e}", path.display()))),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), Error> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)
            .map_err(|e| Error::Storage(format!("write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &path)
            .map_err(|e| Error::Storage(format!("rename {}: {e}", path.display())))
    }

    fn remove_item(&self, key: &str) -> Result<(), Error> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(format!("remove {}: {e}", path.display()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get_item("auth-storage").unwrap(), None);

        store.set_item("auth-storage", "{}").unwrap();
        assert_eq!(store.get_item("auth-storage").unwrap().as_deref(), Some("{}"));

        store.remove_item("auth-storage").unwrap();
        store.remove_item("auth-storage").unwrap();
        assert_eq!(store.get_item("auth-storage").unwrap(), None);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.set_item("auth-storage", r#"{"a":1}"#).unwrap();

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(
            reopened.get_item("auth-storage").unwrap().as_deref(),
            Some(r#"{"a":1}"#)
        );
    }

    #[test]
    fn file_store_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.get_item("nothing-here").unwrap(), None);
        store.remove_item("nothing-here").unwrap();
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        for key in ["", "..", "../escape", "a/b", "a\\b"] {
            assert!(store.set_item(key, "x").is_err(), "{key:?} should be rejected");
        }
    }

    #[test]
    fn file_store_creates_nested_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("state").join("auth");
        let store = FileStore::open(&nested).unwrap();
        store.set_item("k", "v").unwrap();
        assert!(nested.join("k.json").exists());
    }
}
