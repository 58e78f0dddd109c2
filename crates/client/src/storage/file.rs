//! File-backed durable store.
//!
//! One file per key under a data directory. Writes go to a temporary file
//! that is fsynced and then renamed over the target, so a crash mid-write
//! leaves either the old value or the new one, never a torn record.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{KeyValueStore, StorageError};

const RECORD_EXTENSION: &str = "json";

/// Durable store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "Opened file store");
        Ok(Self { root })
    }

    /// Directory holding the records.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.{RECORD_EXTENSION}")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp_path = path.with_extension(format!("{RECORD_EXTENSION}.tmp"));

        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_get_remove() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        assert_eq!(store.get("token").unwrap(), None);
        store.set("token", "abc").unwrap();
        assert_eq!(store.get("token").unwrap().as_deref(), Some("abc"));

        store.set("token", "def").unwrap();
        assert_eq!(store.get("token").unwrap().as_deref(), Some("def"));

        store.remove("token").unwrap();
        assert_eq!(store.get("token").unwrap(), None);
        store.remove("token").unwrap();
    }

    #[test]
    fn test_survives_reopen() {
        let dir = TempDir::new().unwrap();
        FileStore::open(dir.path()).unwrap().set("cart", "[]").unwrap();

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get("cart").unwrap().as_deref(), Some("[]"));
        assert!(!dir.path().join("cart.json.tmp").exists());
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        for key in ["", "../escape", "a/b", "dot.ted"] {
            assert!(matches!(store.set(key, "x"), Err(StorageError::InvalidKey(_))));
        }
    }
}
