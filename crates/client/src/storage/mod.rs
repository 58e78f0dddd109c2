//! Durable client store.
//!
//! A string-keyed persistence layer with the same contract as browser
//! `localStorage`: synchronous reads and writes of serialized values that
//! survive process restarts.
//!
//! # Keys
//!
//! | Key          | Value                                   |
//! |--------------|-----------------------------------------|
//! | `token`      | Bearer credential (raw string)          |
//! | `user`       | Serialized [`User`](crate::models::User) |
//! | `cart`       | Serialized cart entries                 |
//! | `wishlist`   | Serialized wishlist entries             |
//! | `session_id` | Stable per-installation identifier      |
//!
//! Readers never fail on bad data: a missing, unreadable or unparseable value
//! falls back to "absent" and is logged.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

/// Storage keys used by the client.
pub mod keys {
    /// Bearer token of the current session.
    pub const TOKEN: &str = "token";

    /// Snapshot of the signed-in user.
    pub const USER: &str = "user";

    /// Cart line items.
    pub const CART: &str = "cart";

    /// Wishlist entries.
    pub const WISHLIST: &str = "wishlist";

    /// Per-installation identifier sent with every API request.
    pub const SESSION_ID: &str = "session_id";
}

/// Errors raised by a [`KeyValueStore`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be serialized.
    #[error("failed to serialize value for '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The key contains characters the backend cannot store.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// String-keyed durable storage.
///
/// Implementations must make a successful `set`/`remove` visible to every
/// later `get`, including after a restart for durable backends.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value for `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write the raw value for `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read and deserialize a JSON value.
///
/// Missing keys, read failures and malformed JSON all yield `None`; the
/// latter two are logged because they mean the record was damaged.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "Failed to read durable record, treating as empty");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "Discarding malformed durable record");
            None
        }
    }
}

/// Serialize a value as JSON and write it.
///
/// # Errors
///
/// Returns `StorageError` if serialization or the write fails.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw)
}

/// Read a raw string value, treating read failures and blank values as absent.
pub fn load_string(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value.filter(|v| !v.trim().is_empty()),
        Err(e) => {
            warn!(key, error = %e, "Failed to read durable record, treating as empty");
            None
        }
    }
}

/// Stable per-installation identifier.
///
/// Generated on first use and persisted under [`keys::SESSION_ID`]. If the
/// identifier cannot be persisted a fresh one is still returned, so callers
/// always get a value; it just will not survive a restart.
pub fn installation_id(store: &dyn KeyValueStore) -> String {
    if let Some(existing) = load_string(store, keys::SESSION_ID) {
        return existing;
    }

    let id = Uuid::new_v4().to_string();
    if let Err(e) = store.set(keys::SESSION_ID, &id) {
        warn!(error = %e, "Failed to persist installation id");
    }
    id
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_load_json_missing_is_none() {
        let store = MemoryStore::new();
        assert_eq!(load_json::<Vec<u32>>(&store, keys::CART), None);
    }

    #[test]
    fn test_load_json_malformed_is_none() {
        let store = MemoryStore::new();
        store.set(keys::CART, "{not json").unwrap();
        assert_eq!(load_json::<Vec<u32>>(&store, keys::CART), None);

        store.set(keys::CART, "{\"a\":1}").unwrap();
        assert_eq!(load_json::<Vec<u32>>(&store, keys::CART), None);
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryStore::new();
        save_json(&store, keys::WISHLIST, &vec![1_u32, 2, 3]).unwrap();
        assert_eq!(load_json::<Vec<u32>>(&store, keys::WISHLIST), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_load_string_ignores_blank() {
        let store = MemoryStore::new();
        store.set(keys::TOKEN, "   ").unwrap();
        assert_eq!(load_string(&store, keys::TOKEN), None);
    }

    #[test]
    fn test_installation_id_is_stable() {
        let store = MemoryStore::new();
        let first = installation_id(&store);
        let second = installation_id(&store);
        assert_eq!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
    }
}
