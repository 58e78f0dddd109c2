//! Durable product collections: the cart and the wishlist.
//!
//! Both are lists of product snapshots keyed by [`ProductId`], kept in
//! insertion order and written through to the durable store on every
//! change. They share the [`LineItemCollection`] contract but are separate
//! types, since only the cart has quantities.
//!
//! # Write-through
//!
//! A mutation computes the next list, persists it, and only then replaces
//! the in-memory list. If the write fails the in-memory list is untouched
//! and the error is returned, so memory and disk never disagree after an
//! operation returns.

mod cart;
mod wishlist;

pub use cart::{Cart, CartEntry};
pub use wishlist::Wishlist;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use marketplace_core::{Price, ProductId};

use crate::storage::{self, KeyValueStore, StorageError};

/// Operations shared by the cart and the wishlist.
pub trait LineItemCollection {
    /// Entry type held by the collection.
    type Entry;

    /// Entries in insertion order.
    fn entries(&self) -> &[Self::Entry];

    /// Whether a product is in the collection.
    fn contains(&self, id: &ProductId) -> bool;

    /// Remove a product. Returns whether it was present; absent is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the new state cannot be persisted.
    fn remove(&mut self, id: &ProductId) -> Result<bool, StorageError>;

    /// Empty the collection and erase its durable record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be erased.
    fn clear(&mut self) -> Result<(), StorageError>;

    /// Number of distinct products.
    fn distinct_count(&self) -> usize {
        self.entries().len()
    }

    /// Number of line items (sum of quantities for the cart).
    fn item_count(&self) -> u64;

    /// Monetary total.
    fn total(&self) -> Price;

    /// Whether the collection is empty.
    fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// Entries that carry a product key.
trait Keyed {
    fn key(&self) -> &ProductId;
}

/// An ordered list mirrored to one durable record.
struct DurableList<E> {
    store: Arc<dyn KeyValueStore>,
    record: &'static str,
    entries: Vec<E>,
}

impl<E> DurableList<E>
where
    E: Keyed + Clone + Serialize + DeserializeOwned,
{
    /// Load the record, treating a missing or malformed one as empty.
    ///
    /// Duplicate keys in a damaged record keep their first occurrence.
    fn hydrate(store: Arc<dyn KeyValueStore>, record: &'static str) -> Self {
        let mut entries: Vec<E> = storage::load_json(store.as_ref(), record).unwrap_or_default();

        let loaded = entries.len();
        let mut seen = std::collections::HashSet::new();
        entries.retain(|entry| seen.insert(entry.key().clone()));
        if entries.len() != loaded {
            warn!(record, dropped = loaded - entries.len(), "Dropped duplicate entries");
        }

        debug!(record, entries = entries.len(), "Hydrated collection");
        Self {
            store,
            record,
            entries,
        }
    }

    fn entries(&self) -> &[E] {
        &self.entries
    }

    fn position(&self, id: &ProductId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.key() == id)
    }

    fn get(&self, id: &ProductId) -> Option<&E> {
        self.entries.iter().find(|entry| entry.key() == id)
    }

    /// Persist `next`, then make it current.
    fn commit(&mut self, next: Vec<E>) -> Result<(), StorageError> {
        storage::save_json(self.store.as_ref(), self.record, &next)?;
        self.entries = next;
        Ok(())
    }

    /// Apply `change` to a copy of the list and commit the copy.
    fn update(&mut self, change: impl FnOnce(&mut Vec<E>)) -> Result<(), StorageError> {
        let mut next = self.entries.clone();
        change(&mut next);
        self.commit(next)
    }

    fn remove(&mut self, id: &ProductId) -> Result<bool, StorageError> {
        let Some(index) = self.position(id) else {
            return Ok(false);
        };
        self.update(|entries| {
            entries.remove(index);
        })?;
        Ok(true)
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.store.remove(self.record)?;
        self.entries.clear();
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::storage::{KeyValueStore, StorageError};

    /// Store whose reads succeed (always empty) and whose writes always fail.
    pub struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("disk full")))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("disk full")))
        }
    }
}
